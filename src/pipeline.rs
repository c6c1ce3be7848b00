// vidfco - Parallel FIASCO video archiver.
// Copyright 2025 0verv0ltage
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Encode and decode stage sequences.
//!
//! Encode: tile -> count frames -> partition + compress -> cleanup.
//! Decode: decompress per segment -> untile -> cleanup.
//!
//! Cleanup runs on every exit path. Workers that fail do not stop the
//! run, they are reported once all stages are done.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    dispatch::DispatchReport,
    ffmpeg, fiasco,
    filesys::{FrameCleanup, count_frames, ensure_frame_dir, remove_frames},
    layout::Layout,
    tool::Tool,
};

#[derive(Error, Debug, PartialEq, Eq)]
/// Failures that only show once a whole stage is done.
pub enum PipelineError {
    /// Some parallel workers exited with a failure.
    #[error("{stage} failed for workers {indices:?}: {details}")]
    WorkersFailed {
        /// Stage the workers belonged to.
        stage: &'static str,
        /// 1-based indices of the failed workers.
        indices: Vec<usize>,
        /// What went wrong for each failed worker.
        details: String,
    },
}

#[derive(Debug, Clone)]
/// Settings shared by encoding and decoding.
pub struct PipelineConfig {
    /// Number of parallel fiasco workers.
    pub threads: usize,
    /// Grid frames are tiled into.
    pub layout: Layout,
    /// Playback framerate of decoded videos.
    pub fps: u32,
    /// ffmpeg executable.
    pub ffmpeg: Tool,
    /// fiasco encoder executable.
    pub cfiasco: Tool,
    /// fiasco decoder executable.
    pub dfiasco: Tool,
    /// Directory for intermediate frames.
    pub frame_dir: PathBuf,
    /// Leave intermediate frames in place after the run.
    pub keep_frames: bool,
}

/// Turn a report with failed workers into an error.
fn workers_succeeded(stage: &'static str, report: &DispatchReport) -> Result<(), PipelineError> {
    if report.is_success() {
        return Ok(());
    }
    Err(PipelineError::WorkersFailed {
        stage,
        indices: report.failed_indices(),
        details: report.failure_summary(),
    })
}

/// Prepare the frame directory and arm its cleanup.
/// Frames left over from earlier runs are removed first.
fn prepare_frame_dir(config: &PipelineConfig) -> Result<FrameCleanup> {
    ensure_frame_dir(&config.frame_dir)?;
    let stale = remove_frames(&config.frame_dir);
    if stale > 0 {
        warn!("Removed {stale} stale frames from {:?}.", config.frame_dir);
    }
    Ok(FrameCleanup::new(&config.frame_dir, config.keep_frames))
}

/// Encode a video into archive segments derived from `archive`.
/// Returns the number of tiled images that were compressed.
///
/// # Arguments
/// * `config` - Shared settings.
/// * `input` - Video to encode.
/// * `archive` - Archive path, one segment per worker is written next to it.
pub fn encode(config: &PipelineConfig, input: &Path, archive: &Path) -> Result<usize> {
    if !input.exists() {
        bail!("Provided input file at {input:?} could not be found.");
    }
    let _cleanup = prepare_frame_dir(config)?;

    let frames;
    timed_block!("frame tiling", {
        frames = ffmpeg::tile(&config.ffmpeg, input, &config.frame_dir, config.layout)?;
    });
    if frames == 0 {
        warn!("ffmpeg produced no frames from {input:?}.");
    }

    let report;
    timed_block!("compression", {
        report = fiasco::compress(
            &config.cfiasco,
            &config.frame_dir,
            archive,
            frames,
            config.threads,
        )?;
    });
    workers_succeeded("compression", &report)?;
    Ok(frames)
}

/// Decode the archive segments derived from `archive` into a video.
/// Returns the number of tiled images that were decompressed.
///
/// # Arguments
/// * `config` - Shared settings.
/// * `archive` - Archive path the segments were derived from.
/// * `output` - Video file to write.
pub fn decode(config: &PipelineConfig, archive: &Path, output: &Path) -> Result<usize> {
    let _cleanup = prepare_frame_dir(config)?;

    let report;
    timed_block!("decompression", {
        report = fiasco::decompress(&config.dfiasco, archive, &config.frame_dir, config.threads)?;
    });
    if report.succeeded.is_empty() {
        workers_succeeded("decompression", &report)?;
        bail!("No segments of {archive:?} were decompressed.");
    }

    let frames = count_frames(&config.frame_dir)?;
    info!("Decompressed {frames} images.");

    timed_block!("frame combination", {
        ffmpeg::untile(
            &config.ffmpeg,
            &config.frame_dir,
            output,
            config.layout,
            config.fps,
        )?;
    });
    workers_succeeded("decompression", &report)?;
    Ok(frames)
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::{template::segment_path, tool::ToolError};

    /// Tiles into `FRAMES` empty images, or counts decoded images when untiling.
    const FAKE_FFMPEG: &str = r#"
mode=tile
for arg in "$@"; do
  case "$arg" in
    untile=*) mode=untile ;;
  esac
  last="$arg"
done
if [ "$mode" = tile ]; then
  i=1
  while [ "$i" -le FRAMES ]; do
    : > "$(printf "$last" "$i")"
    i=$((i + 1))
  done
else
  while [ $# -gt 0 ]; do
    if [ "$1" = "-i" ]; then pattern="$2"; fi
    shift
  done
  ls "$(dirname "$pattern")" | grep -c '^frame\.[0-9]*\.[0-9]*\.ppm$' > "$last"
fi
"#;

    /// Stores the requested input range in the segment.
    const FAKE_CFIASCO: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    -i) input="$2"; shift ;;
    -o) output="$2"; shift ;;
  esac
  shift
done
FAIL
printf '%s\n' "$input" > "$output"
"#;

    /// Writes one image per frame of the range stored in the segment.
    const FAKE_DFIASCO: &str = r#"
template="$2"
range=$(sed 's/.*\[\([0-9]*\)-\([0-9]*\)+1\].*/\1 \2/' "$3")
set -- $range
count=$(expr "$2" - "$1" + 1)
base="${template%.ppm}"
i=0
while [ "$i" -lt "$count" ]; do
  : > "$base.$(printf '%03d' "$i").ppm"
  i=$((i + 1))
done
"#;

    struct Fixture {
        dir: TempDir,
        config: PipelineConfig,
    }

    impl Fixture {
        fn new(frames: usize, threads: usize, cfiasco_fail: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let script = |name: &str, body: String| {
                let path = dir.path().join(name);
                fs::write(&path, body).unwrap();
                Tool::new("sh", Some(path.to_string_lossy().into_owned()))
            };
            let config = PipelineConfig {
                threads,
                layout: "2x2".parse().unwrap(),
                fps: 25,
                ffmpeg: script("ffmpeg.sh", FAKE_FFMPEG.replace("FRAMES", &frames.to_string())),
                cfiasco: script("cfiasco.sh", FAKE_CFIASCO.replace("FAIL", cfiasco_fail)),
                dfiasco: script("dfiasco.sh", FAKE_DFIASCO.to_string()),
                frame_dir: dir.path().join("frames"),
                keep_frames: false,
            };
            fs::write(dir.path().join("video.mp4"), b"").unwrap();
            Self { dir, config }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }
    }

    #[test]
    fn encode_then_decode_preserves_frame_count() {
        let fixture = Fixture::new(7, 3, "");
        let archive = fixture.path("video.fco");

        let encoded = encode(&fixture.config, &fixture.path("video.mp4"), &archive).unwrap();
        assert_eq!(encoded, 7);
        for index in 1..=3 {
            assert!(segment_path(&archive, index).exists());
        }
        assert!(!segment_path(&archive, 4).exists());
        assert_eq!(count_frames(&fixture.config.frame_dir).unwrap(), 0);

        let output = fixture.path("decoded.mkv");
        let decoded = decode(&fixture.config, &archive, &output).unwrap();
        assert_eq!(decoded, 7);
        assert_eq!(fs::read_to_string(&output).unwrap().trim(), "7");
        assert_eq!(count_frames(&fixture.config.frame_dir).unwrap(), 0);
    }

    #[test]
    fn more_workers_than_frames() {
        let fixture = Fixture::new(2, 4, "");
        let archive = fixture.path("video.fco");

        assert_eq!(encode(&fixture.config, &fixture.path("video.mp4"), &archive).unwrap(), 2);
        assert!(segment_path(&archive, 2).exists());
        assert!(!segment_path(&archive, 3).exists());

        let output = fixture.path("decoded.mkv");
        assert_eq!(decode(&fixture.config, &archive, &output).unwrap(), 2);
    }

    #[test]
    fn failed_workers_are_reported_after_the_stage() {
        let fixture = Fixture::new(6, 3, r#"case "$output" in *.002.fco) exit 1 ;; esac"#);
        let archive = fixture.path("video.fco");

        let err = encode(&fixture.config, &fixture.path("video.mp4"), &archive).unwrap_err();

        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::WorkersFailed {
                stage,
                indices,
                details,
            }) => {
                assert_eq!(*stage, "compression");
                assert_eq!(indices, &[2]);
                assert!(details.starts_with("worker 2: "), "{details}");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("exit status: 1"), "{err}");
        assert!(segment_path(&archive, 1).exists());
        assert!(segment_path(&archive, 3).exists());
        assert_eq!(count_frames(&fixture.config.frame_dir).unwrap(), 0);
    }

    #[test]
    fn launch_failure_is_fatal_and_still_cleans_up() {
        let mut fixture = Fixture::new(4, 2, "");
        fixture.config.cfiasco = Tool::new("/nonexistent/cfiasco", None);

        let err = encode(&fixture.config, &fixture.path("video.mp4"), &fixture.path("v.fco"))
            .unwrap_err();

        assert!(err.chain().any(|cause| matches!(
            cause.downcast_ref::<ToolError>(),
            Some(ToolError::Launch { .. })
        )));
        assert_eq!(count_frames(&fixture.config.frame_dir).unwrap(), 0);
    }

    #[test]
    fn keep_frames_leaves_tiled_images() {
        let mut fixture = Fixture::new(3, 2, "");
        fixture.config.keep_frames = true;
        encode(&fixture.config, &fixture.path("video.mp4"), &fixture.path("v.fco")).unwrap();
        assert_eq!(count_frames(&fixture.config.frame_dir).unwrap(), 3);
    }

    #[test]
    fn unremovable_frame_entries_do_not_fail_encode() {
        let fixture = Fixture::new(5, 2, "");
        fs::create_dir_all(fixture.config.frame_dir.join("frame999.ppm")).unwrap();

        let encoded = encode(&fixture.config, &fixture.path("video.mp4"), &fixture.path("v.fco"));

        assert_eq!(encoded.unwrap(), 5);
        assert_eq!(count_frames(&fixture.config.frame_dir).unwrap(), 0);
        assert!(fixture.config.frame_dir.join("frame999.ppm").is_dir());
    }

    #[test]
    fn encode_replaces_segments_of_earlier_runs() {
        let fixture = Fixture::new(6, 3, "");
        let archive = fixture.path("video.fco");
        fs::write(segment_path(&archive, 7), b"old").unwrap();
        fs::write(segment_path(&archive, 2), b"old").unwrap();

        encode(&fixture.config, &fixture.path("video.mp4"), &archive).unwrap();

        assert!(!segment_path(&archive, 7).exists());
        assert_ne!(fs::read(segment_path(&archive, 2)).unwrap(), b"old");
        let output = fixture.path("decoded.mkv");
        assert_eq!(decode(&fixture.config, &archive, &output).unwrap(), 6);
    }

    #[test]
    fn tiler_failure_is_an_execution_error() {
        let mut fixture = Fixture::new(3, 2, "");
        fixture.config.ffmpeg = Tool::new("false", None);

        let err = encode(&fixture.config, &fixture.path("video.mp4"), &fixture.path("v.fco"))
            .unwrap_err();

        assert!(err.chain().any(|cause| matches!(
            cause.downcast_ref::<ToolError>(),
            Some(ToolError::Execution { .. })
        )));
    }

    #[test]
    fn missing_input_is_rejected() {
        let fixture = Fixture::new(3, 2, "");
        assert!(encode(&fixture.config, &fixture.path("missing.mp4"), &fixture.path("v.fco")).is_err());
    }
}
