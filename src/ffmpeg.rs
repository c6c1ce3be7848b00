// vidfco - Parallel FIASCO video archiver.
// Copyright 2025 0verv0ltage
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tiling videos into frame images and back with ffmpeg.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    filesys::count_frames,
    layout::Layout,
    template::{muxer_input_pattern, tiler_output_template},
    tool::{Invocation, Tool},
};

/// Command line that tiles the frames of `input` into images in `frame_dir`.
pub fn tile_invocation(ffmpeg: &Tool, input: &Path, frame_dir: &Path, layout: Layout) -> Invocation {
    ffmpeg
        .invocation()
        .arg("-i")
        .arg(input)
        .args(["-y", "-vf", &format!("tile=layout={layout}")])
        .arg(tiler_output_template(frame_dir))
}

/// Command line that untiles the decoded images in `frame_dir` into `output`.
pub fn untile_invocation(
    ffmpeg: &Tool,
    frame_dir: &Path,
    output: &Path,
    layout: Layout,
    fps: u32,
) -> Invocation {
    // Without '-f image2' in front of the input ffmpeg does not expand the wildcards.
    // dfiasco numbers its output from 0.
    ffmpeg
        .invocation()
        .args(["-f", "image2", "-i"])
        .arg(muxer_input_pattern(frame_dir))
        .args([
            "-y",
            "-vf",
            &format!("untile={layout},setpts=N/({fps}*TB)"),
            "-start_number",
            "0",
        ])
        .arg(output)
}

/// Split a video into tiled frame images stored in `frame_dir`.
/// Returns the number of images produced.
///
/// # Arguments
/// * `ffmpeg` - ffmpeg executable.
/// * `input` - Video to split.
/// * `frame_dir` - Directory receiving the tiled images.
/// * `layout` - Grid the frames are packed into.
pub fn tile(ffmpeg: &Tool, input: &Path, frame_dir: &Path, layout: Layout) -> Result<usize> {
    tile_invocation(ffmpeg, input, frame_dir, layout)
        .run()
        .with_context(|| format!("Unable to tile {input:?}."))?;

    let frames = count_frames(frame_dir)?;
    info!(
        "Tiled {input:?} into {frames} images of up to {} frames ({layout}).",
        layout.frames_per_tile()
    );
    Ok(frames)
}

/// Combine the decoded tiled images in `frame_dir` into a video.
///
/// # Arguments
/// * `ffmpeg` - ffmpeg executable.
/// * `frame_dir` - Directory holding the decoded images.
/// * `output` - Video file to write.
/// * `layout` - Grid the frames were packed into.
/// * `fps` - Playback framerate of the output video.
pub fn untile(ffmpeg: &Tool, frame_dir: &Path, output: &Path, layout: Layout, fps: u32) -> Result<()> {
    untile_invocation(ffmpeg, frame_dir, output, layout, fps)
        .run()
        .with_context(|| format!("Unable to combine frames into {output:?}."))
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    fn args(invocation: &Invocation) -> Vec<String> {
        invocation
            .arguments()
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn tile_arguments() {
        let ffmpeg = Tool::new("ffmpeg", None);
        let invocation = tile_invocation(
            &ffmpeg,
            Path::new("in.mp4"),
            Path::new("out"),
            "2x2".parse().unwrap(),
        );
        assert_eq!(
            args(&invocation),
            ["-i", "in.mp4", "-y", "-vf", "tile=layout=2x2", "out/frame%03d.ppm"]
        );
    }

    #[test]
    fn untile_arguments_with_custom_args() {
        let ffmpeg = Tool::new("/opt/ffmpeg", Some("-hide_banner".to_string()));
        let invocation = untile_invocation(
            &ffmpeg,
            Path::new("out"),
            Path::new("video.mkv"),
            "1x8".parse().unwrap(),
            25,
        );
        assert_eq!(invocation.program(), "/opt/ffmpeg");
        assert_eq!(invocation.arguments()[0], OsString::from("-hide_banner"));
        assert_eq!(
            args(&invocation)[1..],
            [
                "-f",
                "image2",
                "-i",
                "out/frame.%*.%*.ppm",
                "-y",
                "-vf",
                "untile=1x8,setpts=N/(25*TB)",
                "-start_number",
                "0",
                "video.mkv"
            ]
        );
    }
}
