// vidfco - Parallel FIASCO video archiver.
// Copyright 2025 0verv0ltage
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Compressing tiled frames with cfiasco and restoring them with dfiasco,
//! one archive segment per worker.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::{
    constants::{CFIASCO_PATTERN, CFIASCO_QUALITY, CFIASCO_VERBOSITY},
    dispatch::{DispatchReport, WorkerAssignment, dispatch},
    partition::partition,
    template::{
        compressor_range_input, decompressor_output_template, extract_segment_index, segment_path,
    },
    tool::Tool,
};

/// One cfiasco command line per worker that has frames to compress.
/// Workers left with an empty range are skipped.
///
/// # Arguments
/// * `cfiasco` - cfiasco executable.
/// * `frame_dir` - Directory holding the tiled frames.
/// * `archive` - Archive path, segment indices are inserted into it.
/// * `frame_count` - Number of tiled frames.
/// * `workers` - Number of parallel workers.
pub fn compress_assignments(
    cfiasco: &Tool,
    frame_dir: &Path,
    archive: &Path,
    frame_count: usize,
    workers: usize,
) -> Vec<WorkerAssignment> {
    partition(frame_count, workers)
        .into_iter()
        .zip(1..)
        .filter_map(|(range, index)| {
            if range.is_empty() {
                debug!(worker = index, "No frames left, skipping worker.");
                return None;
            }
            debug!(worker = index, "Compressing frames {range}.");
            let invocation = cfiasco
                .invocation()
                .args(["-V", CFIASCO_VERBOSITY, "-q", CFIASCO_QUALITY, "-i"])
                .arg(compressor_range_input(frame_dir, range))
                .arg("-o")
                .arg(segment_path(archive, index))
                .arg(CFIASCO_PATTERN);
            Some(WorkerAssignment { index, invocation })
        })
        .collect()
}

/// Compress all tiled frames into archive segments in parallel.
/// Segments of `archive` left by earlier runs are removed first.
///
/// # Errors
/// Fails if an old segment cannot be removed or a worker process cannot be
/// started. Workers that run but fail are reported in the returned
/// [`DispatchReport`].
pub fn compress(
    cfiasco: &Tool,
    frame_dir: &Path,
    archive: &Path,
    frame_count: usize,
    workers: usize,
) -> Result<DispatchReport> {
    let stale = remove_segments(archive)?;
    if stale > 0 {
        warn!("Removed {stale} stale segments of {archive:?}.");
    }

    let assignments = compress_assignments(cfiasco, frame_dir, archive, frame_count, workers);
    info!(
        "Compressing {frame_count} images with {} workers.",
        assignments.len()
    );
    dispatch(assignments).context("Unable to start compression workers.")
}

/// Worker indices of all segments of `archive` that exist on disk, ascending.
pub fn find_segments(archive: &Path) -> Result<Vec<usize>> {
    let dir = match archive.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut indices = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("Unable to list {dir:?}."))? {
        let entry = entry.with_context(|| format!("Unable to read entry of {dir:?}."))?;
        let candidate = archive.with_file_name(entry.file_name());
        if let Some(index) = extract_segment_index(archive, &candidate) {
            indices.push(index);
        }
    }
    indices.sort_unstable();
    Ok(indices)
}

/// Removes every segment of `archive` that exists on disk.
/// Returns how many were removed.
pub fn remove_segments(archive: &Path) -> Result<usize> {
    let segments = find_segments(archive)?;
    for &index in &segments {
        let segment = segment_path(archive, index);
        fs::remove_file(&segment)
            .with_context(|| format!("Unable to remove old segment {segment:?}."))?;
    }
    Ok(segments.len())
}

/// One dfiasco command line per worker whose segment exists.
///
/// # Arguments
/// * `dfiasco` - dfiasco executable.
/// * `archive` - Archive path the segments were derived from.
/// * `frame_dir` - Directory receiving the decoded frames.
/// * `workers` - Number of parallel workers.
pub fn decompress_assignments(
    dfiasco: &Tool,
    archive: &Path,
    frame_dir: &Path,
    workers: usize,
) -> Vec<WorkerAssignment> {
    (1..=workers)
        .filter_map(|index| {
            let segment = segment_path(archive, index);
            if !segment.exists() {
                warn!(worker = index, "Segment {segment:?} not found, skipping worker.");
                return None;
            }
            let invocation = dfiasco
                .invocation()
                .arg("-o")
                .arg(decompressor_output_template(frame_dir, index))
                .arg(segment);
            Some(WorkerAssignment { index, invocation })
        })
        .collect()
}

/// Decompress the archive segments into tiled frames in parallel.
///
/// # Errors
/// Fails if no segment of `archive` exists, if segments exist for more
/// workers than `workers`, or if a worker process cannot be started.
/// Workers that run but fail are reported in the returned [`DispatchReport`].
pub fn decompress(
    dfiasco: &Tool,
    archive: &Path,
    frame_dir: &Path,
    workers: usize,
) -> Result<DispatchReport> {
    let segments = find_segments(archive)?;
    if segments.is_empty() {
        bail!("No segments of archive {archive:?} found.");
    }
    if let Some(&last) = segments.last().filter(|&&last| last > workers) {
        bail!(
            "Archive {archive:?} has segments up to {last}, but only {workers} workers were \
             requested. Decode with the thread count used for encoding."
        );
    }

    let assignments = decompress_assignments(dfiasco, archive, frame_dir, workers);
    info!(
        "Decompressing {} segments of {archive:?}.",
        assignments.len()
    );
    dispatch(assignments).context("Unable to start decompression workers.")
}
