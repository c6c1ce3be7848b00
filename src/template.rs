// vidfco - Parallel FIASCO video archiver.
// Copyright 2025 0verv0ltage
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! File name templates understood by ffmpeg and fiasco.
//!
//! The two tools disagree on how numbered files are named:
//!
//! | Who               | Grammar                              | Example                   |
//! |-------------------|--------------------------------------|---------------------------|
//! | ffmpeg (tile)     | `<prefix>%03d.<ext>`                 | `frame%03d.ppm`           |
//! | cfiasco (input)   | `<prefix>[<start>-<end>+1].<ext>`    | `frame[001-005+1].ppm`    |
//! | fiasco (segment)  | `<stem>.<index>.<ext>`               | `archive.003.fco`         |
//! | dfiasco (output)  | `<prefix>.<segment>.<local>.<ext>`   | `frame.003.000.ppm`       |
//! | ffmpeg (untile)   | `<prefix>.%*.%*.<ext>`               | `frame.%*.%*.ppm`         |
//!
//! All counters are zero padded to `INDEX_WIDTH` digits. Worker
//! indices are 1-based.

use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

use crate::{
    constants::{FRAME_EXTENSION, FRAME_PREFIX, INDEX_WIDTH},
    partition::FrameRange,
};

/// Output template handed to ffmpeg when tiling.
/// ffmpeg replaces `%03d` with its running frame counter.
///
/// # Arguments
/// * `frame_dir` - Directory the tiled frames are written to.
pub fn tiler_output_template(frame_dir: &Path) -> PathBuf {
    frame_dir.join(format!("{FRAME_PREFIX}%0{INDEX_WIDTH}d.{FRAME_EXTENSION}"))
}

/// Input template handed to one cfiasco worker.
/// Selects exactly the frames of `range`, stepping by one.
///
/// # Arguments
/// * `frame_dir` - Directory holding the tiled frames.
/// * `range` - Frames assigned to the worker.
pub fn compressor_range_input(frame_dir: &Path, range: FrameRange) -> PathBuf {
    frame_dir.join(format!(
        "{FRAME_PREFIX}[{start:0w$}-{end:0w$}+1].{FRAME_EXTENSION}",
        start = range.start,
        end = range.end,
        w = INDEX_WIDTH
    ))
}

/// Output template handed to one dfiasco worker.
/// dfiasco appends its own per segment counter in front of the extension.
///
/// # Arguments
/// * `frame_dir` - Directory the decoded frames are written to.
/// * `index` - 1-based worker index.
pub fn decompressor_output_template(frame_dir: &Path, index: usize) -> PathBuf {
    segment_path(
        &frame_dir.join(format!("{FRAME_PREFIX}.{FRAME_EXTENSION}")),
        index,
    )
}

/// Input pattern handed to ffmpeg when untiling.
/// Matches the two level numbering written by dfiasco.
///
/// # Arguments
/// * `frame_dir` - Directory holding the decoded frames.
pub fn muxer_input_pattern(frame_dir: &Path) -> PathBuf {
    frame_dir.join(format!("{FRAME_PREFIX}.%*.%*.{FRAME_EXTENSION}"))
}

/// Stem and final extension of the templates file name.
/// Names without a dot, with only a leading dot (hidden files)
/// or ending in a dot have no extension.
fn stem_and_extension(template: &Path) -> Option<(&OsStr, &OsStr)> {
    match (template.file_stem(), template.extension()) {
        (Some(stem), Some(extension)) if !extension.is_empty() => Some((stem, extension)),
        _ => None,
    }
}

/// Derive the path of one archive segment from the user supplied template
/// by inserting the zero padded worker index in front of the final extension.
/// Templates without an extension get the index appended.
/// The template name is kept byte for byte, it need not be UTF-8.
///
/// `archive.fco`, 3 -> `archive.003.fco`
///
/// # Arguments
/// * `template` - Archive path as given on the command line.
/// * `index` - 1-based worker index.
pub fn segment_path(template: &Path, index: usize) -> PathBuf {
    let index = format!("{index:0width$}", width = INDEX_WIDTH);
    let mut segment_name = OsString::new();
    match stem_and_extension(template) {
        Some((stem, extension)) => {
            segment_name.push(stem);
            segment_name.push(".");
            segment_name.push(&index);
            segment_name.push(".");
            segment_name.push(extension);
        }
        None => {
            segment_name.push(template.file_name().unwrap_or_default());
            segment_name.push(".");
            segment_name.push(&index);
        }
    }
    template.with_file_name(segment_name)
}

/// Recover the worker index from a path built by [`segment_path`].
/// Returns `None` if `path` was not derived from `template`.
///
/// # Arguments
/// * `template` - Archive path as given on the command line.
/// * `path` - Candidate segment path.
pub fn extract_segment_index(template: &Path, path: &Path) -> Option<usize> {
    if template.parent() != path.parent() {
        return None;
    }
    let name = path.file_name()?.as_encoded_bytes();

    let digits = match stem_and_extension(template) {
        Some((stem, extension)) => name
            .strip_prefix(stem.as_encoded_bytes())?
            .strip_prefix(b".")?
            .strip_suffix(extension.as_encoded_bytes())?
            .strip_suffix(b".")?,
        None => name
            .strip_prefix(template.file_name()?.as_encoded_bytes())?
            .strip_prefix(b".")?,
    };

    if digits.len() < INDEX_WIDTH || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}
