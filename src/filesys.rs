// vidfco - Parallel FIASCO video archiver.
// Copyright 2025 0verv0ltage
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! File system access.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glob::{Pattern, glob};
use tracing::{debug, warn};

use crate::constants::{FRAME_EXTENSION, FRAME_PREFIX};

/// Creates the directory intermediate frames are stored in
/// if it doesnt exist yet.
pub fn ensure_frame_dir(frame_dir: &Path) -> Result<()> {
    if !frame_dir.exists() {
        fs::create_dir_all(frame_dir)
            .with_context(|| format!("Unable to create frame directory {frame_dir:?}."))?;
    }
    Ok(())
}

/// Returns glob wildcard over all intermediate frames, tiled or decoded.
pub fn frame_wildcard(frame_dir: &Path) -> String {
    let dir = Pattern::escape(&frame_dir.to_string_lossy());
    format!("{dir}/{FRAME_PREFIX}*.{FRAME_EXTENSION}")
}

/// Number of frame images currently in the frame directory.
/// Only regular files count.
pub fn count_frames(frame_dir: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in glob(&frame_wildcard(frame_dir)).context("Invalid frame wildcard.")? {
        if entry.context("Unable to read frame directory entry.")?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

/// Removes all intermediate frames.
/// Failing removals are logged and skipped.
/// Returns how many files were removed.
pub fn remove_frames(frame_dir: &Path) -> usize {
    let entries = match glob(&frame_wildcard(frame_dir)) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Unable to list frames for cleanup: {err}");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                warn!("Unable to read frame directory entry: {err}");
                continue;
            }
        };
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(err) => warn!("Unable to remove {path:?}: {err}"),
        }
    }
    debug!("Removed {removed} frame files from {frame_dir:?}.");
    removed
}

#[derive(Debug)]
/// Removes the intermediate frames when dropped,
/// whichever way the operation holding it ends.
pub struct FrameCleanup {
    /// Directory to clean.
    frame_dir: PathBuf,
    /// Leave frames in place.
    keep: bool,
}

impl FrameCleanup {
    /// Arm cleanup of `frame_dir`.
    /// With `keep` set nothing is removed.
    pub fn new(frame_dir: &Path, keep: bool) -> Self {
        Self {
            frame_dir: frame_dir.to_path_buf(),
            keep,
        }
    }
}

impl Drop for FrameCleanup {
    fn drop(&mut self) {
        if self.keep {
            debug!("Keeping intermediate frames in {:?}.", self.frame_dir);
            return;
        }
        remove_frames(&self.frame_dir);
    }
}
