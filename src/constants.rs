// vidfco - Parallel FIASCO video archiver.
// Copyright 2025 0verv0ltage
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Global constants.

// === Configuration Constants ===

/// Folder where tiled frames are stored between the
/// ffmpeg and fiasco stages.
/// Relative paths are resolved against the current directory.
/// Default: "out"
pub const FRAME_DIR: &str = "out";

/// File name prefix of every intermediate frame image.
/// Default: "frame"
pub const FRAME_PREFIX: &str = "frame";

/// Extension of the intermediate frame images.
/// Both ffmpeg and fiasco read and write portable pixmaps.
/// Default: "ppm"
pub const FRAME_EXTENSION: &str = "ppm";

/// Default number of parallel fiasco workers.
pub const DEFAULT_THREADS: u32 = 16;

/// Largest worker count whose index still fits the segment index field.
pub const MAX_THREADS: u32 = 999;

/// Default tiling layout, `<width>x<height>`.
pub const DEFAULT_LAYOUT: &str = "1x8";

/// Default playback framerate of decoded videos.
pub const DEFAULT_FPS: u32 = 25;

/// Name of the ffmpeg executable looked up on `PATH`.
pub const FFMPEG_EXECUTABLE: &str = "ffmpeg";

/// Name of the fiasco encoder executable looked up on `PATH`.
pub const CFIASCO_EXECUTABLE: &str = "cfiasco";

/// Name of the fiasco decoder executable looked up on `PATH`.
pub const DFIASCO_EXECUTABLE: &str = "dfiasco";

/// cfiasco verbosity level.
pub const CFIASCO_VERBOSITY: &str = "2";

/// cfiasco quality factor.
/// Allowed values: 1-100
/// Default: 100
pub const CFIASCO_QUALITY: &str = "100";

/// cfiasco frame type pattern.
/// Only intra frames: the default pattern produces archives
/// dfiasco crashes on.
pub const CFIASCO_PATTERN: &str = "--pattern=I";

// === Fixed Constants ===
// DO NOT CHANGE THESE

/// Digits of the zero padded counters used in every file name.
pub const INDEX_WIDTH: usize = 3;
