// vidfco - Parallel FIASCO video archiver.
// Copyright 2025 0verv0ltage
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tiling layout of the frame groups.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use thiserror::Error;

/// Accepted layout syntax, e.g. `4x1`.
static LAYOUT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)x([0-9]+)$").expect("layout pattern compiles"));

#[derive(Error, Debug, PartialEq, Eq)]
/// Reasons a layout string is rejected.
pub enum LayoutError {
    /// Input does not look like `<width>x<height>`.
    #[error(
        "invalid layout {0:?}. Use the format '4x1', where the first number is the width \
         and the second number is the height of the tiling"
    )]
    Malformed(String),
    /// A dimension is zero or does not fit into 32 bits.
    #[error("layout dimension in {0:?} must be between 1 and {max}", max = u32::MAX)]
    Dimension(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Grid of frames packed into one tiled image.
pub struct Layout {
    /// Frames per row.
    pub width: u32,
    /// Frames per column.
    pub height: u32,
}

impl Layout {
    /// Number of video frames that end up in one tiled image.
    pub fn frames_per_tile(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl FromStr for Layout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = LAYOUT_PATTERN
            .captures(s)
            .ok_or_else(|| LayoutError::Malformed(s.to_string()))?;
        let dimension = |i: usize| -> Result<u32, LayoutError> {
            match captures[i].parse::<u32>() {
                Ok(0) | Err(_) => Err(LayoutError::Dimension(s.to_string())),
                Ok(value) => Ok(value),
            }
        };
        Ok(Self {
            width: dimension(1)?,
            height: dimension(2)?,
        })
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
