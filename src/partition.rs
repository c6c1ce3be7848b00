// vidfco - Parallel FIASCO video archiver.
// Copyright 2025 0verv0ltage
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Splitting a sequence of frame files between workers.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Inclusive range of 1-based frame indices handled by one worker.
///
/// An empty range has `start == end + 1`. It occurs when there
/// are more workers than frames.
pub struct FrameRange {
    /// First frame of the range.
    pub start: usize,
    /// Last frame of the range.
    pub end: usize,
}

impl FrameRange {
    /// Number of frames covered by the range.
    pub fn len(self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }

    /// If the range covers no frames at all.
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Partition frames `1..=frame_count` into `workers` contiguous ranges.
///
/// Every worker gets `frame_count / workers` frames, the first
/// `frame_count % workers` workers one extra. The returned ranges are
/// ordered by worker, do not overlap and leave no gaps. Workers left
/// without frames receive an empty range directly after the last frame.
///
/// # Arguments
/// * `frame_count` - Number of frame files produced by the tiler.
/// * `workers` - Number of parallel workers. Treated as 1 when 0.
pub fn partition(frame_count: usize, workers: usize) -> Vec<FrameRange> {
    let workers = workers.max(1);
    let base = frame_count / workers;
    let rest = frame_count % workers;

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 1;
    for worker in 0..workers {
        let len = base + usize::from(worker < rest);
        ranges.push(FrameRange {
            start,
            end: start + len - 1,
        });
        start += len;
    }
    ranges
}
