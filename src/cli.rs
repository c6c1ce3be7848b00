// vidfco - Parallel FIASCO video archiver.
// Copyright 2025 0verv0ltage
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! cli - Command line interface tooling.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::{
    constants::{
        CFIASCO_EXECUTABLE, DEFAULT_FPS, DEFAULT_LAYOUT, DEFAULT_THREADS, DFIASCO_EXECUTABLE,
        FFMPEG_EXECUTABLE, FRAME_DIR, MAX_THREADS,
    },
    layout::Layout,
    pipeline::PipelineConfig,
    tool::Tool,
};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[value(rename_all = "lower")]
/// What to do with the input:
/// - encode (Video to fiasco archive)
/// - decode (fiasco archive to Video)
pub enum Action {
    /// Encode a video into a segmented fiasco archive.
    Encode,
    /// Decode a segmented fiasco archive into a video.
    Decode,
}

#[derive(Parser, Debug)]
#[command(version, about = "Extends the functionality of fiasco", long_about = None)]
/// Command line argument handler.
pub struct Args {
    #[arg(short, long, value_enum, help = "Action to run the coder with.")]
    /// Action to run the coder with.
    pub action: Action,
    #[arg(short, long, help = "Input file to encode/decode from.")]
    /// Input file to encode/decode from.
    pub input: PathBuf,
    #[arg(short, long, help = "Output file to encode/decode to.")]
    /// Output file to encode/decode to.
    pub output: PathBuf,
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_THREADS,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_THREADS)),
        help = "Number of fiasco workers used during encoding and decoding."
    )]
    /// Number of fiasco workers used during encoding and decoding.
    pub threads: u32,
    #[arg(
        short,
        long,
        default_value = DEFAULT_LAYOUT,
        help = "Layout to tile the picture groups in. Specified in the format '4x1', where the \
                first number is the width and the second number is the height of the tiling."
    )]
    /// Layout to tile the picture groups in.
    pub layout: Layout,
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_FPS,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Target fps for the decoded video."
    )]
    /// Target fps for the decoded video.
    pub fps: u32,
    #[arg(long = "ffmpegPath", default_value = FFMPEG_EXECUTABLE, help = "Override the path to the ffmpeg binary.")]
    /// Override the path to the ffmpeg binary.
    pub ffmpeg_path: String,
    #[arg(long = "cfiascoPath", default_value = CFIASCO_EXECUTABLE, help = "Override the path to the cfiasco binary.")]
    /// Override the path to the cfiasco binary.
    pub cfiasco_path: String,
    #[arg(long = "dfiascoPath", default_value = DFIASCO_EXECUTABLE, help = "Override the path to the dfiasco binary.")]
    /// Override the path to the dfiasco binary.
    pub dfiasco_path: String,
    #[arg(
        long = "ffmpegArgs",
        allow_hyphen_values = true,
        help = "Additional argument passed to ffmpeg in front of the generated ones."
    )]
    /// Additional argument passed to ffmpeg.
    pub ffmpeg_args: Option<String>,
    #[arg(
        long = "fiascoArgs",
        allow_hyphen_values = true,
        help = "Additional argument passed to cfiasco and dfiasco in front of the generated ones."
    )]
    /// Additional argument passed to cfiasco and dfiasco.
    pub fiasco_args: Option<String>,
    #[arg(
        long,
        default_value = FRAME_DIR,
        help = "Directory intermediate frame images are stored in."
    )]
    /// Directory intermediate frame images are stored in.
    pub work_dir: PathBuf,
    #[arg(long, default_value_t = false, help = "Do not delete intermediate frame images.")]
    /// Do not delete intermediate frame images.
    pub keep_frames: bool,
}

impl Args {
    /// Use command line arguments to construct the pipeline settings.
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            threads: self.threads as usize,
            layout: self.layout,
            fps: self.fps,
            ffmpeg: Tool::new(&self.ffmpeg_path, self.ffmpeg_args.clone()),
            cfiasco: Tool::new(&self.cfiasco_path, self.fiasco_args.clone()),
            dfiasco: Tool::new(&self.dfiasco_path, self.fiasco_args.clone()),
            frame_dir: self.work_dir.clone(),
            keep_frames: self.keep_frames,
        }
    }
}
