// vidfco - Parallel FIASCO video archiver.
// Copyright 2025 0verv0ltage
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! vidfco - Parallel FIASCO video archiver.
//! Tile the frames of a video with ffmpeg and compress the tiles with
//! many cfiasco processes at once, one archive segment each.
//! Also does the reverse with dfiasco.
//! NOTE: No effort has been undertaken to make this work on Windows. Probably wont. 🤷

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    clippy::missing_docs_in_private_items,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::pedantic,
    clippy::redundant_clone,
    clippy::needless_pass_by_value
)]
#![allow(clippy::cast_lossless)]

use std::{process::ExitCode, time};

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Action, Args};
use pipeline::PipelineError;
use tool::ToolError;
use utils::format_duration;

/// Times the execution of `code` and
/// logs the measured time.
macro_rules! timed_block {
    ($name:expr, $code:block) => {
        tracing::info!("Starting {}", $name);
        let start = std::time::Instant::now();
        $code
        tracing::info!(
            "Finished {} after: {}",
            $name,
            $crate::utils::format_duration(start.elapsed())
        );
    };
}

mod cli;
mod constants;
mod dispatch;
mod ffmpeg;
mod fiasco;
mod filesys;
mod layout;
mod partition;
mod pipeline;
mod template;
mod tool;
mod utils;

/// Exit status for errors without a more specific status.
const EXIT_FAILURE: u8 = 1;

/// Exit status when an external tool could not be started.
const EXIT_LAUNCH_FAILURE: u8 = 3;

/// Exit status when an external tool or worker reported failure.
const EXIT_EXECUTION_FAILURE: u8 = 4;

/// Read in command line args and execute program function as requested.
fn execute_args(args: &Args) -> Result<()> {
    let config = args.to_pipeline_config();
    match args.action {
        Action::Encode => {
            let frames = pipeline::encode(&config, &args.input, &args.output)?;
            info!("Encoded {frames} images into {:?}.", args.output);
        }
        Action::Decode => {
            let frames = pipeline::decode(&config, &args.input, &args.output)?;
            info!("Decoded {frames} images into {:?}.", args.output);
        }
    }
    Ok(())
}

/// Pick the process exit status for a failed run.
fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        match cause.downcast_ref::<ToolError>() {
            Some(ToolError::Launch { .. }) => return EXIT_LAUNCH_FAILURE,
            Some(ToolError::Execution { .. } | ToolError::Wait { .. }) => {
                return EXIT_EXECUTION_FAILURE;
            }
            None => {}
        }
        if cause.downcast_ref::<PipelineError>().is_some() {
            return EXIT_EXECUTION_FAILURE;
        }
    }
    EXIT_FAILURE
}

fn main() -> ExitCode {
    // Usage errors, including malformed layouts, exit here with status 2.
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let main_start = time::Instant::now();
    let result = execute_args(&args);
    info!(
        "Total execution time: {}",
        format_duration(main_start.elapsed())
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
