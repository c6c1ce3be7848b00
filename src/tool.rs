// vidfco - Parallel FIASCO video archiver.
// Copyright 2025 0verv0ltage
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Running external executables.

use std::{
    ffi::{OsStr, OsString},
    fmt, io,
    process::{Child, Command, ExitStatus},
};

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
/// Failures of a single external tool invocation.
pub enum ToolError {
    /// The executable could not be started at all.
    #[error("unable to start {program:?}")]
    Launch {
        /// Executable that was requested.
        program: String,
        /// Reason reported by the operating system.
        #[source]
        source: io::Error,
    },
    /// The executable was started but waiting on it failed.
    #[error("unable to wait for {program:?}")]
    Wait {
        /// Executable that was started.
        program: String,
        /// Reason reported by the operating system.
        #[source]
        source: io::Error,
    },
    /// The executable ran and reported failure.
    #[error("{program:?} returned nonzero exit status ({status})")]
    Execution {
        /// Executable that failed.
        program: String,
        /// Exit status it reported.
        status: ExitStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// An external executable together with the extra argument the user wants
/// passed to every run of it.
pub struct Tool {
    /// Executable name or path.
    pub program: String,
    /// Extra argument placed in front of the generated ones.
    pub custom_args: Option<String>,
}

impl Tool {
    /// Describe an executable.
    pub fn new(program: impl Into<String>, custom_args: Option<String>) -> Self {
        Self {
            program: program.into(),
            custom_args,
        }
    }

    /// Start a command line for this tool.
    pub fn invocation(&self) -> Invocation {
        Invocation::new(&self.program, self.custom_args.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Fully resolved command line of one external tool run.
pub struct Invocation {
    /// Executable name or path.
    program: String,
    /// Arguments in the order they are passed.
    args: Vec<OsString>,
}

impl Invocation {
    /// Start a command line for `program`.
    /// `custom_args` is passed as a single argument in front of
    /// everything added afterwards. Empty strings are ignored.
    ///
    /// # Arguments
    /// * `program` - Executable name or path.
    /// * `custom_args` - Extra user supplied argument.
    pub fn new(program: &str, custom_args: Option<&str>) -> Self {
        let args = custom_args
            .filter(|custom| !custom.is_empty())
            .map(OsString::from)
            .into_iter()
            .collect();
        Self {
            program: program.to_string(),
            args,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    /// Executable this invocation runs.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the executable.
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Start the process without waiting for it.
    /// stdout and stderr are inherited so the tools progress output stays visible.
    pub fn spawn(&self) -> Result<Child, ToolError> {
        debug!("Running {}", self);
        Command::new(&self.program)
            .args(&self.args)
            .spawn()
            .map_err(|source| ToolError::Launch {
                program: self.program.clone(),
                source,
            })
    }

    /// Wait for a child started from this invocation and check its exit status.
    pub fn wait(&self, child: &mut Child) -> Result<(), ToolError> {
        let status = child.wait().map_err(|source| ToolError::Wait {
            program: self.program.clone(),
            source,
        })?;
        self.check(status)
    }

    /// Start the process and block until it exits.
    pub fn run(&self) -> Result<(), ToolError> {
        let mut child = self.spawn()?;
        self.wait(&mut child)
    }

    /// Map a non-success exit status to [`ToolError::Execution`].
    fn check(&self, status: ExitStatus) -> Result<(), ToolError> {
        if status.success() {
            Ok(())
        } else {
            Err(ToolError::Execution {
                program: self.program.clone(),
                status,
            })
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.arguments() {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
