// vidfco - Parallel FIASCO video archiver.
// Copyright 2025 0verv0ltage
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Running one external process per worker in parallel.

use std::{panic, thread};

use tracing::{debug, error, warn};

use crate::tool::{Invocation, ToolError};

#[derive(Debug, Clone)]
/// One worker and the command line it runs.
pub struct WorkerAssignment {
    /// 1-based worker index.
    pub index: usize,
    /// Command line of the workers process.
    pub invocation: Invocation,
}

#[derive(Debug)]
/// A worker whose process ran but did not succeed.
pub struct WorkerFailure {
    /// 1-based worker index.
    pub index: usize,
    /// What went wrong.
    pub error: ToolError,
}

#[derive(Debug, Default)]
/// Outcome of all workers of one dispatch.
pub struct DispatchReport {
    /// Workers that exited successfully, by index.
    pub succeeded: Vec<usize>,
    /// Workers that exited with a failure, by index.
    pub failures: Vec<WorkerFailure>,
}

impl DispatchReport {
    /// If every dispatched worker succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Indices of the failed workers in ascending order.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|failure| failure.index).collect()
    }

    /// Failed workers and their errors, one `worker N: error` entry each.
    pub fn failure_summary(&self) -> String {
        self.failures
            .iter()
            .map(|failure| format!("worker {}: {}", failure.index, failure.error))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Launch every assignment at once and wait until all of them have exited.
///
/// Processes are started in assignment order, each one handed to its own
/// thread that waits for it. A failing worker does not affect its siblings:
/// exit failures are collected in the returned report.
///
/// # Errors
/// If a process cannot be started no further ones are launched. The ones
/// already running are still waited for, then the launch error is returned.
///
/// # Arguments
/// * `assignments` - One entry per worker.
pub fn dispatch(assignments: Vec<WorkerAssignment>) -> Result<DispatchReport, ToolError> {
    thread::scope(|scope| {
        let mut running = Vec::with_capacity(assignments.len());
        let mut launch_error = None;

        for assignment in assignments {
            let mut child = match assignment.invocation.spawn() {
                Ok(child) => child,
                Err(err) => {
                    error!(worker = assignment.index, "{err}");
                    launch_error = Some(err);
                    break;
                }
            };
            debug!(
                worker = assignment.index,
                pid = child.id(),
                program = assignment.invocation.program(),
                "Worker started"
            );
            running.push(scope.spawn(move || {
                let result = assignment.invocation.wait(&mut child);
                (assignment.index, result)
            }));
        }

        let mut report = DispatchReport::default();
        for handle in running {
            match handle.join() {
                Ok((index, Ok(()))) => {
                    debug!(worker = index, "Worker finished");
                    report.succeeded.push(index);
                }
                Ok((index, Err(error))) => {
                    warn!(worker = index, "Worker failed: {error}");
                    report.failures.push(WorkerFailure { index, error });
                }
                Err(payload) => panic::resume_unwind(payload),
            }
        }

        match launch_error {
            Some(err) => Err(err),
            None => Ok(report),
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn shell(index: usize, script: &str) -> WorkerAssignment {
        WorkerAssignment {
            index,
            invocation: Invocation::new("sh", None).args(["-c", script]),
        }
    }

    #[test]
    fn all_workers_succeed() {
        let report = dispatch((1..=4).map(|i| shell(i, "exit 0")).collect()).unwrap();
        assert!(report.is_success());
        assert_eq!(report.succeeded, [1, 2, 3, 4]);
    }

    #[test]
    fn empty_dispatch_is_a_no_op() {
        let report = dispatch(Vec::new()).unwrap();
        assert!(report.is_success());
        assert!(report.succeeded.is_empty());
    }

    #[test]
    fn failing_workers_are_collected() {
        let assignments = vec![
            shell(1, "exit 0"),
            shell(2, "exit 3"),
            shell(3, "sleep 0.2; exit 0"),
            shell(4, "exit 1"),
        ];
        let report = dispatch(assignments).unwrap();
        assert!(!report.is_success());
        assert_eq!(report.succeeded, [1, 3]);
        assert_eq!(report.failed_indices(), [2, 4]);
        match &report.failures[0].error {
            ToolError::Execution { status, .. } => assert_eq!(status.code(), Some(3)),
            other => panic!("unexpected error {other:?}"),
        }
        let summary = report.failure_summary();
        assert!(summary.starts_with("worker 2: "), "{summary}");
        assert!(summary.contains("; worker 4: "), "{summary}");
    }

    #[test]
    fn workers_run_concurrently() {
        let start = Instant::now();
        let report = dispatch((1..=4).map(|i| shell(i, "sleep 1")).collect()).unwrap();
        assert!(report.is_success());
        assert!(start.elapsed() < Duration::from_secs(3), "{:?}", start.elapsed());
    }

    #[test]
    fn launch_failure_waits_for_running_workers() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("first-done");
        let assignments = vec![
            shell(1, &format!("sleep 0.3; touch '{}'", marker.display())),
            WorkerAssignment {
                index: 2,
                invocation: Invocation::new("/nonexistent/vidfco-worker", None),
            },
            shell(3, &format!("touch '{}'", dir.path().join("never").display())),
        ];

        let result = dispatch(assignments);

        assert!(matches!(result, Err(ToolError::Launch { .. })));
        assert!(marker.exists(), "running worker was not waited for");
        assert!(!dir.path().join("never").exists());
    }
}
