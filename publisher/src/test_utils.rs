//! Shared test utilities for the publisher crate.

use crate::error::{PublishError, Result};
use crate::exec::ProcessExecutor;
use crate::tool::ToolLocator;
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// A command line run by a [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    /// The full command line.
    pub command: String,
    /// Directory it ran in.
    pub cwd: Utf8PathBuf,
}

/// A [`ProcessExecutor`] that records invocations and replays queued
/// outputs.
///
/// Once the queue is empty every further command succeeds with empty output.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    outputs: RefCell<VecDeque<Output>>,
    calls: RefCell<Vec<RecordedCommand>>,
}

impl RecordingExecutor {
    /// Creates an executor that replays `outputs` in order.
    pub fn new(outputs: Vec<Output>) -> Self {
        Self {
            outputs: RefCell::new(outputs.into()),
            calls: RefCell::default(),
        }
    }

    /// The commands run so far.
    pub fn calls(&self) -> Vec<RecordedCommand> {
        self.calls.borrow().clone()
    }
}

impl ProcessExecutor for RecordingExecutor {
    fn run(&self, command: &str, cwd: &Utf8Path) -> Result<Output> {
        self.calls.borrow_mut().push(RecordedCommand {
            command: command.to_owned(),
            cwd: cwd.to_owned(),
        });
        Ok(self
            .outputs
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(success_output))
    }
}

/// A [`ToolLocator`] backed by a fixed set of `(name, path)` pairs.
#[derive(Debug, Clone, Default)]
pub struct StaticLocator {
    tools: Vec<(String, String)>,
}

impl StaticLocator {
    /// Makes `name` resolve to `path`.
    pub fn with_tool(mut self, name: &str, path: &str) -> Self {
        self.tools.push((name.to_owned(), path.to_owned()));
        self
    }
}

impl ToolLocator for StaticLocator {
    fn find(&self, name: &str) -> Result<String> {
        self.tools
            .iter()
            .find(|(tool, _)| tool == name)
            .map(|(_, path)| path.clone())
            .ok_or_else(|| PublishError::ToolNotFound {
                tool: name.to_owned(),
            })
    }
}
