//! Remote command dispatch.
//!
//! Repository metadata is regenerated on the repository host by running the
//! substituted publish command over `ssh`. A [`DryRunRemote`] records the
//! commands instead, for previews and tests.

use crate::error::{PublishError, Result};
use log::{debug, info};
use std::cell::RefCell;
use std::io::{self, Read};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Runs commands on remote hosts.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteExecutor {
    /// Runs `command` on `host`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::ToolExecutionFailure`] if the command exits
    /// unsuccessfully, or an I/O error if it cannot be started.
    fn remote_command(&self, host: &str, command: &str) -> Result<()>;
}

/// Dispatches commands with the system `ssh` client.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    program: String,
    timeout: Option<Duration>,
}

impl Default for SshExecutor {
    fn default() -> Self {
        Self {
            program: "ssh".to_owned(),
            timeout: None,
        }
    }
}

impl SshExecutor {
    /// Bounds each remote command by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Uses `program` instead of `ssh`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to the ssh client for one command.
    #[must_use]
    pub fn ssh_args(host: &str, command: &str) -> [String; 3] {
        ["-t".to_owned(), host.to_owned(), format!("set -e; {command}")]
    }

    fn run(&self, host: &str, command: &str) -> Result<Output> {
        let mut cmd = Command::new(&self.program);
        cmd.args(Self::ssh_args(host, command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let Some(timeout) = self.timeout else {
            return Ok(cmd.output()?);
        };

        let mut child = cmd.spawn()?;
        // Drain both pipes while waiting so a chatty client cannot fill them
        // and stall.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        match child.wait_timeout(timeout)? {
            Some(status) => Ok(Output {
                status,
                stdout: collect(stdout)?,
                stderr: collect(stderr)?,
            }),
            None => {
                // Best-effort cleanup; the timeout is what gets reported.
                // The readers are left detached since grandchildren may still
                // hold the pipes open.
                let _ = child.kill();
                let _ = child.wait();
                Err(PublishError::RemoteTimeout {
                    host: host.to_owned(),
                    seconds: timeout.as_secs(),
                })
            }
        }
    }
}

fn drain<R>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn collect(reader: JoinHandle<io::Result<Vec<u8>>>) -> Result<Vec<u8>> {
    let bytes = reader
        .join()
        .map_err(|_| io::Error::other("output reader thread panicked"))??;
    Ok(bytes)
}

impl RemoteExecutor for SshExecutor {
    fn remote_command(&self, host: &str, command: &str) -> Result<()> {
        debug!("ssh {host}: {command}");
        let output = self.run(host, command)?;
        if !output.status.success() {
            return Err(PublishError::execution_failure(
                format!("{} {host} {command}", self.program),
                &output,
            ));
        }
        info!("remote command on {host} completed");
        Ok(())
    }
}

/// A command that would have been dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    /// Target host.
    pub host: String,
    /// Fully substituted command.
    pub command: String,
}

/// Records remote commands instead of running them.
#[derive(Debug, Default)]
pub struct DryRunRemote {
    calls: RefCell<Vec<RemoteCall>>,
}

impl DryRunRemote {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded calls, in dispatch order.
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.borrow().clone()
    }
}

impl RemoteExecutor for DryRunRemote {
    fn remote_command(&self, host: &str, command: &str) -> Result<()> {
        info!("dry run: would run on {host}: {command}");
        self.calls.borrow_mut().push(RemoteCall {
            host: host.to_owned(),
            command: command.to_owned(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssh_args_wrap_the_command_in_set_e() {
        let args = SshExecutor::ssh_args("yum.example.net", "createrepo /opt/repo");
        assert_eq!(args, ["-t", "yum.example.net", "set -e; createrepo /opt/repo"]);
    }

    #[test]
    fn dry_run_records_calls_in_order() {
        let remote = DryRunRemote::new();
        remote.remote_command("a.example.net", "one").expect("records");
        remote.remote_command("b.example.net", "two").expect("records");

        let calls = remote.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].host, "a.example.net");
        assert_eq!(calls[1].command, "two");
    }

    #[cfg(unix)]
    #[test]
    fn failing_client_is_a_tool_execution_failure() {
        // `false` ignores its arguments and exits 1, standing in for ssh.
        let remote = SshExecutor::default().with_program("false");
        let err = remote
            .remote_command("yum.example.net", "createrepo /opt/repo")
            .expect_err("client fails");
        assert!(matches!(
            err,
            PublishError::ToolExecutionFailure { code: 1, .. }
        ));
    }

    #[cfg(unix)]
    fn fake_client(dir: &tempfile::TempDir, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.path().join("fake-ssh");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).expect("write script");
        let mut perms = std::fs::metadata(&script).expect("metadata").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).expect("chmod");
        script.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[test]
    fn slow_client_times_out() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let remote = SshExecutor::default()
            .with_program(fake_client(&temp, "sleep 5"))
            .with_timeout(Some(Duration::from_millis(200)));
        let err = remote
            .remote_command("yum.example.net", "createrepo")
            .expect_err("client times out");
        assert!(matches!(err, PublishError::RemoteTimeout { seconds: 0, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn chatty_client_completes_within_the_timeout() {
        // More output than a pipe buffer holds, on both streams.
        let temp = tempfile::TempDir::new().expect("temp dir");
        let remote = SshExecutor::default()
            .with_program(fake_client(
                &temp,
                "head -c 200000 /dev/zero\nhead -c 200000 /dev/zero >&2\nexit 0",
            ))
            .with_timeout(Some(Duration::from_secs(10)));
        remote
            .remote_command("yum.example.net", "createrepo")
            .expect("chatty client succeeds");
    }

    #[cfg(unix)]
    #[test]
    fn chatty_failure_keeps_its_stderr() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let remote = SshExecutor::default()
            .with_program(fake_client(
                &temp,
                "head -c 100000 /dev/zero\necho 'createrepo: no such directory' >&2\nexit 3",
            ))
            .with_timeout(Some(Duration::from_secs(10)));
        let err = remote
            .remote_command("yum.example.net", "createrepo")
            .expect_err("client fails");
        match err {
            PublishError::ToolExecutionFailure { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert!(stderr.contains("no such directory"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
