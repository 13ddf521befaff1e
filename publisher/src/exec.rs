//! Local command execution.
//!
//! The archive builder hands a complete command line and a working directory
//! to a [`ProcessExecutor`]. The production executor runs the line through
//! `sh -c` so that glob source paths expand the same way they would in an
//! interactive shell.

use crate::error::Result;
use camino::Utf8Path;
use log::debug;
use std::process::{Command, Output};

/// Abstraction for running local command lines.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessExecutor {
    /// Runs `command` in `cwd` and returns the captured output.
    ///
    /// A non-zero exit status is returned as part of [`Output`], not as an
    /// error; callers decide whether it is fatal.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while spawning the command.
    fn run(&self, command: &str, cwd: &Utf8Path) -> Result<Output>;
}

/// Runs command lines with `sh -c` on the host system.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use pkg_publisher::exec::{ProcessExecutor, ShellExecutor};
///
/// let executor = ShellExecutor;
/// let output = executor.run("tar --version", Utf8Path::new("."))?;
/// assert!(output.status.success());
/// # Ok::<(), pkg_publisher::error::PublishError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExecutor;

impl ProcessExecutor for ShellExecutor {
    fn run(&self, command: &str, cwd: &Utf8Path) -> Result<Output> {
        debug!("running `{command}` in {cwd}");
        Ok(Command::new("sh")
            .args(["-c", command])
            .current_dir(cwd.as_std_path())
            .output()?)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn runs_in_the_requested_directory() {
        let temp = TempDir::new().expect("temp dir");
        let dir = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("utf-8 temp dir");
        std::fs::write(dir.join("marker.txt"), "x").expect("write marker");

        let output = ShellExecutor.run("ls", &dir).expect("ls runs");
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("marker.txt"));
    }

    #[test]
    fn non_zero_exit_is_reported_in_output() {
        let output = ShellExecutor
            .run("echo nope >&2; exit 3", Utf8Path::new("."))
            .expect("sh runs");
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&output.stderr).trim(), "nope");
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let result = ShellExecutor.run("true", Utf8Path::new("/nonexistent_dir_12345"));
        assert!(result.is_err());
    }
}
