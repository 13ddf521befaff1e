//! Error types for archive building and repository publishing.
//!
//! Every fatal condition in the publisher maps to one variant here. The
//! non-fatal missing-source condition is not an error; it is reported as an
//! [`ArchiveWarning`](crate::archive::ArchiveWarning) on the build outcome.

use crate::version::VersioningMode;
use camino::Utf8PathBuf;
use std::process::Output;
use thiserror::Error;

/// Errors that can occur while building archives or publishing repositories.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The versioning mode is neither `ref` nor `version`.
    #[error("invalid versioning mode '{mode}': expected 'ref' or 'version'")]
    InvalidVersioningMode {
        /// The rejected mode string.
        mode: String,
    },

    /// The value selected by the versioning mode is blank.
    #[error("no {mode} value is configured; cannot resolve the version directory")]
    EmptyVersion {
        /// The mode whose value was blank.
        mode: VersioningMode,
    },

    /// The archiving tool (or another required binary) is not on `PATH`.
    #[error("required tool '{tool}' was not found in PATH")]
    ToolNotFound {
        /// Name of the missing tool.
        tool: String,
    },

    /// The archive source matched no files and missing targets are fatal.
    #[error("ERROR: missing packages under {source_path}")]
    MissingArchiveSource {
        /// The source path or glob that matched nothing.
        source_path: String,
    },

    /// A publish parameter was absent or blank.
    #[error("invalid parameters: one of your arguments is nil ({field})")]
    InvalidParameters {
        /// The first parameter found missing.
        field: &'static str,
    },

    /// A command template uses a placeholder whose value was not supplied.
    #[error("Error: Missing required argument '{argument}', perhaps update build_defaults?")]
    MissingRequiredArgument {
        /// The argument name, e.g. `repo_url`.
        argument: &'static str,
    },

    /// No signing key is configured.
    #[error("no signing key configured; set `gpg_key` in the build defaults or export GPG_KEY")]
    SigningKeyMissing,

    /// A source glob could not be parsed or walked.
    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidGlob {
        /// The offending pattern.
        pattern: String,
        /// Description of the parse or walk failure.
        reason: String,
    },

    /// A local or remote command exited unsuccessfully.
    #[error("`{command}` failed (exit code {code}): {stderr}")]
    ToolExecutionFailure {
        /// The command line that was run.
        command: String,
        /// Exit code, or -1 when terminated by a signal.
        code: i32,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// A remote command did not finish within the configured timeout.
    #[error("remote command on {host} timed out after {seconds} seconds")]
    RemoteTimeout {
        /// Host the command was dispatched to.
        host: String,
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// The build defaults file could not be read or parsed.
    #[error("invalid build defaults at {path}: {reason}")]
    Config {
        /// Path of the defaults file.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublishError {
    /// Builds a [`PublishError::ToolExecutionFailure`] from captured output.
    #[must_use]
    pub fn execution_failure(command: impl Into<String>, output: &Output) -> Self {
        Self::ToolExecutionFailure {
            command: command.into(),
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        }
    }
}

/// Result type alias using [`PublishError`].
pub type Result<T> = std::result::Result<T, PublishError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::failure_output;

    #[test]
    fn missing_archive_source_uses_the_legacy_message() {
        let err = PublishError::MissingArchiveSource {
            source_path: "/path".to_owned(),
        };
        assert_eq!(err.to_string(), "ERROR: missing packages under /path");
    }

    #[test]
    fn invalid_parameters_mentions_nil_arguments() {
        let err = PublishError::InvalidParameters { field: "repo_path" };
        let msg = err.to_string();
        assert!(msg.contains("one of your arguments is nil"));
        assert!(msg.contains("repo_path"));
    }

    #[test]
    fn missing_required_argument_points_at_build_defaults() {
        let err = PublishError::MissingRequiredArgument {
            argument: "repo_url",
        };
        assert_eq!(
            err.to_string(),
            "Error: Missing required argument 'repo_url', perhaps update build_defaults?"
        );
    }

    #[test]
    fn execution_failure_captures_exit_code_and_stderr() {
        let output = failure_output("tar: repos: Cannot open\n");
        let err = PublishError::execution_failure("tar --create", &output);
        match &err {
            PublishError::ToolExecutionFailure { code, stderr, .. } => {
                assert_eq!(*code, 1);
                assert_eq!(stderr, "tar: repos: Cannot open");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("tar --create"));
    }

    #[test]
    fn io_errors_convert_via_from() {
        let err = PublishError::from(std::io::Error::other("disk full"));
        assert!(err.to_string().contains("disk full"));
    }
}
