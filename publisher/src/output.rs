//! Output formatting for the publisher CLI.
//!
//! Progress, warnings and errors are written to stderr as plain lines.

use crate::archive::ArchiveOutcome;
use std::fmt::Display;
use std::io::Write;

/// Writes one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Describes a completed archive build.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use pkg_publisher::archive::ArchiveOutcome;
/// use pkg_publisher::output::archive_message;
///
/// let outcome = ArchiveOutcome {
///     target_name: "puppet-agent-el-7-x86_64".to_owned(),
///     working_dir: Utf8PathBuf::from("pkg/puppet-agent/5.3.1"),
///     archive_path: "repos/puppet-agent-el-7-x86_64.tar.gz".to_owned(),
///     stdout: String::new(),
///     warning: None,
/// };
/// assert_eq!(
///     archive_message(&outcome),
///     "Created pkg/puppet-agent/5.3.1/repos/puppet-agent-el-7-x86_64.tar.gz",
/// );
/// ```
#[must_use]
pub fn archive_message(outcome: &ArchiveOutcome) -> String {
    format!(
        "Created {}",
        outcome.working_dir.join(&outcome.archive_path)
    )
}

/// Format a summary after a platform fan-out.
#[must_use]
pub fn fanout_summary(outcomes: &[ArchiveOutcome], project: &str) -> String {
    let warned = outcomes.iter().filter(|o| o.warning.is_some()).count();
    let plural = if outcomes.len() == 1 { "archive" } else { "archives" };
    if warned == 0 {
        format!("Built {} {plural} for {project}", outcomes.len())
    } else {
        format!(
            "Built {} {plural} for {project} ({warned} with missing packages)",
            outcomes.len()
        )
    }
}

/// Message printed instead of running a remote command.
#[must_use]
pub fn dry_run_message(host: &str, command: &str) -> String {
    format!("Dry run - would run on {host}:\n  {command}")
}

/// Reports an archive outcome, including any warning.
///
/// Warnings are always written; the success line honours `quiet`.
pub fn report_outcome(stderr: &mut dyn Write, outcome: &ArchiveOutcome, quiet: bool) {
    if let Some(warning) = &outcome.warning {
        write_stderr_line(stderr, format!("warning: {warning}"));
    }
    if !quiet {
        write_stderr_line(stderr, archive_message(outcome));
    }
}
