//! Signed repository archive creation.
//!
//! Each archive bundles one platform's signed packages into
//! `repos/<target>.tar.gz` inside `<staging root>/<project>/<version-or-ref>`.
//! The build enters the staging root and then the version directory as nested
//! [`WorkingDir`] scopes, checks the source against the missing-target
//! policy, and runs the archiving tool.

use crate::config::BuildSettings;
use crate::error::{PublishError, Result};
use crate::exec::ProcessExecutor;
use crate::probe::FileSystemProbe;
use crate::tool::ToolLocator;
use crate::version::{ResolvedTargetDir, VersionProvider, VersioningMode};
use crate::workdir::WorkingDir;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use std::fmt;

/// One archive to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRequest {
    /// Path or glob of the signed packages, relative to the version directory.
    pub source_path: String,
    /// Archive name without extension, e.g. `puppet-el-7-x86_64`.
    pub target_name: String,
    /// Which identifier names the version directory.
    pub versioning: VersioningMode,
}

impl ArchiveRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(
        source_path: impl Into<String>,
        target_name: impl Into<String>,
        versioning: VersioningMode,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            target_name: target_name.into(),
            versioning,
        }
    }

    /// Archive path relative to the version directory.
    #[must_use]
    pub fn archive_path(&self) -> String {
        format!("repos/{}.tar.gz", self.target_name)
    }
}

/// Non-fatal conditions raised while building an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveWarning {
    /// The source matched no files but missing targets are not fatal.
    MissingSource {
        /// The source path or glob.
        source_path: String,
        /// The archive that was still attempted.
        target_name: String,
    },
}

impl fmt::Display for ArchiveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSource {
                source_path,
                target_name,
            } => write!(
                f,
                "no packages found under {source_path}; archiving {target_name} anyway \
                 (set FAIL_ON_MISSING_TARGET=true to make this fatal)"
            ),
        }
    }
}

/// Result of a successful archive build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutcome {
    /// Name of the archive that was built.
    pub target_name: String,
    /// Directory the tool ran in.
    pub working_dir: Utf8PathBuf,
    /// Archive path relative to `working_dir`.
    pub archive_path: String,
    /// Standard output captured from the tool.
    pub stdout: String,
    /// Warning raised during the build, if any.
    pub warning: Option<ArchiveWarning>,
}

/// Builds one archive per request.
#[cfg_attr(test, mockall::automock)]
pub trait SignedArchiver {
    /// Builds the archive described by `request`.
    ///
    /// # Errors
    ///
    /// Returns an error when the tool is missing, the version cannot be
    /// resolved, the source is missing and missing targets are fatal, or the
    /// tool exits unsuccessfully.
    fn create_signed_archive(&self, request: &ArchiveRequest) -> Result<ArchiveOutcome>;
}

/// Collaborators used by [`ArchiveBuilder`].
///
/// Groups the injected services so the builder constructor stays small.
#[derive(Clone, Copy)]
pub struct ArchiveServices<'a> {
    /// Locates the archiving tool.
    pub locator: &'a dyn ToolLocator,
    /// Supplies project, version and ref.
    pub versions: &'a dyn VersionProvider,
    /// Checks whether a source has anything to archive.
    pub probe: &'a dyn FileSystemProbe,
    /// Runs the archiving command.
    pub executor: &'a dyn ProcessExecutor,
}

/// Builds signed repository archives below a base directory.
pub struct ArchiveBuilder<'a> {
    base_dir: Utf8PathBuf,
    settings: &'a BuildSettings,
    services: ArchiveServices<'a>,
}

impl<'a> ArchiveBuilder<'a> {
    /// Creates a builder whose staging root is resolved against `base_dir`.
    #[must_use]
    pub fn new(
        base_dir: impl Into<Utf8PathBuf>,
        settings: &'a BuildSettings,
        services: ArchiveServices<'a>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            settings,
            services,
        }
    }

    fn archive_in(
        &self,
        cwd: &Utf8Path,
        tool: &str,
        request: &ArchiveRequest,
    ) -> Result<ArchiveOutcome> {
        let warning = self.check_source(cwd, request)?;

        let archive_path = request.archive_path();
        let command = archive_command(tool, &archive_path, &request.source_path);
        debug!("archiving {} with `{command}`", request.target_name);

        let output = self.services.executor.run(&command, cwd)?;
        if !output.status.success() {
            return Err(PublishError::execution_failure(command, &output));
        }

        info!("created {cwd}/{archive_path}");
        Ok(ArchiveOutcome {
            target_name: request.target_name.clone(),
            working_dir: cwd.to_owned(),
            archive_path,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            warning,
        })
    }

    fn check_source(
        &self,
        cwd: &Utf8Path,
        request: &ArchiveRequest,
    ) -> Result<Option<ArchiveWarning>> {
        if !self
            .services
            .probe
            .is_empty_match(&request.source_path, cwd)?
        {
            return Ok(None);
        }

        if self.settings.fail_on_missing_target {
            return Err(PublishError::MissingArchiveSource {
                source_path: request.source_path.clone(),
            });
        }

        let warning = ArchiveWarning::MissingSource {
            source_path: request.source_path.clone(),
            target_name: request.target_name.clone(),
        };
        warn!("{warning}");
        Ok(Some(warning))
    }
}

impl SignedArchiver for ArchiveBuilder<'_> {
    fn create_signed_archive(&self, request: &ArchiveRequest) -> Result<ArchiveOutcome> {
        let tool = self.services.locator.find(&self.settings.archive_tool)?;
        let target = ResolvedTargetDir::from_provider(self.services.versions, request.versioning)?;

        let mut workdir = WorkingDir::new(self.base_dir.clone());
        let mut staging = workdir.enter(&self.settings.staging_root);
        let release = staging.enter(target.relative_path());
        self.archive_in(release.current(), &tool, request)
    }
}

/// Builds the archiving command line.
///
/// # Examples
///
/// ```
/// use pkg_publisher::archive::archive_command;
///
/// assert_eq!(
///     archive_command("tar", "repos/puppet-el-7-x86_64.tar.gz", "repos/el/7/**/x86_64"),
///     "tar --owner=0 --group=0 --create --gzip --file repos/puppet-el-7-x86_64.tar.gz repos/el/7/**/x86_64",
/// );
/// ```
#[must_use]
pub fn archive_command(tool: &str, archive_path: &str, source_path: &str) -> String {
    format!("{tool} --owner=0 --group=0 --create --gzip --file {archive_path} {source_path}")
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
