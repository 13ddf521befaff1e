//! Per-platform archive fan-out.
//!
//! Builds one archive per configured platform repository, strictly in
//! configuration order. The first failure stops the fan-out; archives written
//! before it are left in place.

use crate::archive::{ArchiveOutcome, ArchiveRequest, SignedArchiver};
use crate::error::Result;
use crate::version::VersioningMode;
use log::{error, info};
use serde::Deserialize;

/// One platform repository to archive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformRepoEntry {
    /// Platform name, e.g. `el-7-x86_64`.
    pub name: String,
    /// Path or glob of the platform's signed packages.
    pub repo_location: String,
}

impl PlatformRepoEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(name: impl Into<String>, repo_location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repo_location: repo_location.into(),
        }
    }

    /// Archive name for this platform within `project`.
    #[must_use]
    pub fn target_name(&self, project: &str) -> String {
        format!("{project}-{}", self.name)
    }
}

/// Ordered source of platform repositories.
#[cfg_attr(test, mockall::automock)]
pub trait PlatformRepoList {
    /// The configured entries, in build order.
    fn entries(&self) -> Vec<PlatformRepoEntry>;
}

/// Runs an archiver over every configured platform.
pub struct RepoFanout<'a> {
    archiver: &'a dyn SignedArchiver,
    platforms: &'a dyn PlatformRepoList,
}

impl<'a> RepoFanout<'a> {
    /// Creates a fan-out over `platforms` using `archiver`.
    #[must_use]
    pub fn new(archiver: &'a dyn SignedArchiver, platforms: &'a dyn PlatformRepoList) -> Self {
        Self {
            archiver,
            platforms,
        }
    }

    /// Builds `<project>-<platform>` archives for every platform, in order.
    ///
    /// # Errors
    ///
    /// Returns the first archive failure; remaining platforms are skipped.
    pub fn create_all_archives(
        &self,
        project: &str,
        versioning: VersioningMode,
    ) -> Result<Vec<ArchiveOutcome>> {
        let entries = self.platforms.entries();
        let mut outcomes = Vec::with_capacity(entries.len());

        for entry in &entries {
            let request = ArchiveRequest::new(
                entry.repo_location.clone(),
                entry.target_name(project),
                versioning,
            );
            match self.archiver.create_signed_archive(&request) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    error!(
                        "archiving {} failed after {} of {} platform(s)",
                        request.target_name,
                        outcomes.len(),
                        entries.len()
                    );
                    return Err(err);
                }
            }
        }

        info!("built {} platform archive(s) for {project}", outcomes.len());
        Ok(outcomes)
    }
}
