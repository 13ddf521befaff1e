//! CLI argument definitions for the package publisher.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::config::{DEFAULT_CONFIG_FILE, RepoTarget};
use crate::publish::PublishParams;
use crate::version::VersioningMode;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Build signed repository archives and publish repository metadata.
#[derive(Parser, Debug)]
#[command(name = "pkg-publisher")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build signed repository archives and publish repository metadata.\n\n",
    "Archives are written to <staging_root>/<project>/<version-or-ref>/repos. ",
    "Publish commands run a configured command template on the repository host ",
    "over ssh.\n\n",
    "Set FAIL_ON_MISSING_TARGET=true to make archive sources that match no files ",
    "fatal. GPG_KEY overrides the configured signing key.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Archive every configured platform by version:\n",
    "    $ pkg-publisher archive-all\n\n",
    "  Archive one platform by source-control ref:\n",
    "    $ pkg-publisher archive --source 'repos/el/7/**/x86_64' \\\n",
    "        --target puppet-agent-el-7-x86_64 --versioning ref\n\n",
    "  Preview the YUM publish command:\n",
    "    $ pkg-publisher update-yum --dry-run",
))]
pub struct Cli {
    /// Build defaults file.
    #[arg(long, global = true, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: Utf8PathBuf,

    /// Suppress progress output (warnings and errors still shown).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build one signed repository archive.
    Archive(ArchiveArgs),

    /// Build an archive for every configured platform repository.
    ArchiveAll(ArchiveAllArgs),

    /// Regenerate YUM repository metadata on the repository host.
    UpdateYum(YumArgs),

    /// Regenerate APT repository metadata on the repository host.
    UpdateApt(AptArgs),

    /// Run an arbitrary command template on a repository host.
    UpdateRepo(UpdateRepoArgs),
}

/// Arguments for the archive command.
#[derive(Args, Debug, Clone)]
pub struct ArchiveArgs {
    /// Path or glob of the signed packages, relative to the version directory.
    #[arg(long, value_name = "GLOB")]
    pub source: String,

    /// Archive name, without the `.tar.gz` extension.
    #[arg(long, value_name = "NAME")]
    pub target: String,

    /// Name the version directory by `version` or `ref`.
    #[arg(long, value_name = "MODE", default_value = "version")]
    pub versioning: VersioningMode,
}

/// Arguments for the archive-all command.
#[derive(Args, Debug, Clone)]
pub struct ArchiveAllArgs {
    /// Name the version directory by `version` or `ref`.
    #[arg(long, value_name = "MODE", default_value = "version")]
    pub versioning: VersioningMode,
}

/// Repository details shared by the publish commands.
///
/// Each flag falls back to the matching key in the build defaults.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoArgs {
    /// Repository name.
    #[arg(long, value_name = "NAME")]
    pub repo_name: Option<String>,

    /// Repository path on the host.
    #[arg(long, value_name = "PATH")]
    pub repo_path: Option<String>,

    /// Host that serves the repository.
    #[arg(long, value_name = "HOST")]
    pub repo_host: Option<String>,

    /// Print the command instead of running it.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the update-yum command.
#[derive(Args, Debug, Clone, Default)]
pub struct YumArgs {
    /// Repository details.
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Command template run on the host.
    #[arg(long, value_name = "TEMPLATE")]
    pub command: Option<String>,
}

/// Arguments for the update-apt command.
#[derive(Args, Debug, Clone, Default)]
pub struct AptArgs {
    /// Repository details.
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Public repository URL.
    #[arg(long, value_name = "URL")]
    pub repo_url: Option<String>,

    /// Command template run on the host.
    #[arg(long, value_name = "TEMPLATE")]
    pub command: Option<String>,
}

/// Arguments for the update-repo command.
#[derive(Args, Debug, Clone)]
pub struct UpdateRepoArgs {
    /// Host the command runs on.
    #[arg(long, value_name = "HOST")]
    pub host: String,

    /// Command template run on the host.
    #[arg(long, value_name = "TEMPLATE")]
    pub command: String,

    /// Repository details.
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Public repository URL.
    #[arg(long, value_name = "URL")]
    pub repo_url: Option<String>,
}

/// Publish values after merging flags over a configured target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Repository name.
    pub repo_name: Option<String>,
    /// Repository path.
    pub repo_path: Option<String>,
    /// Repository host.
    pub repo_host: Option<String>,
    /// Repository URL.
    pub repo_url: Option<String>,
    /// Command template.
    pub command: Option<String>,
}

impl ResolvedTarget {
    /// Merges explicit flags over `configured`; flags win.
    #[must_use]
    pub fn merge(
        repo: &RepoArgs,
        repo_url: Option<&String>,
        command: Option<&String>,
        configured: Option<&RepoTarget>,
    ) -> Self {
        let fallback = configured.cloned().unwrap_or_default();
        Self {
            repo_name: repo.repo_name.clone().or(fallback.repo_name),
            repo_path: repo.repo_path.clone().or(fallback.repo_path),
            repo_host: repo.repo_host.clone().or(fallback.repo_host),
            repo_url: repo_url.cloned().or(fallback.repo_url),
            command: command.cloned().or(fallback.command),
        }
    }

    /// The repository details as publish parameters.
    #[must_use]
    pub fn params(&self) -> PublishParams {
        PublishParams {
            repo_name: self.repo_name.clone(),
            repo_path: self.repo_path.clone(),
            repo_host: self.repo_host.clone(),
            repo_url: self.repo_url.clone(),
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
