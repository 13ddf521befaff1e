//! Build defaults and per-invocation settings.
//!
//! Project metadata, the platform repository list, APT releases and the
//! publish targets live in a TOML build-defaults file. Environment overrides
//! (`FAIL_ON_MISSING_TARGET`, `GPG_KEY`) are read once, when an invocation
//! starts, and are carried from then on in explicit values.

use crate::error::{PublishError, Result};
use crate::fanout::{PlatformRepoEntry, PlatformRepoList};
use crate::publish::AptReleaseList;
use crate::version::{VersionProvider, dot_version};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// Default file name of the build defaults.
pub const DEFAULT_CONFIG_FILE: &str = "build_defaults.toml";

/// Environment variable that makes empty archive sources fatal.
pub const FAIL_ON_MISSING_TARGET_ENV: &str = "FAIL_ON_MISSING_TARGET";

/// Environment variable that overrides the configured signing key.
pub const GPG_KEY_ENV: &str = "GPG_KEY";

/// Contents of the build defaults file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BuildDefaults {
    /// Project name.
    pub project: String,
    /// Described version, e.g. `5.3.1-12-g1234abc`.
    #[serde(default)]
    pub version: Option<String>,
    /// Source-control reference.
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    /// Signing key identifier.
    #[serde(default)]
    pub gpg_key: Option<String>,
    /// Directory archives are built below.
    #[serde(default = "default_staging_root")]
    pub staging_root: Utf8PathBuf,
    /// Name of the archiving tool.
    #[serde(default = "default_archive_tool")]
    pub archive_tool: String,
    /// Per-platform archive sources, in build order.
    #[serde(default)]
    pub platform_repos: Vec<PlatformRepoEntry>,
    /// APT distribution codenames, in publish order.
    #[serde(default)]
    pub apt_releases: Vec<String>,
    /// YUM publish target.
    #[serde(default)]
    pub yum: Option<RepoTarget>,
    /// APT publish target.
    #[serde(default)]
    pub apt: Option<RepoTarget>,
    /// Upper bound for remote commands, in seconds.
    #[serde(default)]
    pub remote_timeout_secs: Option<u64>,
}

/// Connection and command details for one package repository.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RepoTarget {
    /// Repository name, e.g. `puppet5`.
    #[serde(default)]
    pub repo_name: Option<String>,
    /// Repository path on the host.
    #[serde(default)]
    pub repo_path: Option<String>,
    /// Host that serves the repository.
    #[serde(default)]
    pub repo_host: Option<String>,
    /// Public repository URL.
    #[serde(default)]
    pub repo_url: Option<String>,
    /// Remote command template.
    #[serde(default)]
    pub command: Option<String>,
}

fn default_staging_root() -> Utf8PathBuf {
    Utf8PathBuf::from("pkg")
}

fn default_archive_tool() -> String {
    "tar".to_owned()
}

impl BuildDefaults {
    /// Loads build defaults from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| PublishError::Config {
            path: path.to_owned(),
            reason: err.to_string(),
        })?;
        Self::parse(&text).map_err(|err| match err {
            PublishError::Config { reason, .. } => PublishError::Config {
                path: path.to_owned(),
                reason,
            },
            other => other,
        })
    }

    /// Parses build defaults from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Config`] if the text is not valid.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkg_publisher::config::BuildDefaults;
    ///
    /// let defaults = BuildDefaults::parse(r#"
    ///     project = "puppet-agent"
    ///     version = "5.3.1"
    ///     apt_releases = ["stretch", "xenial"]
    /// "#)?;
    /// assert_eq!(defaults.staging_root.as_str(), "pkg");
    /// # Ok::<(), pkg_publisher::error::PublishError>(())
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| PublishError::Config {
            path: Utf8PathBuf::from("<inline>"),
            reason: err.to_string(),
        })
    }

    /// Applies environment overrides captured for this invocation.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &EnvOverrides) -> Self {
        if let Some(key) = &overrides.gpg_key {
            self.gpg_key = Some(key.clone());
        }
        self
    }
}

impl VersionProvider for BuildDefaults {
    fn project(&self) -> String {
        self.project.clone()
    }

    fn dot_version(&self) -> String {
        self.version.as_deref().map(dot_version).unwrap_or_default()
    }

    fn git_ref(&self) -> String {
        self.git_ref.clone().unwrap_or_default()
    }
}

impl PlatformRepoList for BuildDefaults {
    fn entries(&self) -> Vec<PlatformRepoEntry> {
        self.platform_repos.clone()
    }
}

impl AptReleaseList for BuildDefaults {
    fn releases(&self) -> Vec<String> {
        self.apt_releases.clone()
    }
}

/// Source of the missing-target policy flag.
pub trait FlagSource {
    /// Whether an archive source that matches no files is fatal.
    fn fail_on_missing_target(&self) -> bool;
}

/// Environment values captured once at the start of an invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// Value derived from `FAIL_ON_MISSING_TARGET`.
    pub fail_on_missing_target: bool,
    /// Value of `GPG_KEY`, when set and non-blank.
    pub gpg_key: Option<String>,
}

impl EnvOverrides {
    /// Reads the overrides from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the overrides through `lookup`.
    ///
    /// `FAIL_ON_MISSING_TARGET` is enabled only by the value `true`
    /// (case-insensitive, surrounding whitespace ignored).
    ///
    /// # Examples
    ///
    /// ```
    /// use pkg_publisher::config::EnvOverrides;
    ///
    /// let overrides = EnvOverrides::from_lookup(|name| match name {
    ///     "FAIL_ON_MISSING_TARGET" => Some("true".to_owned()),
    ///     _ => None,
    /// });
    /// assert!(overrides.fail_on_missing_target);
    /// assert!(overrides.gpg_key.is_none());
    /// ```
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fail_on_missing_target = lookup(FAIL_ON_MISSING_TARGET_ENV)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));
        let gpg_key = lookup(GPG_KEY_ENV).filter(|key| !key.trim().is_empty());
        Self {
            fail_on_missing_target,
            gpg_key,
        }
    }
}

impl FlagSource for EnvOverrides {
    fn fail_on_missing_target(&self) -> bool {
        self.fail_on_missing_target
    }
}

/// Settings consumed by the archive builder for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Whether an empty archive source aborts the build.
    pub fail_on_missing_target: bool,
    /// Directory archives are built below, relative to the base directory.
    pub staging_root: Utf8PathBuf,
    /// Name of the archiving tool.
    pub archive_tool: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            fail_on_missing_target: false,
            staging_root: default_staging_root(),
            archive_tool: default_archive_tool(),
        }
    }
}

impl BuildSettings {
    /// Captures the settings for one invocation.
    #[must_use]
    pub fn resolve(defaults: &BuildDefaults, flags: &dyn FlagSource) -> Self {
        Self {
            fail_on_missing_target: flags.fail_on_missing_target(),
            staging_root: defaults.staging_root.clone(),
            archive_tool: defaults.archive_tool.clone(),
        }
    }
}

impl FlagSource for BuildSettings {
    fn fail_on_missing_target(&self) -> bool {
        self.fail_on_missing_target
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
