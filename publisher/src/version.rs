//! Version-directory resolution.
//!
//! Archives are built inside `<project>/<version-or-ref>` below the staging
//! root. Which of the two identifiers names that directory is chosen by the
//! [`VersioningMode`] of the request.

use crate::error::{PublishError, Result};
use camino::Utf8PathBuf;
use std::fmt;
use std::str::FromStr;

/// Selects the identifier used for the version directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersioningMode {
    /// Use the source-control reference (e.g. a commit hash).
    Ref,
    /// Use the dotted release version.
    Version,
}

impl FromStr for VersioningMode {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ref" => Ok(Self::Ref),
            "version" => Ok(Self::Version),
            other => Err(PublishError::InvalidVersioningMode {
                mode: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for VersioningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ref => f.write_str("ref"),
            Self::Version => f.write_str("version"),
        }
    }
}

/// Source of project identity and version metadata.
#[cfg_attr(test, mockall::automock)]
pub trait VersionProvider {
    /// The project name, used as the first directory level.
    fn project(&self) -> String;

    /// The dotted version string, e.g. `1.1.1`.
    fn dot_version(&self) -> String;

    /// The source-control reference.
    fn git_ref(&self) -> String;
}

/// Converts a described version (`1.2.3-4-gabc`) into its dotted form.
///
/// # Examples
///
/// ```
/// use pkg_publisher::version::dot_version;
///
/// assert_eq!(dot_version("1.2.3"), "1.2.3");
/// assert_eq!(dot_version("1.2.3-4-gabc"), "1.2.3.4.gabc");
/// ```
#[must_use]
pub fn dot_version(version: &str) -> String {
    version.replace('-', ".")
}

/// Maps a versioning mode to the directory name it selects.
///
/// # Errors
///
/// Returns [`PublishError::EmptyVersion`] when the selected value is blank.
///
/// # Examples
///
/// ```
/// use pkg_publisher::version::{VersioningMode, resolve};
///
/// let dir = resolve(VersioningMode::Ref, "AAAAAAAAAAAAAAA", "1.1.1")?;
/// assert_eq!(dir, "AAAAAAAAAAAAAAA");
/// # Ok::<(), pkg_publisher::error::PublishError>(())
/// ```
pub fn resolve(mode: VersioningMode, git_ref: &str, dot_version: &str) -> Result<String> {
    let selected = match mode {
        VersioningMode::Ref => git_ref,
        VersioningMode::Version => dot_version,
    };
    if selected.trim().is_empty() {
        return Err(PublishError::EmptyVersion { mode });
    }
    Ok(selected.to_owned())
}

/// The `<project>/<version-or-ref>` pair for one archive build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTargetDir {
    /// Project name.
    pub project: String,
    /// Version or ref, depending on the mode.
    pub version_or_ref: String,
}

impl ResolvedTargetDir {
    /// Resolves the target directory from a version provider.
    ///
    /// Only the identifier selected by `mode` is read from the provider.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::EmptyVersion`] when the selected value is blank.
    pub fn from_provider(provider: &dyn VersionProvider, mode: VersioningMode) -> Result<Self> {
        let project = provider.project();
        let version_or_ref = match mode {
            VersioningMode::Ref => resolve(mode, &provider.git_ref(), "")?,
            VersioningMode::Version => resolve(mode, "", &provider.dot_version())?,
        };
        Ok(Self {
            project,
            version_or_ref,
        })
    }

    /// Path of the target directory relative to the staging root.
    #[must_use]
    pub fn relative_path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(&self.project).join(&self.version_or_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::reference("ref", VersioningMode::Ref)]
    #[case::version("version", VersioningMode::Version)]
    fn parses_known_modes(#[case] raw: &str, #[case] expected: VersioningMode) {
        assert_eq!(raw.parse::<VersioningMode>().ok(), Some(expected));
        assert_eq!(expected.to_string(), raw);
    }

    #[rstest]
    #[case::unknown("tag")]
    #[case::wrong_case("Version")]
    #[case::blank("")]
    fn rejects_unknown_modes(#[case] raw: &str) {
        let err = raw.parse::<VersioningMode>().expect_err("mode should be rejected");
        assert!(matches!(
            err,
            PublishError::InvalidVersioningMode { ref mode } if mode == raw
        ));
    }

    #[test]
    fn version_mode_returns_dot_version_exactly() {
        let dir = resolve(VersioningMode::Version, "AAAAAAAAAAAAAAA", "1.1.1").expect("resolves");
        assert_eq!(dir, "1.1.1");
    }

    #[test]
    fn ref_mode_returns_ref_exactly() {
        let dir = resolve(VersioningMode::Ref, "AAAAAAAAAAAAAAA", "1.1.1").expect("resolves");
        assert_eq!(dir, "AAAAAAAAAAAAAAA");
    }

    #[test]
    fn resolution_is_idempotent() {
        let first = resolve(VersioningMode::Version, "abc", "2.0.0").expect("resolves");
        let second = resolve(VersioningMode::Version, "abc", "2.0.0").expect("resolves");
        assert_eq!(first, second);
    }

    #[test]
    fn blank_ref_is_rejected() {
        let err = resolve(VersioningMode::Ref, "  ", "1.1.1").expect_err("blank ref");
        assert!(matches!(
            err,
            PublishError::EmptyVersion {
                mode: VersioningMode::Ref
            }
        ));
    }

    #[test]
    fn from_provider_reads_only_the_selected_identifier() {
        let mut provider = MockVersionProvider::new();
        provider
            .expect_project()
            .times(1)
            .return_const("project".to_owned());
        provider
            .expect_git_ref()
            .times(1)
            .return_const("AAAAAAAAAAAAAAA".to_owned());
        provider.expect_dot_version().never();

        let dir = ResolvedTargetDir::from_provider(&provider, VersioningMode::Ref)
            .expect("resolves");
        assert_eq!(dir.relative_path(), Utf8PathBuf::from("project/AAAAAAAAAAAAAAA"));
    }

    #[test]
    fn dot_version_replaces_every_dash() {
        assert_eq!(dot_version("5.3.1-12-g1234abc"), "5.3.1.12.g1234abc");
    }
}
