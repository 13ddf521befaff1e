//! Filesystem probing for archive sources.
//!
//! An archive source is a path or glob relative to the build directory. It
//! counts as an empty match when none of the paths it expands to is, or
//! contains, a regular file.

use crate::error::{PublishError, Result};
use camino::Utf8Path;
use glob::{MatchOptions, glob_with};
use std::path::Path;

/// Answers whether an archive source has anything to archive.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystemProbe {
    /// Returns `true` when `pattern`, resolved against `cwd`, matches no files.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::InvalidGlob`] if the pattern cannot be parsed.
    fn is_empty_match(&self, pattern: &str, cwd: &Utf8Path) -> Result<bool>;
}

/// Probe backed by the `glob` crate.
///
/// `**` matches any number of directory levels here, while the `sh -c` that
/// runs the archiving tool expands it like a single `*`. A source can
/// therefore pass this check and still give tar nothing to read.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobProbe;

impl FileSystemProbe for GlobProbe {
    fn is_empty_match(&self, pattern: &str, cwd: &Utf8Path) -> Result<bool> {
        let full = cwd.join(pattern);
        let options = MatchOptions {
            require_literal_leading_dot: true,
            ..MatchOptions::new()
        };
        let paths = glob_with(full.as_str(), options).map_err(|err| invalid_glob(pattern, &err))?;

        for entry in paths {
            let path = entry.map_err(|err| invalid_glob(pattern, &err))?;
            if contains_file(&path)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn contains_file(path: &Path) -> Result<bool> {
    if path.is_file() {
        return Ok(true);
    }
    if !path.is_dir() {
        return Ok(false);
    }
    for entry in std::fs::read_dir(path)? {
        if contains_file(&entry?.path())? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn invalid_glob(pattern: &str, err: &dyn std::fmt::Display) -> PublishError {
    PublishError::InvalidGlob {
        pattern: pattern.to_owned(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    struct Tree {
        _temp: TempDir,
        root: Utf8PathBuf,
    }

    #[fixture]
    fn tree() -> Tree {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("utf-8 temp dir");
        fs::create_dir_all(root.join("repos/el/4/products/i386")).expect("el-4 dirs");
        fs::write(
            root.join("repos/el/4/products/i386/puppet-agent-5.0.0-1.el4.i386.rpm"),
            "rpm",
        )
        .expect("el-4 package");
        fs::create_dir_all(root.join("repos/el/5/products/i386")).expect("el-5 dirs");
        Tree { _temp: temp, root }
    }

    #[rstest]
    #[case::glob_with_packages("repos/el/4/**/i386", false)]
    #[case::glob_with_only_directories("repos/el/5/**/i386", true)]
    #[case::glob_with_no_matches("repos/el/6/**/i386", true)]
    #[case::plain_file("repos/el/4/products/i386/puppet-agent-5.0.0-1.el4.i386.rpm", false)]
    #[case::missing_plain_path("repos/sles", true)]
    fn detects_empty_matches(tree: Tree, #[case] pattern: &str, #[case] expected: bool) {
        let empty = GlobProbe
            .is_empty_match(pattern, &tree.root)
            .expect("probe succeeds");
        assert_eq!(empty, expected, "pattern {pattern}");
    }

    #[rstest]
    fn absolute_patterns_ignore_cwd(tree: Tree) {
        let pattern = tree.root.join("repos/el/4/**/i386");
        let empty = GlobProbe
            .is_empty_match(pattern.as_str(), Utf8Path::new("/nonexistent"))
            .expect("probe succeeds");
        assert!(!empty);
    }

    #[rstest]
    fn malformed_patterns_are_rejected(tree: Tree) {
        let err = GlobProbe
            .is_empty_match("repos/[el", &tree.root)
            .expect_err("pattern is malformed");
        assert!(matches!(err, PublishError::InvalidGlob { .. }));
    }
}
