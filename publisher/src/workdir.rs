//! Scoped working directories.
//!
//! Archive builds run in a nested directory (`pkg/<project>/<version>`). The
//! process-wide current directory is never changed; instead a
//! [`WorkingDir`] keeps a stack of directories and each [`WorkingDir::enter`]
//! returns a guard that pops its entry when dropped. The directory at the top
//! of the stack is handed to subprocesses explicitly, so concurrent builds in
//! one process cannot observe each other's directory changes.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::ops::{Deref, DerefMut};

/// A stack of nested working directories rooted at a base directory.
#[derive(Debug, Clone)]
pub struct WorkingDir {
    base: Utf8PathBuf,
    stack: Vec<Utf8PathBuf>,
}

impl WorkingDir {
    /// Creates a working directory positioned at `base`.
    #[must_use]
    pub fn new(base: impl Into<Utf8PathBuf>) -> Self {
        Self {
            base: base.into(),
            stack: Vec::new(),
        }
    }

    /// The directory commands should currently run in.
    #[must_use]
    pub fn current(&self) -> &Utf8Path {
        self.stack.last().unwrap_or(&self.base)
    }

    /// Number of scopes currently entered.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Enters `dir` relative to the current directory.
    ///
    /// The returned guard restores the previous directory when dropped,
    /// including when the caller returns early with an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkg_publisher::workdir::WorkingDir;
    ///
    /// let mut wd = WorkingDir::new("/srv/build");
    /// {
    ///     let mut pkg = wd.enter("pkg");
    ///     let release = pkg.enter("project/1.1.1");
    ///     assert_eq!(release.current().as_str(), "/srv/build/pkg/project/1.1.1");
    /// }
    /// assert_eq!(wd.current().as_str(), "/srv/build");
    /// ```
    pub fn enter(&mut self, dir: impl AsRef<Utf8Path>) -> DirScope<'_> {
        let next = self.current().join(dir.as_ref());
        debug!("entering {next}");
        self.stack.push(next);
        DirScope { dir: self }
    }
}

/// Guard returned by [`WorkingDir::enter`].
///
/// Dereferences to the underlying [`WorkingDir`] so scopes can be nested.
#[derive(Debug)]
pub struct DirScope<'a> {
    dir: &'a mut WorkingDir,
}

impl Deref for DirScope<'_> {
    type Target = WorkingDir;

    fn deref(&self) -> &WorkingDir {
        self.dir
    }
}

impl DerefMut for DirScope<'_> {
    fn deref_mut(&mut self) -> &mut WorkingDir {
        self.dir
    }
}

impl Drop for DirScope<'_> {
    fn drop(&mut self) {
        if let Some(left) = self.dir.stack.pop() {
            debug!("leaving {left}");
        }
    }
}
