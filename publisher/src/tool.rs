//! Locating required command-line tools.

use crate::error::{PublishError, Result};
use log::debug;

/// Finds executables by name.
#[cfg_attr(test, mockall::automock)]
pub trait ToolLocator {
    /// Returns the path of `name` as it should appear in a command line.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::ToolNotFound`] if the tool is unavailable.
    fn find(&self, name: &str) -> Result<String>;
}

/// Searches `PATH` using the `which` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathToolLocator;

impl ToolLocator for PathToolLocator {
    fn find(&self, name: &str) -> Result<String> {
        let path = which::which(name).map_err(|_| PublishError::ToolNotFound {
            tool: name.to_owned(),
        })?;
        let found = path.to_string_lossy().into_owned();
        debug!("found {name} at {found}");
        Ok(found)
    }
}
