//! Signing key lookup.

use crate::error::{PublishError, Result};

/// Provides the identifier of the key repositories are signed with.
#[cfg_attr(test, mockall::automock)]
pub trait SigningKeyProvider {
    /// Returns the current signing key identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::SigningKeyMissing`] if no key is configured.
    fn current_key(&self) -> Result<String>;
}

/// Signing key taken from the build defaults (after `GPG_KEY` overrides).
#[derive(Debug, Clone, Default)]
pub struct ConfiguredSigningKey {
    key: Option<String>,
}

impl ConfiguredSigningKey {
    /// Wraps an optional configured key.
    #[must_use]
    pub fn new(key: Option<String>) -> Self {
        Self { key }
    }
}

impl SigningKeyProvider for ConfiguredSigningKey {
    fn current_key(&self) -> Result<String> {
        self.key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_owned)
            .ok_or(PublishError::SigningKeyMissing)
    }
}
