//! YUM and APT repository publishing.
//!
//! A publish step substitutes repository details into a configured command
//! template and runs the result on the repository host. Every flow fetches
//! the signing key first, so a publish never starts without one.

use crate::error::{PublishError, Result};
use crate::remote::RemoteExecutor;
use crate::signing::SigningKeyProvider;
use crate::template::{
    APT_PLATFORMS, GPG_KEY, REPO_HOST, REPO_NAME, REPO_PATH, REPO_URL, argument_required,
    substitute, unresolved_placeholders,
};
use log::{debug, info, warn};

/// Ordered source of APT distribution codenames.
#[cfg_attr(test, mockall::automock)]
pub trait AptReleaseList {
    /// The configured releases, in publish order.
    fn releases(&self) -> Vec<String>;
}

/// Optional repository details for [`RepoPublisher::update_repo`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishParams {
    /// Repository name.
    pub repo_name: Option<String>,
    /// Repository path on the host.
    pub repo_path: Option<String>,
    /// Host that serves the repository.
    pub repo_host: Option<String>,
    /// Public repository URL.
    pub repo_url: Option<String>,
}

impl PublishParams {
    fn value(&self, argument: &str) -> Option<&str> {
        let value = match argument {
            "repo_name" => self.repo_name.as_deref(),
            "repo_path" => self.repo_path.as_deref(),
            "repo_host" => self.repo_host.as_deref(),
            "repo_url" => self.repo_url.as_deref(),
            _ => None,
        };
        present(value)
    }
}

const TEMPLATE_ARGUMENTS: [&str; 4] = ["repo_name", "repo_path", "repo_host", "repo_url"];

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn required<'v>(field: &'static str, value: Option<&'v str>) -> Result<&'v str> {
    present(value).ok_or(PublishError::InvalidParameters { field })
}

/// Publishes repository metadata through a [`RemoteExecutor`].
pub struct RepoPublisher<'a> {
    signing: &'a dyn SigningKeyProvider,
    remote: &'a dyn RemoteExecutor,
    releases: &'a dyn AptReleaseList,
}

impl<'a> RepoPublisher<'a> {
    /// Creates a publisher from its collaborators.
    #[must_use]
    pub fn new(
        signing: &'a dyn SigningKeyProvider,
        remote: &'a dyn RemoteExecutor,
        releases: &'a dyn AptReleaseList,
    ) -> Self {
        Self {
            signing,
            remote,
            releases,
        }
    }

    /// Regenerates a YUM repository and returns the dispatched command.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::InvalidParameters`] if any argument is absent
    /// or blank, [`PublishError::SigningKeyMissing`] without a signing key,
    /// or the remote executor's error.
    pub fn update_yum_repo(
        &self,
        repo_name: Option<&str>,
        repo_path: Option<&str>,
        repo_host: Option<&str>,
        command: Option<&str>,
    ) -> Result<String> {
        let repo_name = required("repo_name", repo_name)?;
        let repo_path = required("repo_path", repo_path)?;
        let repo_host = required("repo_host", repo_host)?;
        let template = required("command", command)?;

        self.signing.current_key()?;
        let command = substitute(template, &[(REPO_NAME, repo_name), (REPO_PATH, repo_path)]);
        self.dispatch(repo_host, command)
    }

    /// Regenerates an APT repository for every configured release and
    /// returns the dispatched command.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::InvalidParameters`] if any argument is absent
    /// or blank, [`PublishError::SigningKeyMissing`] without a signing key,
    /// or the remote executor's error.
    pub fn update_apt_repo(
        &self,
        repo_name: Option<&str>,
        repo_path: Option<&str>,
        repo_host: Option<&str>,
        repo_url: Option<&str>,
        command: Option<&str>,
    ) -> Result<String> {
        required("repo_name", repo_name)?;
        required("repo_path", repo_path)?;
        let repo_host = required("repo_host", repo_host)?;
        let repo_url = required("repo_url", repo_url)?;
        let template = required("command", command)?;

        self.signing.current_key()?;
        let platforms = self.releases.releases().join(" ");
        let command = substitute(
            template,
            &[(APT_PLATFORMS, platforms.as_str()), (REPO_URL, repo_url)],
        );
        self.dispatch(repo_host, command)
    }

    /// Substitutes every known placeholder into `template` and runs it on
    /// `remote_host`.
    ///
    /// Only the repository details the template actually uses are required.
    /// The signing key is looked up only when the template contains
    /// `__GPG_KEY__`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::MissingRequiredArgument`] for the first
    /// placeholder without a value, [`PublishError::InvalidParameters`] for a
    /// blank host or template, or the signing and remote errors.
    pub fn update_repo(
        &self,
        remote_host: &str,
        template: &str,
        params: &PublishParams,
    ) -> Result<String> {
        let remote_host = required("remote_host", Some(remote_host))?;
        let template = required("command", Some(template))?;

        for argument in TEMPLATE_ARGUMENTS {
            if argument_required(argument, template) && params.value(argument).is_none() {
                return Err(PublishError::MissingRequiredArgument { argument });
            }
        }

        let gpg_key = if template.contains(GPG_KEY) {
            self.signing.current_key()?
        } else {
            String::new()
        };
        let platforms = self.releases.releases().join(" ");
        let value = |argument: &str| params.value(argument).unwrap_or_default();

        let command = substitute(
            template,
            &[
                (REPO_NAME, value("repo_name")),
                (REPO_PATH, value("repo_path")),
                (REPO_HOST, value("repo_host")),
                (REPO_URL, value("repo_url")),
                (APT_PLATFORMS, platforms.as_str()),
                (GPG_KEY, gpg_key.as_str()),
            ],
        );
        self.dispatch(remote_host, command)
    }

    fn dispatch(&self, host: &str, command: String) -> Result<String> {
        let leftover = unresolved_placeholders(&command);
        if !leftover.is_empty() {
            warn!(
                "command for {host} still contains placeholders: {}",
                leftover.join(", ")
            );
        }
        debug!("dispatching to {host}: {command}");
        self.remote.remote_command(host, &command)?;
        info!("updated repository on {host}");
        Ok(command)
    }
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod tests;
