//! Package publisher library.
//!
//! This crate builds signed, per-platform repository archives and pushes
//! repository metadata updates to YUM and APT hosts through templated remote
//! commands. It is used by the `pkg-publisher` CLI binary and can be driven
//! programmatically with test doubles for every external collaborator.
//!
//! # Modules
//!
//! - [`archive`] - Signed archive creation inside the version directory
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Build defaults file and environment overrides
//! - [`error`] - Semantic error types
//! - [`exec`] - Local command execution
//! - [`fanout`] - Per-platform archive fan-out
//! - [`output`] - Progress and outcome formatting
//! - [`probe`] - Empty-source detection for archive globs
//! - [`publish`] - YUM, APT and generic repository publish flows
//! - [`remote`] - Remote command dispatch over ssh
//! - [`signing`] - Signing key lookup
//! - [`template`] - Placeholder substitution for command templates
//! - [`tool`] - Locating required command-line tools
//! - [`version`] - Version-directory resolution
//! - [`workdir`] - Scoped working-directory stack

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod fanout;
pub mod output;
pub mod probe;
pub mod publish;
pub mod remote;
pub mod signing;
pub mod template;
pub mod tool;
pub mod version;
pub mod workdir;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
