//! Cross-build wheel repackager library.
//!
//! This crate rebuilds natively-built wheels so they can act as build-time
//! dependencies when cross-compiling packages: the headers and static
//! libraries a recipe declares as cross-build files are taken from the
//! cross-compiled wheel, and everything else is kept from the native wheel.
//! It is used by the `wheel-repackage` and `wheel-mirror` binaries and can be
//! driven programmatically for testing.
//!
//! # Modules
//!
//! - [`artefact`] - Wheel location, extraction, packaging and filename parsing
//! - [`batch`] - Per-recipe orchestration and outcome reporting
//! - [`cli`] - Command-line argument definitions
//! - [`command`] - External command execution with timeouts
//! - [`config`] - TOML configuration and CLI overrides
//! - [`error`] - Semantic error types for the repackaging transform
//! - [`fetch`] - Native wheel retrieval with bounded retries
//! - [`logging`] - Log subscriber installation for the binaries
//! - [`mirror`] - Package index mirroring to a separate channel
//! - [`output`] - Progress and summary text for stderr
//! - [`package_name`] - Semantic wrapper for package names
//! - [`recipe`] - Recipe loading from `meta.yaml` files
//! - [`repackage`] - The repackaging transform
//! - [`scratch`] - Scoped scratch directories

pub mod artefact;
pub mod batch;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod mirror;
pub mod output;
pub mod package_name;
pub mod recipe;
pub mod repackage;
pub mod scratch;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
