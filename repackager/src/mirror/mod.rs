//! Mirroring a release from a package index to a separate channel.
//!
//! The mirror reads a project's JSON page, keeps the wheels of one version
//! whose tags are worth distributing, downloads them one at a time, and
//! uploads the lot with the `anaconda` client.
//!
//! # Sub-modules
//!
//! - [`index`] - Project page retrieval behind the [`index::IndexClient`] seam.
//! - [`filter`] - Version and tag based wheel selection.
//! - [`download`] - Sequential downloads with a pause between requests.
//! - [`upload`] - Upload through the `anaconda` client.
//! - [`error`] - Error types for the mirror.

pub mod download;
pub mod error;
pub mod filter;
pub mod index;
pub mod upload;

use crate::command::CommandExecutor;
use download::{DownloadSummary, download_wheels};
use error::MirrorError;
use filter::{TagFilter, select_wheels};
use index::{IndexClient, fetch_project};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Inputs for one mirror run.
#[derive(Debug, Clone)]
pub struct MirrorRequest<'a> {
    /// Project name on the index.
    pub package: &'a str,
    /// Version to mirror.
    pub version: &'a str,
    /// Index base URL.
    pub index_url: &'a str,
    /// Directory receiving the downloads.
    pub dest: &'a Path,
    /// Pause between downloads.
    pub delay: Duration,
    /// Upload token; `None` skips the upload.
    pub token: Option<&'a str>,
    /// Download only.
    pub skip_upload: bool,
}

/// What a mirror run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    /// Number of wheels that passed the filter.
    pub selected: usize,
    /// Download results.
    pub downloads: DownloadSummary,
    /// Number of wheels uploaded, if the upload ran.
    pub uploaded: Option<usize>,
}

/// Default download directory for a release: `{package}-{version}`.
#[must_use]
pub fn default_dest(package: &str, version: &str) -> PathBuf {
    PathBuf::from(format!("{package}-{version}"))
}

/// Mirror one release.
///
/// Nothing is downloaded or uploaded when no wheel passes the filter.
///
/// # Errors
///
/// Returns [`MirrorError`] if the project page cannot be fetched, the
/// download directory cannot be created, or the upload fails. A missing
/// token is [`MirrorError::MissingToken`] unless `skip_upload` is set.
pub fn mirror_release(
    client: &dyn IndexClient,
    executor: &dyn CommandExecutor,
    request: &MirrorRequest<'_>,
) -> Result<MirrorReport, MirrorError> {
    let project = fetch_project(client, request.index_url, request.package)?;
    let wheels = select_wheels(&project, request.version, &TagFilter::default());
    if wheels.is_empty() {
        info!("no wheels found for {}=={}", request.package, request.version);
        return Ok(MirrorReport::default());
    }
    info!(
        "found {} wheel(s) for {}=={}",
        wheels.len(),
        request.package,
        request.version
    );

    let downloads = download_wheels(client, &wheels, request.dest, request.delay)?;
    let mut report = MirrorReport {
        selected: wheels.len(),
        downloads,
        uploaded: None,
    };
    if request.skip_upload {
        return Ok(report);
    }

    upload::check_client(executor)?;
    let token = request.token.ok_or(MirrorError::MissingToken)?;
    report.uploaded = Some(upload::upload_wheels(executor, request.dest, token)?);
    Ok(report)
}
