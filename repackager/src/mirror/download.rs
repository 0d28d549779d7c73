//! Sequential wheel downloads with a pause between requests.

use super::error::MirrorError;
use super::index::{IndexClient, IndexFile};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Default pause between downloads.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// What a download run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Files written, in download order.
    pub downloaded: Vec<PathBuf>,
    /// URLs that could not be downloaded.
    pub failed: Vec<String>,
}

/// Download every file into `dest`, pausing `delay` between requests.
///
/// A failed download is logged and recorded; the remaining files are still
/// attempted.
///
/// # Errors
///
/// Returns [`MirrorError::Io`] if `dest` cannot be created.
pub fn download_wheels(
    client: &dyn IndexClient,
    files: &[IndexFile],
    dest: &Path,
    delay: Duration,
) -> Result<DownloadSummary, MirrorError> {
    fs::create_dir_all(dest).map_err(|source| MirrorError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    let mut summary = DownloadSummary::default();
    for (index, file) in files.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            thread::sleep(delay);
        }
        let target = dest.join(&file.filename);
        match client.download(&file.url, &target) {
            Ok(()) => {
                info!("downloaded {}", file.filename);
                summary.downloaded.push(target);
            }
            Err(err) => {
                warn!("failed to download {}: {err}", file.url);
                summary.failed.push(file.url.clone());
            }
        }
    }
    Ok(summary)
}
