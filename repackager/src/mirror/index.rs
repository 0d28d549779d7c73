//! Package index access.
//!
//! Project pages are fetched in the JSON form of the simple repository API:
//! `GET {index}{package}/` with `Accept: application/vnd.pypi.simple.v1+json`
//! returns the project's `versions` and `files`.

use super::error::MirrorError;
use log::debug;
use serde::Deserialize;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Default index base URL.
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/simple/";

/// Media type of JSON project pages.
pub const SIMPLE_JSON_CONTENT_TYPE: &str = "application/vnd.pypi.simple.v1+json";

/// Default timeout for index requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// One file listed on a project page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexFile {
    /// The distribution filename.
    pub filename: String,
    /// Where to download it from.
    pub url: String,
}

/// A project page, reduced to the fields the mirror reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectPage {
    /// Every published version.
    #[serde(default)]
    pub versions: Vec<String>,
    /// Every published file, oldest first.
    pub files: Vec<IndexFile>,
}

/// HTTP access to a package index.
///
/// # Examples
///
/// ```no_run
/// use wheel_repackager::mirror::index::{HttpIndexClient, fetch_project, DEFAULT_INDEX_URL};
///
/// let client = HttpIndexClient::default();
/// let page = fetch_project(&client, DEFAULT_INDEX_URL, "numpy")?;
/// assert!(!page.files.is_empty());
/// # Ok::<(), wheel_repackager::mirror::error::MirrorError>(())
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait IndexClient {
    /// Fetch a JSON project page as text.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::NotFound`] on HTTP 404 and
    /// [`MirrorError::Http`] on any other failure.
    fn get_project_page(&self, url: &str) -> Result<String, MirrorError>;

    /// Download `url` to the file `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError`] if the request or the file write fails.
    fn download(&self, url: &str, dest: &Path) -> Result<(), MirrorError>;
}

/// [`IndexClient`] backed by a `ureq` agent.
///
/// The agent is owned by the client, so connections are reused across every
/// request made through it.
#[derive(Clone)]
pub struct HttpIndexClient {
    agent: ureq::Agent,
}

impl HttpIndexClient {
    /// Create a client whose requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for HttpIndexClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl IndexClient for HttpIndexClient {
    fn get_project_page(&self, url: &str) -> Result<String, MirrorError> {
        let response = self
            .agent
            .get(url)
            .header("Accept", SIMPLE_JSON_CONTENT_TYPE)
            .call()
            .map_err(|err| map_ureq_error(url, &err))?;
        response
            .into_body()
            .read_to_string()
            .map_err(|err| map_ureq_error(url, &err))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), MirrorError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|err| map_ureq_error(url, &err))?;

        let io_error = |source: io::Error| MirrorError::Io {
            path: dest.to_path_buf(),
            source,
        };
        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        let mut staging = tempfile::Builder::new()
            .prefix(".wheel-mirror-")
            .suffix(".part")
            .tempfile_in(parent)
            .map_err(io_error)?;
        io::copy(&mut response.into_body().as_reader(), staging.as_file_mut()).map_err(io_error)?;
        staging
            .persist(dest)
            .map_err(|err| io_error(err.error))?;
        Ok(())
    }
}

/// Map a ureq error to a [`MirrorError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> MirrorError {
    match err {
        ureq::Error::StatusCode(404) => MirrorError::NotFound {
            url: url.to_owned(),
        },
        other => MirrorError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

/// URL of the project page for `package` below `index_url`.
///
/// # Examples
///
/// ```
/// use wheel_repackager::mirror::index::project_url;
///
/// assert_eq!(project_url("https://pypi.org/simple", "numpy"), "https://pypi.org/simple/numpy/");
/// assert_eq!(project_url("https://pypi.org/simple/", "numpy"), "https://pypi.org/simple/numpy/");
/// ```
#[must_use]
pub fn project_url(index_url: &str, package: &str) -> String {
    format!("{}/{package}/", index_url.trim_end_matches('/'))
}

/// Fetch and decode the project page for `package`.
///
/// # Errors
///
/// Returns the client's error, or [`MirrorError::InvalidProjectPage`] if
/// the body is not a project page.
pub fn fetch_project(
    client: &dyn IndexClient,
    index_url: &str,
    package: &str,
) -> Result<ProjectPage, MirrorError> {
    let url = project_url(index_url, package);
    debug!("fetching project page {url}");
    let body = client.get_project_page(&url)?;
    serde_json::from_str(&body).map_err(|source| MirrorError::InvalidProjectPage { url, source })
}
