//! Remote file fetching for image parameters.

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use ureq::Agent;

use crate::error::DownloadError;

/// Default timeout for a single download.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches a remote resource into a local temporary file.
///
/// The file is removed when the returned handle is dropped.
pub trait Downloader {
    /// Download `url`.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success status or when the
    /// temporary file cannot be written.
    fn download(&self, url: &str) -> Result<NamedTempFile, DownloadError>;
}

/// [`Downloader`] backed by a blocking HTTP agent.
pub struct HttpDownloader {
    agent: Agent,
    user_agent: Option<String>,
}

impl HttpDownloader {
    /// Create a downloader with the given global request timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            user_agent: None,
        }
    }

    /// Send a custom `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str) -> Result<NamedTempFile, DownloadError> {
        let mut request = self.agent.get(url);
        if let Some(user_agent) = &self.user_agent {
            request = request.header("User-Agent", user_agent);
        }
        let response = request.call()?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(DownloadError::HttpResponse {
                url: url.to_owned(),
                status,
            });
        }

        let bytes = response.into_body().read_to_vec()?;
        let mut file = NamedTempFile::new()?;
        file.write_all(&bytes)?;
        file.flush()?;
        tracing::debug!(url, bytes = bytes.len(), "Downloaded file");
        Ok(file)
    }
}
