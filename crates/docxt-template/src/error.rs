//! Error types for template processing.

use std::path::PathBuf;

/// Fatal error of a template operation.
///
/// Problems limited to one placeholder, image or non-essential part are
/// logged instead and never surface here.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TemplateError {
    /// The package has no main document part.
    #[error("package has no main document part `{0}`")]
    MissingMainDocument(&'static str),

    /// Reading or writing an extracted package failed.
    #[error("I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error while turning an image parameter into inline markup.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ImageError {
    /// Neither a path nor a URL was given.
    #[error("image has neither path nor url")]
    MissingSource,

    /// Reading the local image file failed.
    #[error("failed to read image {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Fetching the remote image failed.
    #[error("failed to download image")]
    Download(#[from] DownloadError),
}

/// Error while fetching a remote file.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DownloadError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed")]
    HttpRequest(#[from] ureq::Error),

    /// Server answered with a non-success status.
    #[error("HTTP error {status} for {url}")]
    HttpResponse { url: String, status: u16 },

    /// Writing the temporary file failed.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}
