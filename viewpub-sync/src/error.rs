//! Error types for viewpub-sync.

use std::path::PathBuf;

use thiserror::Error;

use viewpub_core::ConfigError;

/// All errors that can arise from building, diffing, and publishing views.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Bad or incomplete publish configuration; never retried.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (manifest encoding).
    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A remote manifest was served but could not be parsed.
    #[error("malformed manifest at {url}: {source}")]
    MalformedManifest {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The target answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    /// The request never produced an HTTP response (DNS, connect, timeout, TLS).
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The object store rejected or never answered a request for `key`.
    #[error("object store request for {key} failed: {source}")]
    ObjectStore {
        key: String,
        #[source]
        source: object_store::Error,
    },

    /// The blocking runtime that drives object store requests could not start.
    #[error("failed to start I/O runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// A view's bytes no longer match the hash recorded in the local manifest.
    #[error("{filename} changed on disk during deploy (expected {expected}, found {found})")]
    ContentChanged {
        filename: String,
        expected: String,
        found: String,
    },

    /// One file failed to upload; the remaining files were not attempted.
    #[error("upload aborted at {filename} after {uploaded} file(s), {remaining} not attempted: {source}")]
    UploadAborted {
        filename: String,
        uploaded: usize,
        remaining: usize,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    /// Files successfully uploaded before this error, if it aborted an upload.
    pub fn uploaded_before_abort(&self) -> usize {
        match self {
            SyncError::UploadAborted { uploaded, .. } => *uploaded,
            _ => 0,
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Map a `ureq` failure onto [`SyncError`], keeping the status code when
/// the target did answer.
pub(crate) fn http_err(url: &str, err: ureq::Error) -> SyncError {
    match err {
        ureq::Error::Status(status, _) => SyncError::Http {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(transport) => SyncError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}
