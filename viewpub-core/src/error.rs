//! Error types for viewpub-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or resolving publish configuration.
///
/// These are fatal and never retried: a run with a bad configuration must stop
/// before any network call is attempted.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An explicitly requested config file did not exist.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// `dirs::home_dir()` returned `None`, so we cannot locate `~/.viewpub/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The provider identifier is not one this build knows how to publish to.
    #[error("unknown provider '{0}'; expected: local_dev, r2, s3")]
    UnknownProvider(String),

    /// A credential required by an object-store provider was not configured.
    #[error("missing object store credential '{field}' (set it in the config file or via ${env})")]
    MissingCredential {
        field: &'static str,
        env: &'static str,
    },

    /// The base URL is required for the requested operation but was not set.
    #[error("base_url is not configured (set it in the config file or via $VIEWPUB_BASE_URL)")]
    MissingBaseUrl,
}
