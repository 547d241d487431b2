//! viewpub core library: manifest and result types plus publish configuration.
//!
//! Public API surface:
//! - [`types`]: manifests and the deploy / validation result records
//! - [`config`]: [`PublishConfig`] loading and environment resolution
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    ObjectStoreCredentials, ObjectStoreSettings, Provider, PublishConfig, DEFAULT_VIEWS_DIR,
};
pub use error::ConfigError;
pub use types::{
    manifest_url, view_url, DeployMode, DeploymentResult, FileCheck, Manifest, ManifestEntry,
    ValidationResult, JSON_CONTENT_TYPE, MANIFEST_FILENAME, MANIFEST_VERSION, VIEWS_PREFIX,
};
