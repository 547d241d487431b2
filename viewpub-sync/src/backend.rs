//! Upload backends.
//!
//! The provider is resolved once, in [`from_config`]; the deployer only ever
//! sees a `dyn UploadBackend`.

use std::path::Path;

use viewpub_core::{Manifest, ManifestEntry, Provider, PublishConfig};

use crate::error::SyncError;
use crate::object_store::ObjectStoreBackend;

/// Pushes views and the manifest to a publish target.
///
/// `upload` must stop at the first failing file and report it; the deployer
/// relies on that to never call `publish_manifest` after a partial upload.
pub trait UploadBackend {
    /// Provider identifier reported in results.
    fn provider(&self) -> &str;

    /// Upload each entry's file from `dir`, in order.
    fn upload(&self, dir: &Path, files: &[ManifestEntry]) -> Result<(), SyncError>;

    /// Replace the published manifest.
    fn publish_manifest(&self, manifest: &Manifest) -> Result<(), SyncError>;
}

/// Backend for views served straight from the local directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDevBackend;

impl UploadBackend for LocalDevBackend {
    fn provider(&self) -> &str {
        Provider::LocalDev.as_str()
    }

    fn upload(&self, dir: &Path, files: &[ManifestEntry]) -> Result<(), SyncError> {
        tracing::debug!(
            "local_dev: {} file(s) already served from {}",
            files.len(),
            dir.display()
        );
        Ok(())
    }

    fn publish_manifest(&self, manifest: &Manifest) -> Result<(), SyncError> {
        tracing::debug!("local_dev: manifest with {} file(s) not published", manifest.total_files);
        Ok(())
    }
}

/// Build the backend named by `config.provider`.
///
/// Object-store providers fail here, before any network call, when a
/// credential is missing.
pub fn from_config(config: &PublishConfig) -> Result<Box<dyn UploadBackend>, SyncError> {
    let provider = config.provider()?;
    match provider {
        Provider::LocalDev => Ok(Box::new(LocalDevBackend)),
        Provider::R2 | Provider::S3 => {
            let credentials = config.object_store.require(provider)?;
            Ok(Box::new(ObjectStoreBackend::new(
                provider,
                credentials,
                config.upload_timeout(),
                config.cache_max_age_secs,
            )?))
        }
    }
}
