//! S3-compatible object store backend (Cloudflare R2, AWS S3, MinIO).
//!
//! Objects are written path-style to `<endpoint>/<bucket>/views/<filename>`
//! through `object_store`'s S3 client. The backend is synchronous; each call
//! blocks on a private current-thread runtime.

use std::fs;
use std::path::Path as FsPath;
use std::sync::Arc;
use std::time::Duration;

use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, ClientOptions, ObjectStore, PutOptions, PutPayload, RetryConfig,
};

use viewpub_core::{
    Manifest, ManifestEntry, ObjectStoreCredentials, Provider, JSON_CONTENT_TYPE,
    MANIFEST_FILENAME, VIEWS_PREFIX,
};

use crate::backend::UploadBackend;
use crate::error::{io_err, SyncError};
use crate::hasher::hash_bytes;

const MANIFEST_CACHE_CONTROL: &str = "no-cache";

/// Upload backend for S3-compatible stores.
pub struct ObjectStoreBackend {
    provider: Provider,
    bucket: String,
    inner: Arc<dyn ObjectStore>,
    runtime: tokio::runtime::Runtime,
    view_cache_control: String,
}

impl ObjectStoreBackend {
    pub fn new(
        provider: Provider,
        credentials: ObjectStoreCredentials,
        timeout: Duration,
        cache_max_age_secs: u64,
    ) -> Result<Self, SyncError> {
        // A failed PUT aborts the deploy; retrying is the caller's decision.
        let retry = RetryConfig {
            max_retries: 0,
            ..RetryConfig::default()
        };
        let store = AmazonS3Builder::new()
            .with_endpoint(&credentials.endpoint)
            .with_bucket_name(&credentials.bucket)
            .with_region(&credentials.region)
            .with_access_key_id(&credentials.access_key_id)
            .with_secret_access_key(&credentials.secret_access_key)
            .with_virtual_hosted_style_request(false)
            .with_retry(retry)
            .with_client_options(ClientOptions::new().with_timeout(timeout))
            .with_allow_http(true)
            .build()
            .map_err(|source| SyncError::ObjectStore {
                key: credentials.bucket.clone(),
                source,
            })?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SyncError::Runtime)?;

        Ok(Self {
            provider,
            bucket: credentials.bucket,
            inner: Arc::new(store),
            runtime,
            view_cache_control: format!("public, max-age={cache_max_age_secs}"),
        })
    }

    /// `views/<filename>` inside the bucket.
    fn object_key(filename: &str) -> Path {
        Path::from(format!("{VIEWS_PREFIX}/{filename}"))
    }

    fn put_object(
        &self,
        filename: &str,
        body: Vec<u8>,
        cache_control: &str,
    ) -> Result<(), SyncError> {
        let key = Self::object_key(filename);
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, JSON_CONTENT_TYPE.into());
        attributes.insert(Attribute::CacheControl, cache_control.to_string().into());
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };

        self.runtime
            .block_on(self.inner.put_opts(&key, PutPayload::from(body), opts))
            .map_err(|source| SyncError::ObjectStore {
                key: key.to_string(),
                source,
            })?;
        Ok(())
    }

    fn upload_one(&self, dir: &FsPath, entry: &ManifestEntry) -> Result<(), SyncError> {
        let path = dir.join(&entry.filename);
        let body = fs::read(&path).map_err(|e| io_err(&path, e))?;
        let found = hash_bytes(&body);
        if found != entry.hash {
            return Err(SyncError::ContentChanged {
                filename: entry.filename.clone(),
                expected: entry.hash.clone(),
                found,
            });
        }
        self.put_object(&entry.filename, body, &self.view_cache_control)
    }
}

impl UploadBackend for ObjectStoreBackend {
    fn provider(&self) -> &str {
        self.provider.as_str()
    }

    fn upload(&self, dir: &FsPath, files: &[ManifestEntry]) -> Result<(), SyncError> {
        for (index, entry) in files.iter().enumerate() {
            if let Err(source) = self.upload_one(dir, entry) {
                tracing::warn!("upload of {} failed: {source}", entry.filename);
                return Err(SyncError::UploadAborted {
                    filename: entry.filename.clone(),
                    uploaded: index,
                    remaining: files.len() - index - 1,
                    source: Box::new(source),
                });
            }
            tracing::info!(
                "uploaded {}/{VIEWS_PREFIX}/{} ({} bytes)",
                self.bucket,
                entry.filename,
                entry.size
            );
        }
        Ok(())
    }

    fn publish_manifest(&self, manifest: &Manifest) -> Result<(), SyncError> {
        let body = serde_json::to_vec_pretty(manifest)?;
        self.put_object(MANIFEST_FILENAME, body, MANIFEST_CACHE_CONTROL)?;
        tracing::info!(
            "published manifest ({} file(s)) to {}/{VIEWS_PREFIX}/{MANIFEST_FILENAME}",
            manifest.total_files,
            self.bucket
        );
        Ok(())
    }
}
