//! Remote manifest retrieval.
//!
//! "Absent" and "failed" are distinct outcomes: `Ok(None)` means the target
//! has never been published to, `Err(_)` means its state is unknown.

use std::time::Duration;

use viewpub_core::{manifest_url, Manifest};

use crate::error::{http_err, SyncError};

/// Where the previously published manifest is read from.
pub trait ManifestSource {
    /// Fetch the last published manifest; `Ok(None)` when none exists yet.
    fn fetch(&self) -> Result<Option<Manifest>, SyncError>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}

/// Reads `<base_url>/views/manifest.json` over the public read path.
pub struct HttpManifestSource {
    agent: ureq::Agent,
    url: String,
}

impl HttpManifestSource {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            url: manifest_url(base_url),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ManifestSource for HttpManifestSource {
    fn fetch(&self) -> Result<Option<Manifest>, SyncError> {
        let response = match self.agent.get(&self.url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => {
                tracing::info!("no remote manifest at {}; first deployment", self.url);
                return Ok(None);
            }
            Err(err) => return Err(http_err(&self.url, err)),
        };

        let body = response.into_string().map_err(|e| SyncError::Transport {
            url: self.url.clone(),
            message: e.to_string(),
        })?;
        let manifest: Manifest =
            serde_json::from_str(&body).map_err(|source| SyncError::MalformedManifest {
                url: self.url.clone(),
                source,
            })?;
        tracing::info!(
            "remote manifest at {}: {} file(s), generated {}",
            self.url,
            manifest.files.len(),
            manifest.generated_at.to_rfc3339()
        );
        Ok(Some(manifest))
    }

    fn location(&self) -> String {
        self.url.clone()
    }
}

/// Source for targets with no readable published state; always "absent".
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemoteManifest;

impl ManifestSource for NoRemoteManifest {
    fn fetch(&self) -> Result<Option<Manifest>, SyncError> {
        Ok(None)
    }

    fn location(&self) -> String {
        "<none>".to_string()
    }
}
