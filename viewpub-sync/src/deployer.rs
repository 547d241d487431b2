//! Deploy orchestration.
//!
//! ## Stages
//!
//! ```text
//! Idle → ManifestBuilt → RemoteChecked → Diffed ─┬→ Uploading → ManifestPublished
//!                                                └→ DryRunComplete
//! any stage ──error──→ Failed
//! ```
//!
//! The manifest is the commit point: it is published only after every
//! selected view uploaded. A failed remote fetch is not fatal; it downgrades
//! to "nothing is known remotely" and everything is uploaded.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use viewpub_core::{DeployMode, DeploymentResult, Manifest, ManifestEntry, PublishConfig};

use crate::backend::{self, UploadBackend};
use crate::diff::{diff_manifests, remote_only};
use crate::error::SyncError;
use crate::manifest::build_manifest;
use crate::remote::{HttpManifestSource, ManifestSource, NoRemoteManifest};

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Position of a deploy run in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStage {
    Idle,
    ManifestBuilt,
    RemoteChecked,
    Diffed,
    Uploading,
    ManifestPublished,
    DryRunComplete,
    Failed,
}

impl fmt::Display for DeployStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeployStage::Idle => "idle",
            DeployStage::ManifestBuilt => "manifest built",
            DeployStage::RemoteChecked => "remote checked",
            DeployStage::Diffed => "diffed",
            DeployStage::Uploading => "uploading",
            DeployStage::ManifestPublished => "manifest published",
            DeployStage::DryRunComplete => "dry run complete",
            DeployStage::Failed => "failed",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Run bookkeeping
// ---------------------------------------------------------------------------

struct Run {
    stage: DeployStage,
    started: Instant,
    result: DeploymentResult,
}

impl Run {
    fn new(provider: &str, mode: DeployMode) -> Self {
        Self {
            stage: DeployStage::Idle,
            started: Instant::now(),
            result: DeploymentResult {
                success: false,
                provider: provider.to_string(),
                mode,
                files_processed: 0,
                files_uploaded: 0,
                files_skipped: 0,
                total_size_bytes: 0,
                duration_seconds: 0.0,
                message: String::new(),
                upload_set: Vec::new(),
                errors: Vec::new(),
                warnings: Vec::new(),
            },
        }
    }

    fn advance(&mut self, next: DeployStage) {
        tracing::debug!("deploy: {} -> {}", self.stage, next);
        self.stage = next;
    }

    /// Terminal failure: record the error against the stage it interrupted.
    fn fail(mut self, action: &str, err: SyncError) -> DeploymentResult {
        let message = format!("{action} failed: {err}");
        tracing::warn!("deploy failed while {}: {err}", self.stage);
        self.advance(DeployStage::Failed);
        self.result.success = false;
        self.result.errors.push(message.clone());
        self.result.message = message;
        self.finish()
    }

    fn succeed(mut self, terminal: DeployStage, message: String) -> DeploymentResult {
        self.advance(terminal);
        self.result.success = true;
        self.result.message = message;
        self.finish()
    }

    fn finish(mut self) -> DeploymentResult {
        self.result.duration_seconds = self.started.elapsed().as_secs_f64();
        self.result
    }
}

fn total_bytes(entries: &[ManifestEntry]) -> u64 {
    entries.iter().map(|e| e.size).sum()
}

// ---------------------------------------------------------------------------
// Deployer
// ---------------------------------------------------------------------------

/// Builds, diffs and publishes one view directory.
pub struct Deployer {
    views_dir: PathBuf,
    backend: Box<dyn UploadBackend>,
    source: Box<dyn ManifestSource>,
}

impl Deployer {
    pub fn new(
        views_dir: impl Into<PathBuf>,
        backend: Box<dyn UploadBackend>,
        source: Box<dyn ManifestSource>,
    ) -> Self {
        Self {
            views_dir: views_dir.into(),
            backend,
            source,
        }
    }

    /// Wire a deployer from configuration.
    ///
    /// Object-store providers need `base_url` to read back the published
    /// manifest; `local_dev` without one treats remote state as absent.
    pub fn from_config(config: &PublishConfig) -> Result<Self, SyncError> {
        let provider = config.provider()?;
        let backend = backend::from_config(config)?;
        let source: Box<dyn ManifestSource> = match config.base_url() {
            Ok(base_url) => Box::new(HttpManifestSource::new(base_url, config.fetch_timeout())),
            Err(err) if provider.is_object_store() => return Err(err.into()),
            Err(_) => Box::new(NoRemoteManifest),
        };
        Ok(Self::new(config.views_dir(), backend, source))
    }

    pub fn views_dir(&self) -> &Path {
        &self.views_dir
    }

    pub fn provider(&self) -> &str {
        self.backend.provider()
    }

    /// Run one deploy cycle. Never panics and never returns early without a
    /// result: every failure is folded into the returned record.
    pub fn deploy(&self, mode: DeployMode) -> DeploymentResult {
        let mut run = Run::new(self.backend.provider(), mode);
        tracing::info!(
            "deploy ({mode}) of {} via {}",
            self.views_dir.display(),
            self.backend.provider()
        );

        let local = match build_manifest(&self.views_dir) {
            Ok(manifest) => manifest,
            Err(err) => return run.fail("building local manifest", err),
        };
        run.result.files_processed = local.total_files;
        run.advance(DeployStage::ManifestBuilt);

        let remote = self.check_remote(&mut run, &local);
        run.advance(DeployStage::RemoteChecked);

        let upload_set = diff_manifests(&local, remote.as_ref());
        run.result.upload_set = upload_set.iter().map(|e| e.filename.clone()).collect();
        run.result.files_uploaded = upload_set.len();
        run.result.files_skipped = local.total_files - upload_set.len();
        run.advance(DeployStage::Diffed);

        if mode.is_side_effect_free() {
            if mode == DeployMode::DryRun {
                run.result.total_size_bytes = total_bytes(&upload_set);
            }
            let message = format!(
                "{} of {} view(s) would be uploaded",
                upload_set.len(),
                local.total_files
            );
            return run.succeed(DeployStage::DryRunComplete, message);
        }

        self.publish(run, &local, &upload_set)
    }

    fn check_remote(&self, run: &mut Run, local: &Manifest) -> Option<Manifest> {
        match self.source.fetch() {
            Ok(Some(remote)) => {
                let stale = remote_only(local, &remote);
                if !stale.is_empty() {
                    tracing::info!(
                        "{} remote-only view(s) left in place: {}",
                        stale.len(),
                        stale.join(", ")
                    );
                }
                Some(remote)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(
                    "could not read remote manifest at {}: {err}; uploading everything",
                    self.source.location()
                );
                run.result.warnings.push(format!(
                    "remote manifest unavailable ({err}); treated as first deployment"
                ));
                None
            }
        }
    }

    fn publish(
        &self,
        mut run: Run,
        local: &Manifest,
        upload_set: &[ManifestEntry],
    ) -> DeploymentResult {
        run.advance(DeployStage::Uploading);
        if let Err(err) = self.backend.upload(&self.views_dir, upload_set) {
            let done = err.uploaded_before_abort().min(upload_set.len());
            run.result.files_uploaded = done;
            run.result.total_size_bytes = upload_set.iter().take(done).map(|e| e.size).sum();
            return run.fail("uploading views", err);
        }
        run.result.total_size_bytes = total_bytes(upload_set);

        if let Err(err) = self.backend.publish_manifest(local) {
            return run.fail("publishing manifest", err);
        }

        let message = if upload_set.is_empty() {
            format!("no changes; manifest republished ({} view(s))", local.total_files)
        } else {
            format!(
                "uploaded {} of {} view(s)",
                upload_set.len(),
                local.total_files
            )
        };
        run.succeed(DeployStage::ManifestPublished, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use viewpub_core::ObjectStoreSettings;

    #[test]
    fn object_store_without_base_url_is_a_config_error() {
        let config = PublishConfig {
            provider: Some("s3".to_string()),
            object_store: ObjectStoreSettings {
                access_key_id: Some("ak".to_string()),
                secret_access_key: Some("sk".to_string()),
                bucket: Some("views".to_string()),
                ..ObjectStoreSettings::default()
            },
            ..PublishConfig::default()
        };
        let err = Deployer::from_config(&config).err().expect("error");
        assert!(err.to_string().contains("base_url"), "got: {err}");
    }

    #[test]
    fn local_dev_without_base_url_uploads_everything() {
        let views = TempDir::new().unwrap();
        fs::write(views.path().join("a.json"), "{}").unwrap();
        let config = PublishConfig {
            views_dir: Some(views.path().to_path_buf()),
            ..PublishConfig::default()
        };
        let deployer = Deployer::from_config(&config).unwrap();
        let result = deployer.deploy(DeployMode::Publish);
        assert!(result.success, "{}", result.message);
        assert_eq!(result.provider, "local_dev");
        assert_eq!(result.files_uploaded, 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn stage_labels() {
        assert_eq!(DeployStage::DryRunComplete.to_string(), "dry run complete");
        assert_eq!(DeployStage::ManifestPublished.to_string(), "manifest published");
    }
}
