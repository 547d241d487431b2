//! # viewpub-sync
//!
//! Change detection and publishing for generated view files.
//!
//! [`build_manifest`] describes a local view directory, [`diff_manifests`]
//! compares it against the last published manifest, and [`Deployer`] drives
//! an [`UploadBackend`] through upload and the manifest commit.

pub mod backend;
pub mod deployer;
pub mod diff;
pub mod error;
pub mod hasher;
pub mod manifest;
pub mod object_store;
pub mod remote;

pub use backend::{LocalDevBackend, UploadBackend};
pub use deployer::{DeployStage, Deployer};
pub use diff::{diff_manifests, remote_only};
pub use error::SyncError;
pub use hasher::{hash_bytes, hash_file};
pub use manifest::build_manifest;
pub use object_store::ObjectStoreBackend;
pub use remote::{HttpManifestSource, ManifestSource, NoRemoteManifest};
