//! Local manifest generation.
//!
//! Walks a flat view directory and describes every `*.json` file in it. Two
//! builds of an unchanged directory differ only in `generated_at`.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use viewpub_core::{Manifest, ManifestEntry, JSON_CONTENT_TYPE, MANIFEST_FILENAME};

use crate::error::{io_err, SyncError};
use crate::hasher::hash_file;

/// `generator` value stamped into manifests built by this crate.
pub fn generator() -> String {
    format!("viewpub/{}", env!("CARGO_PKG_VERSION"))
}

/// `true` for names that belong in a manifest.
///
/// The manifest itself is excluded so a directory that also hosts a copy of
/// the published manifest never lists it as a view.
pub fn is_view_file(name: &str) -> bool {
    name.ends_with(".json") && name != MANIFEST_FILENAME && !name.starts_with('.')
}

/// Build a manifest for `dir`.
///
/// A missing or unreadable directory yields an empty manifest. Failing to
/// stat or hash an individual view is an error.
pub fn build_manifest(dir: &Path) -> Result<Manifest, SyncError> {
    let listing = match fs::read_dir(dir) {
        Ok(listing) => listing,
        Err(err) => {
            tracing::warn!(
                "view directory {} unavailable ({err}); using empty manifest",
                dir.display()
            );
            return Ok(Manifest::empty(generator()));
        }
    };

    let mut files = Vec::new();
    for item in listing {
        let item = item.map_err(|e| io_err(dir, e))?;
        let path = item.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!("skipping non UTF-8 file name: {}", path.display());
            continue;
        };
        if !is_view_file(name) {
            continue;
        }

        let meta = fs::metadata(&path).map_err(|e| io_err(&path, e))?;
        if !meta.is_file() {
            continue;
        }
        let modified_at: DateTime<Utc> = meta.modified().map_err(|e| io_err(&path, e))?.into();
        let hash = hash_file(&path)?;
        tracing::debug!("hashed {name}: {hash}");

        files.push(ManifestEntry {
            filename: name.to_string(),
            size: meta.len(),
            hash,
            modified_at,
            content_type: JSON_CONTENT_TYPE.to_string(),
        });
    }

    let manifest = Manifest::new(files, generator());
    tracing::info!(
        "built manifest for {}: {} file(s), {} bytes",
        dir.display(),
        manifest.total_files,
        manifest.total_size_bytes
    );
    Ok(manifest)
}
