//! Manifest comparison: selects the minimal upload set.
//!
//! Hash equality is the only test for "unchanged": sizes and modification
//! times drift across environments and are ignored. Remote-only files are
//! reported but never deleted.

use std::collections::{HashMap, HashSet};

use viewpub_core::{Manifest, ManifestEntry};

/// Local entries that must be uploaded, in local manifest order.
///
/// With no remote manifest every local entry is returned.
pub fn diff_manifests(local: &Manifest, remote: Option<&Manifest>) -> Vec<ManifestEntry> {
    let Some(remote) = remote else {
        return local.files.clone();
    };

    let published: HashMap<&str, &str> = remote
        .files
        .iter()
        .map(|f| (f.filename.as_str(), f.hash.as_str()))
        .collect();

    local
        .files
        .iter()
        .filter(|entry| match published.get(entry.filename.as_str()) {
            None => {
                tracing::debug!("new: {}", entry.filename);
                true
            }
            Some(hash) if *hash != entry.hash => {
                tracing::debug!("changed: {}", entry.filename);
                true
            }
            Some(_) => {
                tracing::debug!("unchanged: {}", entry.filename);
                false
            }
        })
        .cloned()
        .collect()
}

/// Filenames published remotely that no longer exist locally.
///
/// These stay live until purged by hand.
pub fn remote_only(local: &Manifest, remote: &Manifest) -> Vec<String> {
    let present: HashSet<&str> = local.files.iter().map(|f| f.filename.as_str()).collect();
    remote
        .files
        .iter()
        .filter(|f| !present.contains(f.filename.as_str()))
        .map(|f| f.filename.clone())
        .collect()
}
