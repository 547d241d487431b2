use std::fs;
use std::time::{Duration, SystemTime};

use filetime::{set_file_mtime, FileTime};
use tempfile::TempDir;
use viewpub_core::{DeployMode, Manifest};
use viewpub_sync::{build_manifest, diff_manifests, Deployer, LocalDevBackend, NoRemoteManifest};

fn views_with(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("views dir");
    for (name, body) in files {
        fs::write(dir.path().join(name), body).expect("write view");
    }
    dir
}

#[test]
fn unchanged_directory_builds_identical_entries() {
    let views = views_with(&[("a.json", "{}"), ("b.json", r#"{"days": []}"#)]);

    let first = build_manifest(views.path()).expect("first build");
    let second = build_manifest(views.path()).expect("second build");

    assert_eq!(first.files, second.files);
    assert_eq!(first.total_size_bytes, second.total_size_bytes);
}

#[test]
fn touched_file_keeps_its_hash_and_is_not_reuploaded() {
    let views = views_with(&[("a.json", r#"{"species": []}"#)]);
    let before = build_manifest(views.path()).expect("build");

    let later = FileTime::from_system_time(SystemTime::now() + Duration::from_secs(3600));
    set_file_mtime(views.path().join("a.json"), later).expect("touch");
    let after = build_manifest(views.path()).expect("rebuild");

    assert_ne!(before.files[0].modified_at, after.files[0].modified_at);
    assert_eq!(before.files[0].hash, after.files[0].hash);
    assert!(diff_manifests(&after, Some(&before)).is_empty());
}

#[test]
fn modified_at_follows_filesystem_mtime() {
    let views = views_with(&[("a.json", "{}")]);
    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_714_521_600);
    set_file_mtime(views.path().join("a.json"), FileTime::from_system_time(stamp)).expect("mtime");

    let manifest = build_manifest(views.path()).expect("build");
    assert_eq!(
        manifest.files[0].modified_at.to_rfc3339(),
        "2024-05-01T00:00:00+00:00"
    );
}

#[test]
fn serialized_manifest_uses_wire_key_names() {
    let views = views_with(&[("a.json", "{}")]);
    let manifest = build_manifest(views.path()).expect("build");

    let json: serde_json::Value = serde_json::to_value(&manifest).expect("serialize");
    for key in [
        "files",
        "total_files",
        "total_size_bytes",
        "generated_at",
        "generator",
        "version",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    let back: Manifest = serde_json::from_value(json).expect("parse");
    assert_eq!(back, manifest);
}

#[test]
fn local_dev_deploy_skips_network_entirely() {
    let views = views_with(&[("a.json", "{}"), ("b.json", "{}")]);
    let deployer = Deployer::new(
        views.path(),
        Box::new(LocalDevBackend),
        Box::new(NoRemoteManifest),
    );

    let result = deployer.deploy(DeployMode::Publish);
    assert!(result.success, "{}", result.message);
    assert_eq!(result.provider, "local_dev");
    assert_eq!(result.files_uploaded, 2);
}
