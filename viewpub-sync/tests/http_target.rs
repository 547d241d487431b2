//! Remote manifest fetch and object-store uploads over real HTTP.

mod common;

use std::fs;
use std::time::Duration;

use tempfile::TempDir;

use common::{bucket_server, init_logging, StubResponse, StubServer};
use viewpub_core::{DeployMode, ObjectStoreCredentials, Provider};
use viewpub_sync::{
    build_manifest, Deployer, HttpManifestSource, ManifestSource, ObjectStoreBackend, SyncError,
    UploadBackend,
};

const BUCKET: &str = "dashboard";
const PUT_PREFIX: &str = "/dashboard/views/";

fn backend(endpoint: &str) -> ObjectStoreBackend {
    ObjectStoreBackend::new(
        Provider::S3,
        ObjectStoreCredentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            bucket: BUCKET.to_string(),
            endpoint: endpoint.to_string(),
            region: "us-east-1".to_string(),
        },
        Duration::from_secs(5),
        120,
    )
    .expect("object store backend")
}

fn source(base_url: &str) -> HttpManifestSource {
    HttpManifestSource::new(base_url, Duration::from_secs(5))
}

// ---------------------------------------------------------------------------
// Remote manifest
// ---------------------------------------------------------------------------

#[test]
fn missing_manifest_is_first_deployment() {
    let server = StubServer::spawn(|_| StubResponse::status(404));
    assert!(source(&server.base_url()).fetch().unwrap().is_none());
    assert_eq!(server.requests()[0].path, "/views/manifest.json");
}

#[test]
fn server_error_is_not_mistaken_for_absence() {
    let server = StubServer::spawn(|_| StubResponse::status(500));
    let err = source(&server.base_url()).fetch().unwrap_err();
    assert!(matches!(err, SyncError::Http { status: 500, .. }), "got: {err}");
}

#[test]
fn unparseable_manifest_is_malformed() {
    let server = StubServer::spawn(|_| StubResponse::json(200, "{not json"));
    let err = source(&server.base_url()).fetch().unwrap_err();
    assert!(matches!(err, SyncError::MalformedManifest { .. }), "got: {err}");
}

#[test]
fn published_manifest_is_parsed() {
    let body = r#"{
        "files": [{"filename": "a.json", "size": 2, "hash": "abc",
                   "modified_at": "2024-05-01T00:00:00Z", "content_type": "application/json"}],
        "total_files": 1,
        "total_size_bytes": 2,
        "generated_at": "2024-05-01T00:00:01Z",
        "generator": "viewpub/0.1.0",
        "version": "1.0"
    }"#;
    let server = StubServer::spawn(move |_| StubResponse::json(200, body));
    let manifest = source(&format!("{}/", server.base_url()))
        .fetch()
        .unwrap()
        .expect("manifest");
    assert_eq!(manifest.filenames(), vec!["a.json"]);
}

#[test]
fn unreachable_host_is_a_transport_error() {
    let err = HttpManifestSource::new("http://127.0.0.1:1", Duration::from_millis(500))
        .fetch()
        .unwrap_err();
    assert!(matches!(err, SyncError::Transport { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// Object store uploads
// ---------------------------------------------------------------------------

#[test]
fn uploads_are_signed_path_style_puts() {
    let views = TempDir::new().unwrap();
    fs::write(views.path().join("a.json"), r#"{"species": []}"#).unwrap();
    let (server, objects) = bucket_server(PUT_PREFIX, &[]);
    let store = backend(&server.base_url());

    let manifest = build_manifest(views.path()).unwrap();
    store.upload(views.path(), &manifest.files).unwrap();
    store.publish_manifest(&manifest).unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    let view = &requests[0];
    assert_eq!(view.method, "PUT");
    assert_eq!(view.path, "/dashboard/views/a.json");
    assert_eq!(view.headers["content-type"], "application/json");
    assert_eq!(view.headers["cache-control"], "public, max-age=120");
    assert!(view.headers["authorization"].starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));

    let commit = &requests[1];
    assert_eq!(commit.path, "/dashboard/views/manifest.json");
    assert_eq!(commit.headers["cache-control"], "no-cache");

    let objects = objects.lock().unwrap();
    assert_eq!(objects["a.json"], br#"{"species": []}"#.to_vec());
}

#[test]
fn endpoint_path_prefix_is_kept_in_requests() {
    let views = TempDir::new().unwrap();
    fs::write(views.path().join("a.json"), "{}").unwrap();
    let (server, objects) = bucket_server("/s3/dashboard/views/", &[]);
    let store = backend(&format!("{}/s3", server.base_url()));

    let manifest = build_manifest(views.path()).unwrap();
    store.upload(views.path(), &manifest.files).unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/s3/dashboard/views/a.json");
    assert!(requests[0].headers["authorization"].starts_with("AWS4-HMAC-SHA256 "));
    assert!(objects.lock().unwrap().contains_key("a.json"));
}

#[test]
fn rejected_put_aborts_remaining_uploads() {
    let views = TempDir::new().unwrap();
    for name in ["a.json", "b.json", "c.json"] {
        fs::write(views.path().join(name), "{}").unwrap();
    }
    let (server, _objects) = bucket_server(PUT_PREFIX, &["b.json"]);
    let store = backend(&server.base_url());

    let manifest = build_manifest(views.path()).unwrap();
    let err = store.upload(views.path(), &manifest.files).unwrap_err();

    match &err {
        SyncError::UploadAborted {
            filename,
            uploaded,
            remaining,
            source,
        } => {
            assert_eq!(filename, "b.json");
            assert_eq!(*uploaded, 1);
            assert_eq!(*remaining, 1);
            assert!(matches!(**source, SyncError::ObjectStore { .. }), "got: {source}");
        }
        other => panic!("expected UploadAborted, got {other}"),
    }
    let paths: Vec<String> = server.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/dashboard/views/a.json", "/dashboard/views/b.json"]);
}

// ---------------------------------------------------------------------------
// Full deploy through the stub bucket
// ---------------------------------------------------------------------------

#[test]
fn deploy_round_trips_through_published_manifest() {
    init_logging();
    let views = TempDir::new().unwrap();
    fs::write(views.path().join("hourly_activity.json"), r#"{"hours": []}"#).unwrap();
    fs::write(views.path().join("species_summary.json"), r#"{"species": []}"#).unwrap();
    let (server, objects) = bucket_server(PUT_PREFIX, &[]);
    let deployer = Deployer::new(
        views.path(),
        Box::new(backend(&server.base_url())),
        Box::new(source(&server.base_url())),
    );

    let first = deployer.deploy(DeployMode::Publish);
    assert!(first.success, "{}", first.message);
    assert_eq!(first.files_uploaded, 2);
    assert!(objects.lock().unwrap().contains_key("manifest.json"));

    fs::write(views.path().join("hourly_activity.json"), r#"{"hours": [1]}"#).unwrap();
    let second = deployer.deploy(DeployMode::Publish);
    assert!(second.success, "{}", second.message);
    assert_eq!(second.upload_set, vec!["hourly_activity.json"]);
    assert_eq!(second.files_skipped, 1);
}

#[test]
fn failed_deploy_leaves_remote_manifest_untouched() {
    init_logging();
    let views = TempDir::new().unwrap();
    for name in ["a.json", "b.json", "c.json"] {
        fs::write(views.path().join(name), "{}").unwrap();
    }
    let (server, objects) = bucket_server(PUT_PREFIX, &["b.json"]);
    let deployer = Deployer::new(
        views.path(),
        Box::new(backend(&server.base_url())),
        Box::new(source(&server.base_url())),
    );

    let result = deployer.deploy(DeployMode::Publish);

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(!objects.lock().unwrap().contains_key("manifest.json"));
    assert!(server
        .requests()
        .iter()
        .all(|r| r.path != "/dashboard/views/manifest.json" || r.method == "GET"));
}
