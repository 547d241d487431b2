//! Domain types for published view sets.
//!
//! A [`Manifest`] is an immutable snapshot of a view directory; a fresh one is
//! built on every run. [`DeploymentResult`] and [`ValidationResult`] are the
//! records handed back to whatever wrapper invoked a deploy or a validation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Content type of every artifact this system publishes.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Well-known name of the manifest inside the views prefix.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Remote path segment under which views and the manifest live.
pub const VIEWS_PREFIX: &str = "views";

/// Manifest schema version written by this build.
pub const MANIFEST_VERSION: &str = "1.0";

/// `<base_url>/views/<filename>`, the public read path of a view.
pub fn view_url(base_url: &str, filename: &str) -> String {
    format!("{}/{VIEWS_PREFIX}/{filename}", base_url.trim_end_matches('/'))
}

/// `<base_url>/views/manifest.json`.
pub fn manifest_url(base_url: &str) -> String {
    view_url(base_url, MANIFEST_FILENAME)
}

fn default_content_type() -> String {
    JSON_CONTENT_TYPE.to_string()
}

fn default_manifest_version() -> String {
    MANIFEST_VERSION.to_string()
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// One published file. `hash` depends on file bytes only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub size: u64,
    /// Lowercase hex SHA-256 of the file contents.
    pub hash: String,
    pub modified_at: DateTime<Utc>,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

/// Snapshot of a view set, sorted by filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub files: Vec<ManifestEntry>,
    #[serde(default)]
    pub total_files: usize,
    #[serde(default)]
    pub total_size_bytes: u64,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub generator: String,
    #[serde(default = "default_manifest_version")]
    pub version: String,
}

impl Manifest {
    /// Build a manifest from entries, sorting them and deriving the totals.
    pub fn new(mut files: Vec<ManifestEntry>, generator: impl Into<String>) -> Self {
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        let total_size_bytes = files.iter().map(|f| f.size).sum();
        Self {
            total_files: files.len(),
            total_size_bytes,
            files,
            generated_at: Utc::now(),
            generator: generator.into(),
            version: MANIFEST_VERSION.to_string(),
        }
    }

    /// A manifest with no files.
    pub fn empty(generator: impl Into<String>) -> Self {
        Self::new(Vec::new(), generator)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Look up an entry by filename.
    pub fn get(&self, filename: &str) -> Option<&ManifestEntry> {
        self.files.iter().find(|f| f.filename == filename)
    }

    /// Filenames in manifest order.
    pub fn filenames(&self) -> Vec<String> {
        self.files.iter().map(|f| f.filename.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Deployment result
// ---------------------------------------------------------------------------

/// How far a deploy run is allowed to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeployMode {
    /// Upload the diff set, then publish the manifest.
    #[default]
    Publish,
    /// Report the diff set and its byte size; no uploads.
    DryRun,
    /// Report the diff set only; no uploads, no byte accounting.
    CheckOnly,
}

impl DeployMode {
    /// `true` for the modes that never touch the target.
    pub fn is_side_effect_free(self) -> bool {
        !matches!(self, DeployMode::Publish)
    }
}

impl fmt::Display for DeployMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployMode::Publish => write!(f, "publish"),
            DeployMode::DryRun => write!(f, "dry-run"),
            DeployMode::CheckOnly => write!(f, "check-only"),
        }
    }
}

/// Outcome of one deploy run.
///
/// `files_processed == files_uploaded + files_skipped` whenever `success`;
/// a non-empty `errors` list implies `!success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub success: bool,
    pub provider: String,
    #[serde(default)]
    pub mode: DeployMode,
    pub files_processed: usize,
    pub files_uploaded: usize,
    pub files_skipped: usize,
    pub total_size_bytes: u64,
    pub duration_seconds: f64,
    pub message: String,
    /// Filenames the differ selected, in manifest order.
    #[serde(default)]
    pub upload_set: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl DeploymentResult {
    /// One-line status suitable for a CLI or a cron mail subject.
    pub fn summary(&self) -> String {
        let prefix = match self.mode {
            DeployMode::Publish => String::new(),
            mode => format!("[{mode}] "),
        };
        if !self.success {
            return format!("{prefix}✗ {}: {}", self.provider, self.message);
        }
        format!(
            "{prefix}✓ {}: {} uploaded, {} skipped, {} bytes in {:.2}s",
            self.provider,
            self.files_uploaded,
            self.files_skipped,
            self.total_size_bytes,
            self.duration_seconds,
        )
    }
}

// ---------------------------------------------------------------------------
// Validation result
// ---------------------------------------------------------------------------

/// Per-file verification record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCheck {
    pub filename: String,
    pub url: String,
    /// HTTP status, absent when the request failed at the transport layer.
    pub status: Option<u16>,
    /// Elapsed time, absent when no HTTP response was received.
    pub response_time_ms: Option<f64>,
    pub passed: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Outcome of verifying a published view set.
///
/// `success == (files_failed == 0 && files_validated == total_files)`;
/// warnings never affect `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub total_files: usize,
    pub files_validated: usize,
    pub files_failed: usize,
    pub average_response_time_ms: f64,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub checks: Vec<FileCheck>,
}

impl ValidationResult {
    /// Aggregate per-file checks, preserving their order.
    pub fn from_checks(checks: Vec<FileCheck>) -> Self {
        let total_files = checks.len();
        let files_validated = checks.iter().filter(|c| c.passed).count();
        let files_failed = total_files - files_validated;

        let samples: Vec<f64> = checks.iter().filter_map(|c| c.response_time_ms).collect();
        let average_response_time_ms = if samples.is_empty() {
            0.0
        } else {
            samples.iter().sum::<f64>() / samples.len() as f64
        };

        let errors = checks.iter().filter_map(|c| c.error.clone()).collect();
        let warnings = checks
            .iter()
            .flat_map(|c| c.warnings.iter().cloned())
            .collect();

        Self {
            success: files_failed == 0 && files_validated == total_files,
            total_files,
            files_validated,
            files_failed,
            average_response_time_ms,
            errors,
            warnings,
            checks,
        }
    }

    /// One-line status.
    pub fn summary(&self) -> String {
        let mark = if self.success { "✓" } else { "✗" };
        format!(
            "{mark} {}/{} views live, {} failed, {} warnings, avg {:.0}ms",
            self.files_validated,
            self.total_files,
            self.files_failed,
            self.warnings.len(),
            self.average_response_time_ms,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, size: u64, hash: &str) -> ManifestEntry {
        ManifestEntry {
            filename: name.to_string(),
            size,
            hash: hash.to_string(),
            modified_at: Utc::now(),
            content_type: JSON_CONTENT_TYPE.to_string(),
        }
    }

    fn check(name: &str, passed: bool, ms: Option<f64>) -> FileCheck {
        FileCheck {
            filename: name.to_string(),
            url: format!("http://localhost/views/{name}"),
            status: ms.map(|_| if passed { 200 } else { 404 }),
            response_time_ms: ms,
            passed,
            error: (!passed).then(|| format!("{name}: HTTP 404")),
            warnings: vec![],
        }
    }

    #[test]
    fn manifest_new_sorts_and_totals() {
        let m = Manifest::new(
            vec![entry("b.json", 50, "bb"), entry("a.json", 100, "aa")],
            "test",
        );
        assert_eq!(m.filenames(), vec!["a.json", "b.json"]);
        assert_eq!(m.total_files, 2);
        assert_eq!(m.total_size_bytes, 150);
        assert_eq!(m.version, MANIFEST_VERSION);
    }

    #[test]
    fn remote_manifest_without_optional_keys_parses() {
        let json = r#"{
            "files": [{"filename": "a.json", "size": 3, "hash": "abc",
                       "modified_at": "2024-05-01T12:00:00Z"}],
            "total_files": 1,
            "generated_at": "2024-05-01T12:00:01Z",
            "generator": "legacy"
        }"#;
        let m: Manifest = serde_json::from_str(json).expect("parse");
        assert_eq!(m.files[0].content_type, JSON_CONTENT_TYPE);
        assert_eq!(m.total_size_bytes, 0);
        assert_eq!(m.version, MANIFEST_VERSION);
    }

    #[test]
    fn validation_average_ignores_transport_failures() {
        let result = ValidationResult::from_checks(vec![
            check("a.json", true, Some(10.0)),
            check("b.json", false, Some(30.0)),
            check("c.json", false, None),
        ]);
        assert_eq!(result.files_validated, 1);
        assert_eq!(result.files_failed, 2);
        assert!((result.average_response_time_ms - 20.0).abs() < f64::EPSILON);
        assert!(!result.success);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn empty_validation_is_successful() {
        let result = ValidationResult::from_checks(vec![]);
        assert!(result.success);
        assert_eq!(result.average_response_time_ms, 0.0);
    }

    #[test]
    fn urls_tolerate_trailing_slash() {
        assert_eq!(
            view_url("https://cdn.example.org/", "a.json"),
            "https://cdn.example.org/views/a.json"
        );
        assert_eq!(
            manifest_url("https://cdn.example.org"),
            "https://cdn.example.org/views/manifest.json"
        );
    }

    #[test]
    fn deploy_mode_display() {
        assert_eq!(DeployMode::DryRun.to_string(), "dry-run");
        assert_eq!(DeployMode::CheckOnly.to_string(), "check-only");
        assert!(DeployMode::CheckOnly.is_side_effect_free());
        assert!(!DeployMode::Publish.is_side_effect_free());
    }
}
