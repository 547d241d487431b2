//! Publish configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.viewpub/
//!   config.yaml   (provider, base_url, views_dir, timeouts, object_store block)
//! ```
//!
//! # Resolution order
//!
//! Explicit config values win. Gaps are filled from the environment by
//! [`PublishConfig::resolve_env_with`], which takes the lookup function as an
//! argument: the process environment is read once, by the binary, never by the
//! library code that consumes the config.
//!
//! # API pattern
//!
//! As with every path-rooted loader in this workspace:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Local view directory used when none is configured.
pub const DEFAULT_VIEWS_DIR: &str = "views";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Publish target kind, selected once when the upload backend is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Provider {
    /// Views are served straight from the local directory; nothing to upload.
    #[default]
    LocalDev,
    /// Cloudflare R2 (S3-compatible, endpoint derived from the account id).
    R2,
    /// AWS S3 or any S3-compatible store reachable at an explicit endpoint.
    S3,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::LocalDev => "local_dev",
            Provider::R2 => "r2",
            Provider::S3 => "s3",
        }
    }

    pub fn is_object_store(self) -> bool {
        !matches!(self, Provider::LocalDev)
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local_dev" | "local" => Ok(Provider::LocalDev),
            "r2" | "cloudflare_r2" => Ok(Provider::R2),
            "s3" => Ok(Provider::S3),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Object store settings
// ---------------------------------------------------------------------------

/// Object-store fields as written in the config file; every field optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ObjectStoreSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Fully resolved credentials; constructing one proves nothing is missing.
#[derive(Clone, PartialEq, Eq)]
pub struct ObjectStoreCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    /// Scheme + host, no trailing slash.
    pub endpoint: String,
    pub region: String,
}

impl fmt::Debug for ObjectStoreCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .finish()
    }
}

impl ObjectStoreSettings {
    /// Resolve into credentials for `provider`, failing on the first missing field.
    pub fn require(&self, provider: Provider) -> Result<ObjectStoreCredentials, ConfigError> {
        let access_key_id = required(&self.access_key_id, "access_key_id")?;
        let secret_access_key = required(&self.secret_access_key, "secret_access_key")?;
        let bucket = required(&self.bucket, "bucket")?;

        let region = match (&self.region, provider) {
            (Some(region), _) => region.clone(),
            (None, Provider::S3) => "us-east-1".to_string(),
            (None, _) => "auto".to_string(),
        };

        let endpoint = match (&self.endpoint, provider) {
            (Some(endpoint), _) => endpoint.trim_end_matches('/').to_string(),
            (None, Provider::S3) => format!("https://s3.{region}.amazonaws.com"),
            (None, _) => {
                let account_id = required(&self.account_id, "account_id")?;
                format!("https://{account_id}.r2.cloudflarestorage.com")
            }
        };

        Ok(ObjectStoreCredentials {
            access_key_id,
            secret_access_key,
            bucket,
            endpoint,
            region,
        })
    }
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigError::MissingCredential {
            field,
            env: primary_env(field),
        }),
    }
}

// ---------------------------------------------------------------------------
// Environment fallbacks
// ---------------------------------------------------------------------------

/// `(field, env names in priority order)`.
const ENV_FALLBACKS: &[(&str, &[&str])] = &[
    ("provider", &["VIEWPUB_PROVIDER"]),
    ("base_url", &["VIEWPUB_BASE_URL"]),
    ("views_dir", &["VIEWPUB_VIEWS_DIR"]),
    (
        "access_key_id",
        &["VIEWPUB_ACCESS_KEY_ID", "R2_ACCESS_KEY_ID", "AWS_ACCESS_KEY_ID"],
    ),
    (
        "secret_access_key",
        &[
            "VIEWPUB_SECRET_ACCESS_KEY",
            "R2_SECRET_ACCESS_KEY",
            "AWS_SECRET_ACCESS_KEY",
        ],
    ),
    ("account_id", &["VIEWPUB_ACCOUNT_ID", "R2_ACCOUNT_ID"]),
    ("bucket", &["VIEWPUB_BUCKET", "R2_BUCKET_NAME", "AWS_S3_BUCKET"]),
    ("endpoint", &["VIEWPUB_ENDPOINT", "R2_ENDPOINT", "AWS_ENDPOINT_URL"]),
    ("region", &["VIEWPUB_REGION", "AWS_REGION"]),
];

fn env_names(field: &str) -> &'static [&'static str] {
    ENV_FALLBACKS
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, names)| *names)
        .unwrap_or(&[])
}

fn primary_env(field: &str) -> &'static str {
    env_names(field).first().copied().unwrap_or("VIEWPUB_CONFIG")
}

fn fill<F>(slot: &mut Option<String>, field: &str, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    if slot.as_deref().is_some_and(|v| !v.trim().is_empty()) {
        return;
    }
    *slot = env_names(field)
        .iter()
        .filter_map(|name| lookup(*name))
        .find(|v| !v.trim().is_empty());
}

// ---------------------------------------------------------------------------
// PublishConfig
// ---------------------------------------------------------------------------

/// Everything a deploy or validate run needs to know about its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Provider identifier as written; parsed by [`PublishConfig::provider`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Public read base URL; views live under `<base_url>/views/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views_dir: Option<PathBuf>,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
    #[serde(default = "default_cache_max_age_secs")]
    pub cache_max_age_secs: u64,
    #[serde(default)]
    pub object_store: ObjectStoreSettings,
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_upload_timeout_secs() -> u64 {
    DEFAULT_UPLOAD_TIMEOUT_SECS
}

fn default_cache_max_age_secs() -> u64 {
    DEFAULT_CACHE_MAX_AGE_SECS
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            provider: None,
            base_url: None,
            views_dir: None,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            upload_timeout_secs: DEFAULT_UPLOAD_TIMEOUT_SECS,
            cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
            object_store: ObjectStoreSettings::default(),
        }
    }
}

impl PublishConfig {
    /// Parse the configured provider; unset means `local_dev`.
    pub fn provider(&self) -> Result<Provider, ConfigError> {
        match self.provider.as_deref() {
            None => Ok(Provider::default()),
            Some(raw) => raw.parse(),
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> Result<&str, ConfigError> {
        match self.base_url.as_deref().map(|u| u.trim().trim_end_matches('/')) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(ConfigError::MissingBaseUrl),
        }
    }

    pub fn views_dir(&self) -> PathBuf {
        self.views_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_VIEWS_DIR))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs.max(1))
    }

    /// Fill unset fields from `lookup` (an environment reader at the process
    /// boundary, or a map in tests). Explicit values are never overwritten.
    pub fn resolve_env_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fill(&mut self.provider, "provider", &lookup);
        fill(&mut self.base_url, "base_url", &lookup);
        if self.views_dir.is_none() {
            let mut raw = None;
            fill(&mut raw, "views_dir", &lookup);
            self.views_dir = raw.map(PathBuf::from);
        }
        let store = &mut self.object_store;
        fill(&mut store.access_key_id, "access_key_id", &lookup);
        fill(&mut store.secret_access_key, "secret_access_key", &lookup);
        fill(&mut store.account_id, "account_id", &lookup);
        fill(&mut store.bucket, "bucket", &lookup);
        fill(&mut store.endpoint, "endpoint", &lookup);
        fill(&mut store.region, "region", &lookup);
        self
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// `<home>/.viewpub/config.yaml`. Pure, no I/O.
pub fn default_path_at(home: &Path) -> PathBuf {
    home.join(".viewpub").join("config.yaml")
}

/// Load an explicitly named config file.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<PublishConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    if contents.trim().is_empty() {
        return Ok(PublishConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load `<home>/.viewpub/config.yaml`, or the default config if it is absent.
pub fn load_default_at(home: &Path) -> Result<PublishConfig, ConfigError> {
    let path = default_path_at(home);
    if !path.exists() {
        return Ok(PublishConfig::default());
    }
    load_at(&path)
}

/// `load_default_at` convenience wrapper.
pub fn load_default() -> Result<PublishConfig, ConfigError> {
    load_default_at(&home()?)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
