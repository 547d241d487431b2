//! Post-deploy verification of the public read path.
//!
//! Every expected file is requested, whatever happened to the ones before it.
//! Requests run on a small worker pool; results come back in input order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use viewpub_core::{view_url, FileCheck, ValidationResult, JSON_CONTENT_TYPE};

use crate::error::VerifyError;
use crate::schema::{default_schemas, soft_check, ViewSchema};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_SLOW_THRESHOLD_MS: u64 = 2000;

/// Knobs for one validator.
#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Parse bodies as JSON and run the soft checks.
    pub check_content: bool,
    /// In-flight requests, clamped to `1..=MAX_CONCURRENCY`.
    pub concurrency: usize,
    /// Responses slower than this produce a warning.
    pub slow_threshold_ms: u64,
    pub schemas: Vec<ViewSchema>,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            check_content: true,
            concurrency: DEFAULT_CONCURRENCY,
            slow_threshold_ms: DEFAULT_SLOW_THRESHOLD_MS,
            schemas: default_schemas(),
        }
    }
}

/// Reads `<base_url>/views/<filename>` for each expected file.
pub struct Validator {
    base_url: String,
    agent: ureq::Agent,
    options: ValidatorOptions,
}

impl Validator {
    pub fn new(base_url: &str, options: ValidatorOptions) -> Result<Self, VerifyError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(VerifyError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "empty",
            });
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(VerifyError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "scheme must be http or https",
            });
        }
        let agent = ureq::AgentBuilder::new().timeout(options.timeout).build();
        Ok(Self {
            base_url: trimmed.to_string(),
            agent,
            options,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Check every file in `expected`, in order.
    pub fn validate(&self, expected: &[String]) -> ValidationResult {
        let workers = self
            .options
            .concurrency
            .clamp(1, MAX_CONCURRENCY)
            .min(expected.len().max(1));
        tracing::info!(
            "validating {} view(s) at {} with {workers} worker(s)",
            expected.len(),
            self.base_url
        );

        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, FileCheck)>();
        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move || loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(filename) = expected.get(index) else {
                        break;
                    };
                    if tx.send((index, self.check_file(filename))).is_err() {
                        break;
                    }
                });
            }
        });
        drop(tx);

        let mut checks: Vec<(usize, FileCheck)> = rx.into_iter().collect();
        checks.sort_by_key(|(index, _)| *index);
        let result = ValidationResult::from_checks(checks.into_iter().map(|(_, c)| c).collect());
        tracing::info!("{}", result.summary());
        result
    }

    fn check_file(&self, filename: &str) -> FileCheck {
        let url = view_url(&self.base_url, filename);
        let mut check = FileCheck {
            filename: filename.to_string(),
            url: url.clone(),
            status: None,
            response_time_ms: None,
            passed: false,
            error: None,
            warnings: Vec::new(),
        };

        let started = Instant::now();
        let response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                check.status = Some(status);
                check.response_time_ms = Some(elapsed_ms(started));
                return fail(check, format!("{filename}: HTTP {status}"));
            }
            Err(ureq::Error::Transport(err)) => {
                return fail(check, format!("{filename}: request failed: {err}"));
            }
        };

        let status = response.status();
        let content_type = response.content_type().to_string();
        let body = response.into_string();
        let elapsed = elapsed_ms(started);
        check.status = Some(status);
        check.response_time_ms = Some(elapsed);

        if !(200..300).contains(&status) {
            return fail(check, format!("{filename}: HTTP {status}"));
        }
        let body = match body {
            Ok(body) => body,
            Err(err) => return fail(check, format!("{filename}: could not read body: {err}")),
        };

        if content_type != JSON_CONTENT_TYPE {
            check.warnings.push(format!(
                "{filename}: content-type {content_type} (expected {JSON_CONTENT_TYPE})"
            ));
        }
        if elapsed > self.options.slow_threshold_ms as f64 {
            check.warnings.push(format!(
                "{filename}: slow response ({elapsed:.0}ms > {}ms)",
                self.options.slow_threshold_ms
            ));
        }

        if self.options.check_content {
            match serde_json::from_str::<serde_json::Value>(&body) {
                Ok(value) => check
                    .warnings
                    .extend(soft_check(filename, &value, &self.options.schemas)),
                Err(err) => return fail(check, format!("{filename}: invalid JSON: {err}")),
            }
        }

        for warning in &check.warnings {
            tracing::warn!("{warning}");
        }
        tracing::debug!("{filename}: ok ({status}, {elapsed:.0}ms)");
        check.passed = true;
        check
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn fail(mut check: FileCheck, error: String) -> FileCheck {
    tracing::warn!("{error}");
    check.passed = false;
    check.error = Some(error);
    check
}
