//! Error types for viewpub-verify.
//!
//! Per-file problems are reported inside `ValidationResult`; only a validator
//! that cannot be constructed at all is an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: &'static str },
}
