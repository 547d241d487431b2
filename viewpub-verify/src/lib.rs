//! # viewpub-verify
//!
//! Checks that a published view set is live over its public read path.
//! Knows only the base URL and the filenames it expects; nothing is shared
//! with the deploy side.

pub mod error;
pub mod schema;
pub mod validator;

pub use error::VerifyError;
pub use schema::{default_schemas, soft_check, Shape, ViewSchema};
pub use validator::{Validator, ValidatorOptions};
