//! Lightweight structural checks on view bodies.
//!
//! Every finding here is a warning. A view that parses as JSON is live even
//! if its shape drifted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON type a required key must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Array,
    Object,
}

impl Shape {
    fn matches(self, value: &Value) -> bool {
        match self {
            Shape::Array => value.is_array(),
            Shape::Object => value.is_object(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Shape::Array => "an array",
            Shape::Object => "an object",
        }
    }
}

/// Required top-level key for one view file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSchema {
    pub filename: String,
    pub required_key: String,
    pub shape: Shape,
}

impl ViewSchema {
    pub fn new(filename: &str, required_key: &str, shape: Shape) -> Self {
        Self {
            filename: filename.to_string(),
            required_key: required_key.to_string(),
            shape,
        }
    }
}

/// Schemas for the standard dashboard views.
pub fn default_schemas() -> Vec<ViewSchema> {
    vec![
        ViewSchema::new("species_summary.json", "species", Shape::Array),
        ViewSchema::new("daily_detections.json", "days", Shape::Array),
        ViewSchema::new("hourly_activity.json", "hours", Shape::Array),
        ViewSchema::new("environmental_summary.json", "readings", Shape::Array),
        ViewSchema::new("acoustic_indices.json", "indices", Shape::Array),
    ]
}

/// Warnings for a parsed view body.
///
/// Every view is expected to be an object with a `metadata` object; files
/// named in `schemas` must also carry their required key with the right shape.
pub fn soft_check(filename: &str, body: &Value, schemas: &[ViewSchema]) -> Vec<String> {
    let Some(object) = body.as_object() else {
        return vec![format!("{filename}: top-level value is not an object")];
    };

    let mut warnings = Vec::new();
    if !object.get("metadata").is_some_and(Value::is_object) {
        warnings.push(format!("{filename}: missing `metadata` object"));
    }

    for schema in schemas.iter().filter(|s| s.filename == filename) {
        match object.get(&schema.required_key) {
            None => warnings.push(format!(
                "{filename}: missing required key `{}`",
                schema.required_key
            )),
            Some(value) if !schema.shape.matches(value) => warnings.push(format!(
                "{filename}: `{}` is not {}",
                schema.required_key,
                schema.shape.label()
            )),
            Some(_) => {}
        }
    }
    warnings
}
