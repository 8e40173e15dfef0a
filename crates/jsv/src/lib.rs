//! `jsv`: JSON Schema validation for drafts 04, 06, 07 and 2019-09.
//!
//! Schemas are built once from JSON into immutable keyword trees and can
//! then validate any number of instances. Results carry keyword and
//! instance locations, error messages and annotations, and render in the
//! standard output formats.
//!
//! # Example
//!
//! ```
//! use jsv::{OutputFormat, Schema, ValidationOptions};
//! use serde_json::json;
//!
//! let schema = Schema::from_json(&json!({
//!     "type": "array",
//!     "minItems": 2,
//!     "items": {"type": "string"}
//! }))
//! .unwrap();
//!
//! let options = ValidationOptions::default().with_output(OutputFormat::Basic);
//! let result = schema.validate_with(&json!([1, "string"]), &options).unwrap();
//! assert!(!result.is_valid);
//! assert_eq!(result.errors()[0].instance_location.to_string(), "/0");
//! ```

pub mod builder;
pub mod catalog;
pub mod context;
mod dispatch;
pub mod draft;
pub mod error;
pub mod format;
pub mod keyword;
pub mod message;
pub mod meta;
pub mod options;
pub mod output;
pub mod registry;
mod resolve;
pub mod result;
pub mod schema;
mod uri;

pub use builder::{IntoSchemaValue, SchemaBuilder};
pub use catalog::{KeywordCatalog, KeywordDefinition, KeywordFactory};
pub use context::{Evaluated, ValidationContext};
pub use draft::{Draft, DraftMask, Vocabulary};
pub use error::SchemaError;
pub use format::{FormatCheck, FormatRegistry};
pub use jsv_util::{ArrayEquality, EqualityOptions, NullEquality};
pub use keyword::Keyword;
pub use message::MessageTemplates;
pub use meta::well_known_uris;
pub use options::{BuildOptions, Retrieve, ValidationOptions};
pub use output::{OutputFormat, OutputPostprocessors, Postprocessor};
pub use registry::SchemaRegistry;
pub use result::ValidationResult;
pub use schema::{BuildContext, Schema};
pub use uri::DEFAULT_BASE;

use serde_json::Value;

/// Builds `schema` and validates `instance` against it with default
/// options.
pub fn validate(schema: &Value, instance: &Value) -> Result<ValidationResult, SchemaError> {
    Schema::from_json(schema)?.validate(instance)
}

/// Like [`validate`], reporting only the verdict.
pub fn is_valid(schema: &Value, instance: &Value) -> Result<bool, SchemaError> {
    Schema::from_json(schema)?.is_valid(instance)
}
