//! Build and validation options.

use std::fmt;
use std::sync::Arc;

use jsv_util::EqualityOptions;
use serde_json::Value;
use url::Url;

use crate::catalog::KeywordCatalog;
use crate::draft::Draft;
use crate::format::FormatRegistry;
use crate::message::MessageTemplates;
use crate::output::{OutputFormat, OutputPostprocessors};
use crate::registry::SchemaRegistry;

/// Loads schema documents that are in no registry.
///
/// Nothing is fetched unless a retriever is configured; implementations
/// decide which schemes they serve.
pub trait Retrieve: Send + Sync {
    fn retrieve(&self, uri: &Url) -> Result<Value, String>;
}

/// Options for [`crate::Schema::from_json_with`].
#[derive(Clone)]
pub struct BuildOptions {
    /// Draft of schemas without a recognized `$schema`.
    pub default_draft: Draft,
    /// Base URI of a document declaring no `$id`.
    pub base_uri: Option<String>,
    pub catalog: Arc<KeywordCatalog>,
    /// Consulted for custom meta-schemas named by `$schema`.
    pub registry: Arc<SchemaRegistry>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            default_draft: Draft::Draft2019_09,
            base_uri: None,
            catalog: KeywordCatalog::global(),
            registry: SchemaRegistry::global(),
        }
    }
}

impl fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOptions")
            .field("default_draft", &self.default_draft)
            .field("base_uri", &self.base_uri)
            .finish_non_exhaustive()
    }
}

/// Options for one validation call.
#[derive(Clone)]
pub struct ValidationOptions {
    pub output_format: OutputFormat,
    /// When false, `format` only annotates.
    pub validate_format: bool,
    /// Unknown `format` and `contentEncoding` names become faults.
    pub strict: bool,
    /// Equality used by `enum`, `const` and `uniqueItems`.
    pub equality: EqualityOptions,
    pub registry: Arc<SchemaRegistry>,
    /// Used when a reference target has to be rebuilt from JSON.
    pub catalog: Arc<KeywordCatalog>,
    pub formats: Arc<FormatRegistry>,
    pub messages: Arc<MessageTemplates>,
    pub postprocessors: Arc<OutputPostprocessors>,
    pub retriever: Option<Arc<dyn Retrieve>>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            validate_format: true,
            strict: false,
            equality: EqualityOptions::default(),
            registry: SchemaRegistry::global(),
            catalog: KeywordCatalog::global(),
            formats: FormatRegistry::global(),
            messages: MessageTemplates::global(),
            postprocessors: OutputPostprocessors::global(),
            retriever: None,
        }
    }
}

impl ValidationOptions {
    pub fn with_output(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn Retrieve>) -> Self {
        self.retriever = Some(retriever);
        self
    }
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("output_format", &self.output_format)
            .field("validate_format", &self.validate_format)
            .field("strict", &self.strict)
            .field("equality", &self.equality)
            .field("retriever", &self.retriever.is_some())
            .finish_non_exhaustive()
    }
}
