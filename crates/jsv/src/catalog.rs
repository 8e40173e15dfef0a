//! Keyword catalog: name + draft -> keyword constructor.
//!
//! Building a schema sends every member of a schema object through the
//! catalog. Names the catalog doesn't know for the schema's draft are kept
//! as opaque data and never validated.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serde_json::Value;

use crate::draft::{Draft, DraftMask, Vocabulary};
use crate::keyword::{self, Keyword};
use crate::schema::BuildContext;
use crate::SchemaError;

/// Constructs a keyword instance from its JSON payload.
///
/// The name is passed so one factory can serve a family of keywords.
pub type KeywordFactory =
    fn(&str, &Value, &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError>;

/// One catalog entry.
#[derive(Clone)]
pub struct KeywordDefinition {
    pub name: String,
    pub drafts: DraftMask,
    pub vocabulary: Option<Vocabulary>,
    pub factory: KeywordFactory,
    /// Registration index, used to break ties between equal sequence values.
    pub order: usize,
}

impl std::fmt::Debug for KeywordDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordDefinition")
            .field("name", &self.name)
            .field("drafts", &self.drafts)
            .field("vocabulary", &self.vocabulary)
            .field("order", &self.order)
            .finish()
    }
}

#[derive(Default)]
struct CatalogInner {
    definitions: Vec<Arc<KeywordDefinition>>,
    by_name: HashMap<String, Vec<usize>>,
}

#[derive(Default)]
pub struct KeywordCatalog {
    inner: RwLock<CatalogInner>,
}

impl std::fmt::Debug for KeywordCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordCatalog")
            .field("definitions", &self.inner.read().definitions.len())
            .finish()
    }
}

impl KeywordCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding every built-in keyword.
    pub fn with_defaults() -> Self {
        let catalog = Self::new();
        keyword::register_defaults(&catalog);
        catalog
    }

    /// The process-wide catalog used when no other is configured.
    pub fn global() -> Arc<KeywordCatalog> {
        static GLOBAL: OnceLock<Arc<KeywordCatalog>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(KeywordCatalog::with_defaults()))
            .clone()
    }

    /// Adds a keyword variant.
    ///
    /// # Errors
    ///
    /// [`SchemaError::ExtensionMismatch`] when a variant with the same name is
    /// already registered for one of `drafts`.
    pub fn register(
        &self,
        name: &str,
        drafts: DraftMask,
        vocabulary: Option<Vocabulary>,
        factory: KeywordFactory,
    ) -> Result<(), SchemaError> {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.by_name.get(name) {
            if existing
                .iter()
                .any(|&i| inner.definitions[i].drafts.intersects(drafts))
            {
                return Err(SchemaError::ExtensionMismatch(format!(
                    "keyword '{name}' is already registered for {drafts:?}"
                )));
            }
        }
        let order = inner.definitions.len();
        inner.definitions.push(Arc::new(KeywordDefinition {
            name: name.to_string(),
            drafts,
            vocabulary,
            factory,
            order,
        }));
        inner.by_name.entry(name.to_string()).or_default().push(order);
        tracing::debug!(keyword = name, ?drafts, "registered keyword");
        Ok(())
    }

    /// The variant of `name` that applies to `draft`, if any.
    pub fn resolve(&self, name: &str, draft: Draft) -> Option<Arc<KeywordDefinition>> {
        let inner = self.inner.read();
        inner
            .by_name
            .get(name)?
            .iter()
            .map(|&i| &inner.definitions[i])
            .find(|def| def.drafts.contains(draft))
            .cloned()
    }

    /// The vocabulary `name` belongs to, looking at any draft.
    pub fn vocabulary_of(&self, name: &str) -> Option<Vocabulary> {
        let inner = self.inner.read();
        inner
            .by_name
            .get(name)?
            .iter()
            .find_map(|&i| inner.definitions[i].vocabulary)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.read().definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_draft_specific_variants() {
        let catalog = KeywordCatalog::with_defaults();
        assert!(catalog.resolve("id", Draft::Draft04).is_some());
        assert!(catalog.resolve("id", Draft::Draft07).is_none());
        assert!(catalog.resolve("$id", Draft::Draft07).is_some());
        assert!(catalog.resolve("unevaluatedProperties", Draft::Draft07).is_none());
        assert!(catalog
            .resolve("unevaluatedProperties", Draft::Draft2019_09)
            .is_some());

        let old = catalog.resolve("exclusiveMaximum", Draft::Draft04).unwrap();
        let new = catalog.resolve("exclusiveMaximum", Draft::Draft06).unwrap();
        assert_ne!(old.order, new.order);
    }

    #[test]
    fn test_vocabulary_of() {
        let catalog = KeywordCatalog::with_defaults();
        assert_eq!(catalog.vocabulary_of("properties"), Some(Vocabulary::Applicator));
        assert_eq!(catalog.vocabulary_of("minLength"), Some(Vocabulary::Validation));
        assert_eq!(catalog.vocabulary_of("format"), Some(Vocabulary::Format));
        assert_eq!(catalog.vocabulary_of("x-unknown"), None);
    }

    #[test]
    fn test_rejects_overlapping_registration() {
        let catalog = KeywordCatalog::with_defaults();
        let def = catalog.resolve("minLength", Draft::Draft07).unwrap();
        let err = catalog
            .register("minLength", DraftMask::ALL, None, def.factory)
            .unwrap_err();
        assert!(matches!(err, SchemaError::ExtensionMismatch(_)));
        assert!(catalog
            .register("x-min", DraftMask::ALL, None, def.factory)
            .is_ok());
        assert!(catalog.contains("x-min"));
    }
}
