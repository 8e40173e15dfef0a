//! URI -> schema registry.
//!
//! Lookups take a read lock and hand back cheap `Schema` clones, so no lock
//! is held while validating. Registered schemas are never changed in place;
//! replacing one means unregistering it and registering the new version.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use jsv_pointer::JsonPointer;
use parking_lot::RwLock;
use url::Url;

use crate::meta;
use crate::schema::Schema;
use crate::uri;
use crate::SchemaError;

#[derive(Debug, Clone)]
struct Entry {
    document: Schema,
    path: JsonPointer,
}

/// Schemas addressable by URI.
///
/// Keys are absolute URIs without fragment. Registering a document also
/// makes every resource it embeds (a subschema with its own `$id`)
/// addressable.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entries: RwLock<HashMap<String, Entry>>,
}

fn normalize(uri: &str) -> Result<String, SchemaError> {
    let url = Url::parse(uri).map_err(|e| SchemaError::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    Ok(uri::document_key(&url))
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used when options don't name another.
    pub fn global() -> Arc<SchemaRegistry> {
        static GLOBAL: OnceLock<Arc<SchemaRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(SchemaRegistry::new())).clone()
    }

    /// Registers `schema` under its own `$id` and the ids of the resources
    /// it embeds.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidUri`] when the document identifies nothing.
    pub fn register(&self, schema: &Schema) -> Result<(), SchemaError> {
        let mut added = 0;
        {
            let mut entries = self.entries.write();
            for (key, path) in schema.resource_keys() {
                if key.as_str() == uri::DEFAULT_BASE {
                    continue;
                }
                entries.insert(
                    key.clone(),
                    Entry {
                        document: schema.clone(),
                        path: path.clone(),
                    },
                );
                tracing::debug!(uri = %key, "registered schema");
                added += 1;
            }
        }
        if added == 0 {
            return Err(SchemaError::InvalidUri {
                uri: schema.base_uri().to_string(),
                reason: "schema declares no absolute $id".to_string(),
            });
        }
        Ok(())
    }

    /// Registers `schema` under an explicit URI.
    pub fn register_as(&self, uri: &str, schema: &Schema) -> Result<(), SchemaError> {
        let key = normalize(uri)?;
        tracing::debug!(uri = %key, "registered schema");
        self.entries.write().insert(
            key,
            Entry {
                document: schema.clone(),
                path: JsonPointer::root(),
            },
        );
        Ok(())
    }

    /// Removes every entry pointing into `schema`'s document. Returns
    /// whether anything was removed.
    pub fn unregister(&self, schema: &Schema) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, entry| {
            let keep = !entry.document.ptr_eq(schema);
            if !keep {
                tracing::debug!(uri = %key, "unregistered schema");
            }
            keep
        });
        entries.len() != before
    }

    /// Removes the entry for `uri`.
    pub fn unregister_uri(&self, uri: &str) -> Option<Schema> {
        let key = normalize(uri).ok()?;
        let entry = self.entries.write().remove(&key)?;
        tracing::debug!(uri = %key, "unregistered schema");
        entry.document.find(entry.path.tokens())
    }

    /// The schema registered under `uri` (fragment ignored).
    pub fn get(&self, uri: &str) -> Option<Schema> {
        let (_, resource) = self.lookup(&normalize(uri).ok()?)?;
        Some(resource)
    }

    /// One of the bundled meta-schemas.
    pub fn get_well_known(&self, uri: &str) -> Option<Schema> {
        meta::well_known(uri)
    }

    /// `(document, resource)` for a normalized key.
    pub(crate) fn lookup(&self, key: &str) -> Option<(Schema, Schema)> {
        let entry = self.entries.read().get(key).cloned()?;
        let resource = entry.document.find(entry.path.tokens())?;
        Some((entry.document, resource))
    }

    pub fn contains(&self, uri: &str) -> bool {
        normalize(uri).is_ok_and(|key| self.entries.read().contains_key(&key))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every registered schema.
    pub fn reset(&self) {
        self.entries.write().clear();
        tracing::debug!("schema registry reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_lookup() {
        let registry = SchemaRegistry::new();
        let schema = Schema::from_json(&json!({
            "$id": "http://example.com/person.json",
            "$defs": {
                "name": {"$id": "name.json", "type": "string"}
            }
        }))
        .unwrap();
        registry.register(&schema).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("http://example.com/person.json#"));
        let name = registry.get("http://example.com/name.json").unwrap();
        assert_eq!(name.to_json(), &json!({"$id": "name.json", "type": "string"}));
        let (document, _) = registry.lookup("http://example.com/name.json").unwrap();
        assert!(document.ptr_eq(&schema));
    }

    #[test]
    fn test_register_requires_an_id() {
        let registry = SchemaRegistry::new();
        let schema = Schema::from_json(&json!({"type": "string"})).unwrap();
        assert!(registry.register(&schema).is_err());
        registry.register_as("urn:example:string", &schema).unwrap();
        assert!(registry.get("urn:example:string").is_some());
    }

    #[test]
    fn test_unregister_and_reset() {
        let registry = SchemaRegistry::new();
        let a = Schema::from_json(&json!({"$id": "http://example.com/a"})).unwrap();
        let b = Schema::from_json(&json!({"$id": "http://example.com/b"})).unwrap();
        registry.register(&a).unwrap();
        registry.register(&b).unwrap();
        assert!(registry.unregister(&a));
        assert!(!registry.unregister(&a));
        assert!(registry.get("http://example.com/a").is_none());
        assert!(registry.unregister_uri("http://example.com/b").is_some());
        registry.register(&b).unwrap();
        registry.reset();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_well_known() {
        let registry = SchemaRegistry::new();
        let meta = registry
            .get_well_known("http://json-schema.org/draft-07/schema#")
            .unwrap();
        assert_eq!(meta.draft(), crate::Draft::Draft07);
        assert!(registry.is_empty());
    }
}
