//! Bundled meta-schemas.
//!
//! The draft 04, 06 and 07 meta-schemas and the 2019-09 meta-schema with
//! its vocabulary meta-schemas ship with the crate. They are built once, on
//! first use, and are resolvable by URI from any schema without being
//! registered.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::Value;
use url::Url;

use crate::draft::Draft;
use crate::options::BuildOptions;
use crate::schema::Schema;
use crate::uri;

const SOURCES: &[(Draft, &str)] = &[
    (Draft::Draft04, include_str!("draft04.json")),
    (Draft::Draft06, include_str!("draft06.json")),
    (Draft::Draft07, include_str!("draft07.json")),
    (Draft::Draft2019_09, include_str!("draft2019_09/schema.json")),
    (Draft::Draft2019_09, include_str!("draft2019_09/core.json")),
    (Draft::Draft2019_09, include_str!("draft2019_09/applicator.json")),
    (Draft::Draft2019_09, include_str!("draft2019_09/validation.json")),
    (Draft::Draft2019_09, include_str!("draft2019_09/meta_data.json")),
    (Draft::Draft2019_09, include_str!("draft2019_09/format.json")),
    (Draft::Draft2019_09, include_str!("draft2019_09/content.json")),
];

fn build(draft: Draft, source: &str) -> Option<Schema> {
    let value: Value = match serde_json::from_str(source) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(%draft, %err, "bundled meta-schema is not valid JSON");
            return None;
        }
    };
    let options = BuildOptions {
        default_draft: draft,
        ..Default::default()
    };
    match Schema::from_json_with(&value, &options) {
        Ok(schema) => Some(schema),
        Err(err) => {
            tracing::error!(%draft, %err, "bundled meta-schema failed to build");
            None
        }
    }
}

fn bundled() -> &'static HashMap<String, Schema> {
    static BUNDLED: OnceLock<HashMap<String, Schema>> = OnceLock::new();
    BUNDLED.get_or_init(|| {
        SOURCES
            .iter()
            .filter_map(|(draft, source)| build(*draft, source))
            .filter_map(|schema| {
                let key = uri::document_key(schema.id()?);
                Some((key, schema))
            })
            .collect()
    })
}

/// Document key for `uri`. The draft meta-schema URIs are matched loosely
/// (either scheme, with or without the empty fragment).
fn key_of(uri: &str) -> Option<String> {
    if let Some(draft) = Draft::from_schema_uri(uri) {
        return Some(uri::document_key(&Url::parse(draft.meta_schema_uri()).ok()?));
    }
    Some(uri::document_key(&Url::parse(uri).ok()?))
}

/// The bundled meta-schema identified by `uri`, if there is one.
pub(crate) fn well_known(uri: &str) -> Option<Schema> {
    bundled().get(&key_of(uri)?).cloned()
}

/// URIs of every bundled meta-schema.
pub fn well_known_uris() -> impl Iterator<Item = &'static str> {
    bundled().keys().map(String::as_str)
}
