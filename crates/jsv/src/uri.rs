//! Base-URI handling for `$id`, `$ref` and registry keys.

use url::Url;

use crate::SchemaError;

/// Base URI given to documents that declare no absolute identifier.
pub const DEFAULT_BASE: &str = "json-schema:///";

pub(crate) fn default_base() -> Result<Url, SchemaError> {
    Url::parse(DEFAULT_BASE).map_err(|e| SchemaError::InvalidUri {
        uri: DEFAULT_BASE.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn is_default_document(url: &Url) -> bool {
    url.scheme() == "json-schema" && url.path() == "/"
}

/// Resolves `reference` against `base`, leaving any fragment in place.
pub(crate) fn resolve(base: &Url, reference: &str) -> Result<Url, SchemaError> {
    base.join(reference).map_err(|e| SchemaError::InvalidUri {
        uri: reference.to_string(),
        reason: e.to_string(),
    })
}

/// The registry key of a document: the URI without its fragment.
pub(crate) fn document_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

/// The registry key of a plain-name anchor inside `document`.
pub(crate) fn anchor_key(document: &Url, anchor: &str) -> String {
    format!("{}#{}", document_key(document), anchor)
}

/// True for fragments that name an anchor rather than a JSON Pointer.
pub(crate) fn is_plain_name(fragment: &str) -> bool {
    !fragment.is_empty() && !fragment.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative() {
        let base = Url::parse("http://example.com/root.json").unwrap();
        assert_eq!(
            resolve(&base, "item.json").unwrap().as_str(),
            "http://example.com/item.json"
        );
        assert_eq!(
            resolve(&base, "#/definitions/a").unwrap().as_str(),
            "http://example.com/root.json#/definitions/a"
        );
    }

    #[test]
    fn test_default_base_joins() {
        let joined = resolve(&default_base().unwrap(), "node").unwrap();
        assert_eq!(joined.as_str(), "json-schema:///node");
        assert!(is_default_document(&default_base().unwrap()));
        assert!(!is_default_document(&joined));
    }

    #[test]
    fn test_keys() {
        let url = Url::parse("http://example.com/a.json#foo").unwrap();
        assert_eq!(document_key(&url), "http://example.com/a.json");
        assert_eq!(anchor_key(&url, "bar"), "http://example.com/a.json#bar");
        assert!(is_plain_name("foo"));
        assert!(!is_plain_name("/foo"));
        assert!(!is_plain_name(""));
    }
}
