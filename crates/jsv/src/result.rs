//! Validation results: a tree of keyword outcomes.
//!
//! Results are built bottom-up during one validation pass and are read-only
//! afterwards. [`ValidationResult::condense`] and
//! [`ValidationResult::flatten`] give the `detailed` and `basic` shapes;
//! `flag` keeps only the verdict.

use jsv_pointer::JsonPointer;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Keyword that produced this node; `None` for schema-level nodes.
    pub keyword: Option<String>,
    /// Location of the keyword relative to the validation root, following
    /// references (`/properties/a/$ref/type`).
    pub relative_location: JsonPointer,
    /// `base-uri#pointer` of the keyword inside its own document.
    pub absolute_location: Option<String>,
    pub instance_location: JsonPointer,
    pub nested: Vec<ValidationResult>,
    /// Rendered message for a failing keyword.
    pub error: Option<String>,
    /// Tokens the message was rendered from (`expected`, `actual`, ...).
    pub additional_info: Map<String, Value>,
    pub annotation: Option<Value>,
}

impl ValidationResult {
    pub fn new(
        is_valid: bool,
        relative_location: JsonPointer,
        instance_location: JsonPointer,
    ) -> Self {
        Self {
            is_valid,
            keyword: None,
            relative_location,
            absolute_location: None,
            instance_location,
            nested: Vec::new(),
            error: None,
            additional_info: Map::new(),
            annotation: None,
        }
    }

    /// Collapses the tree to what explains the verdict.
    ///
    /// Invalid nodes keep only invalid children; valid nodes keep only
    /// children carrying annotations. A node without its own message and
    /// with exactly one remaining child is replaced by that child.
    pub fn condense(self) -> ValidationResult {
        let is_valid = self.is_valid;
        let mut node = self;
        let nested = std::mem::take(&mut node.nested);
        node.nested = nested
            .into_iter()
            .filter(|child| {
                if is_valid {
                    child.has_annotations()
                } else {
                    !child.is_valid
                }
            })
            .map(ValidationResult::condense)
            .collect();
        if node.nested.len() == 1 && node.error.is_none() && node.annotation.is_none() {
            let only = node.nested.pop();
            if let Some(child) = only {
                return child;
            }
        }
        node
    }

    /// Depth-first list of the nodes that carry a message (for failures) or
    /// an annotation (for successes), under a root holding the verdict.
    pub fn flatten(&self) -> ValidationResult {
        let mut root = ValidationResult::new(
            self.is_valid,
            self.relative_location.clone(),
            self.instance_location.clone(),
        );
        root.keyword = self.keyword.clone();
        root.absolute_location = self.absolute_location.clone();
        let mut out = Vec::new();
        self.collect_leaves(self.is_valid, &mut out);
        root.nested = out;
        root
    }

    fn collect_leaves(&self, want_valid: bool, out: &mut Vec<ValidationResult>) {
        let keep = if want_valid {
            self.is_valid && self.annotation.is_some()
        } else {
            !self.is_valid && self.error.is_some()
        };
        if keep {
            let mut leaf = self.clone();
            leaf.nested.clear();
            out.push(leaf);
        }
        for child in &self.nested {
            if child.is_valid == want_valid {
                child.collect_leaves(want_valid, out);
            }
        }
    }

    /// Only the verdict.
    pub fn to_flag(&self) -> ValidationResult {
        let mut root = ValidationResult::new(
            self.is_valid,
            self.relative_location.clone(),
            self.instance_location.clone(),
        );
        root.keyword = self.keyword.clone();
        root
    }

    fn has_annotations(&self) -> bool {
        self.annotation.is_some() || self.nested.iter().any(ValidationResult::has_annotations)
    }

    /// Every failing node with a message, depth-first. Failures nested under
    /// a passing node (a losing `anyOf` branch, the schema inside `not`) are
    /// not reported.
    pub fn errors(&self) -> Vec<&ValidationResult> {
        let mut out = Vec::new();
        self.collect_errors(&mut out);
        out
    }

    fn collect_errors<'a>(&'a self, out: &mut Vec<&'a ValidationResult>) {
        if self.is_valid {
            return;
        }
        if self.error.is_some() {
            out.push(self);
        }
        for child in &self.nested {
            child.collect_errors(out);
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("valid", &self.is_valid)?;
        map.serialize_entry("keywordLocation", &self.relative_location)?;
        if let Some(absolute) = &self.absolute_location {
            map.serialize_entry("absoluteKeywordLocation", absolute)?;
        }
        map.serialize_entry("instanceLocation", &self.instance_location)?;
        if let Some(error) = &self.error {
            map.serialize_entry("error", error)?;
        }
        if !self.additional_info.is_empty() {
            map.serialize_entry("additionalInfo", &self.additional_info)?;
        }
        if let Some(annotation) = &self.annotation {
            map.serialize_entry("annotation", annotation)?;
        }
        if !self.nested.is_empty() {
            let key = if self.is_valid { "annotations" } else { "errors" };
            map.serialize_entry(key, &self.nested)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(valid: bool, keyword: &str, instance: &str) -> ValidationResult {
        let mut r = ValidationResult::new(
            valid,
            JsonPointer::root().with(keyword),
            instance.parse().unwrap(),
        );
        r.keyword = Some(keyword.to_string());
        if !valid {
            r.error = Some(format!("{keyword} failed"));
        }
        r
    }

    fn tree() -> ValidationResult {
        let mut items = ValidationResult::new(false, "/items".parse().unwrap(), "/0".parse().unwrap());
        items.nested = vec![leaf(false, "type", "/0"), leaf(true, "minLength", "/0")];
        let mut root = ValidationResult::new(false, JsonPointer::root(), JsonPointer::root());
        root.nested = vec![leaf(true, "minItems", ""), items];
        root
    }

    #[test]
    fn test_condense_collapses_single_chains() {
        let condensed = tree().condense();
        assert!(!condensed.is_valid);
        assert_eq!(condensed.keyword.as_deref(), Some("type"));
        assert!(condensed.nested.is_empty());
    }

    #[test]
    fn test_flatten_lists_failing_leaves() {
        let flat = tree().flatten();
        assert_eq!(flat.nested.len(), 1);
        assert_eq!(flat.nested[0].instance_location.to_string(), "/0");
        assert_eq!(tree().errors().len(), 1);
    }

    #[test]
    fn test_serialization_shape() {
        let json = tree().flatten().to_json();
        assert_eq!(json["valid"], json!(false));
        assert_eq!(json["keywordLocation"], json!(""));
        assert_eq!(json["errors"][0]["keywordLocation"], json!("/type"));
        assert_eq!(json["errors"][0]["instanceLocation"], json!("/0"));
        assert_eq!(json["errors"][0]["error"], json!("type failed"));
        assert!(tree().to_flag().to_json().get("errors").is_none());
    }
}
