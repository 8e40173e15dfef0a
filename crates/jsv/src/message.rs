//! Error message templates.
//!
//! Each keyword has a template with `{{token}}` placeholders. Tokens are
//! looked up in the failing node's `additional_info`; `{{value}}` is the
//! failing instance value. Templates can be replaced per keyword, which is
//! how messages are localized.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serde_json::{Map, Value};

const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("additionalItems", "Array has {{count}} item(s) not allowed by `items`"),
    ("additionalProperties", "Property '{{property}}' is not allowed"),
    ("allOf", "{{failed}} of {{total}} subschema(s) failed"),
    ("anyOf", "Value does not match any of the {{total}} subschema(s)"),
    ("const", "Value {{value}} does not equal {{expected}}"),
    ("contains", "Array does not contain a matching item"),
    ("contentEncoding", "Value is not valid {{encoding}}"),
    ("contentMediaType", "Value is not valid {{mediaType}}"),
    ("contentSchema", "Decoded content does not match the content schema"),
    ("dependencies", "Property '{{property}}' requires {{dependency}}"),
    ("dependentRequired", "Property '{{property}}' requires {{missing}}"),
    ("dependentSchemas", "Dependency of property '{{property}}' failed"),
    ("else", "Value failed the `else` branch"),
    ("enum", "Value {{value}} is not one of {{expected}}"),
    ("exclusiveMaximum", "{{actual}} must be less than {{limit}}"),
    ("exclusiveMinimum", "{{actual}} must be greater than {{limit}}"),
    ("false", "All values fail against the false schema"),
    ("format", "Value {{value}} is not a valid '{{format}}'"),
    ("items", "Item(s) failed validation"),
    ("maxContains", "Array contains {{actual}} matching item(s), at most {{limit}} allowed"),
    ("maxItems", "Array has {{actual}} item(s), at most {{limit}} allowed"),
    ("maxLength", "String has length {{actual}}, at most {{limit}} allowed"),
    ("maxProperties", "Object has {{actual}} propert(ies), at most {{limit}} allowed"),
    ("maximum", "{{actual}} must be at most {{limit}}"),
    ("minContains", "Array contains {{actual}} matching item(s), at least {{limit}} required"),
    ("minItems", "Array has {{actual}} item(s), at least {{limit}} required"),
    ("minLength", "String has length {{actual}}, at least {{limit}} required"),
    ("minProperties", "Object has {{actual}} propert(ies), at least {{limit}} required"),
    ("minimum", "{{actual}} must be at least {{limit}}"),
    ("multipleOf", "{{actual}} is not a multiple of {{divisor}}"),
    ("not", "Value must not match the schema"),
    ("oneOf", "Value matches {{matched}} of the {{total}} subschema(s), exactly one required"),
    ("pattern", "String {{value}} does not match pattern {{pattern}}"),
    ("patternProperties", "Properties matching patterns failed validation"),
    ("properties", "Properties failed validation"),
    ("propertyNames", "Property name '{{property}}' failed validation"),
    ("required", "Required properties {{missing}} are missing"),
    ("then", "Value failed the `then` branch"),
    ("type", "Value is of type {{actual}}, expected {{expected}}"),
    ("unevaluatedItems", "Item(s) not evaluated by any keyword failed validation"),
    ("unevaluatedProperties", "Properties {{properties}} are not evaluated by any keyword"),
    ("uniqueItems", "Items at {{duplicates}} are equal"),
];

const FALLBACK_TEMPLATE: &str = "Value failed `{{keyword}}`";

#[derive(Debug, Default)]
pub struct MessageTemplates {
    templates: RwLock<HashMap<String, String>>,
}

impl MessageTemplates {
    /// Templates for every built-in keyword.
    pub fn with_defaults() -> Self {
        let templates = DEFAULT_TEMPLATES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            templates: RwLock::new(templates),
        }
    }

    pub fn global() -> Arc<MessageTemplates> {
        static GLOBAL: OnceLock<Arc<MessageTemplates>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(MessageTemplates::with_defaults()))
            .clone()
    }

    /// Replaces the template used for `keyword`.
    pub fn set(&self, keyword: &str, template: impl Into<String>) {
        self.templates
            .write()
            .insert(keyword.to_string(), template.into());
    }

    pub fn get(&self, keyword: &str) -> Option<String> {
        self.templates.read().get(keyword).cloned()
    }

    /// Renders the message for `keyword` from its tokens and the failing value.
    pub fn render(&self, keyword: &str, tokens: &Map<String, Value>, value: &Value) -> String {
        let template = self
            .get(keyword)
            .unwrap_or_else(|| FALLBACK_TEMPLATE.to_string());
        render_template(&template, keyword, tokens, value)
    }
}

pub(crate) fn render_template(
    template: &str,
    keyword: &str,
    tokens: &Map<String, Value>,
    value: &Value,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = after[..end].trim();
        match name {
            "value" => out.push_str(&display(value)),
            "keyword" => out.push_str(keyword),
            _ => match tokens.get(name) {
                Some(token) => out.push_str(&display(token)),
                None => {
                    out.push_str("{{");
                    out.push_str(name);
                    out.push_str("}}");
                }
            },
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// Strings render bare; everything else renders as JSON text.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
