//! Type definitions for JSON Pointer.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::{format_json_pointer, get, parse_json_pointer, validate_json_pointer, JsonPointerError};

/// An immutable JSON Pointer.
///
/// Appending never mutates the receiver: [`JsonPointer::with`] returns a new
/// pointer sharing nothing with the old one but its tokens' values. Cloning is
/// cheap, so locations can be handed to every child result.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPointer {
    tokens: Arc<[String]>,
}

impl JsonPointer {
    /// The pointer to the whole document (`""`).
    pub fn root() -> Self {
        Self {
            tokens: Arc::from(Vec::new()),
        }
    }

    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns a new pointer with `token` appended.
    pub fn with(&self, token: impl Into<String>) -> Self {
        let mut tokens: Vec<String> = self.tokens.to_vec();
        tokens.push(token.into());
        Self {
            tokens: tokens.into(),
        }
    }

    /// Returns a new pointer with an array index appended.
    pub fn with_index(&self, index: usize) -> Self {
        self.with(index.to_string())
    }

    /// Returns a new pointer with every token of `other` appended.
    pub fn join(&self, other: &JsonPointer) -> Self {
        if other.is_root() {
            return self.clone();
        }
        let mut tokens: Vec<String> = self.tokens.to_vec();
        tokens.extend(other.tokens.iter().cloned());
        Self {
            tokens: tokens.into(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    /// Resolve the pointer against `value`.
    pub fn evaluate<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        get(value, &self.tokens)
    }

    /// Renders the pointer as a URI fragment, e.g. `#/definitions/a`.
    pub fn to_uri_fragment(&self) -> String {
        let mut out = String::from("#");
        for byte in self.to_string().bytes() {
            match byte {
                b'A'..=b'Z'
                | b'a'..=b'z'
                | b'0'..=b'9'
                | b'-'
                | b'.'
                | b'_'
                | b'~'
                | b'/'
                | b'$'
                | b'!'
                | b'\''
                | b'('
                | b')'
                | b'*'
                | b'+'
                | b','
                | b';'
                | b'='
                | b':'
                | b'@' => out.push(byte as char),
                other => out.push_str(&format!("%{other:02X}")),
            }
        }
        out
    }
}

impl Default for JsonPointer {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_json_pointer(&self.tokens))
    }
}

impl fmt::Debug for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsonPointer({:?})", self.to_string())
    }
}

impl FromStr for JsonPointer {
    type Err = JsonPointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_json_pointer(s).map_err(|_| JsonPointerError::InvalidPointer(s.to_string()))?;
        Ok(Self::from_tokens(parse_json_pointer(s)))
    }
}

impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for JsonPointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
