//! Schema dialects, draft masks and 2019-09 vocabularies.

use std::fmt;
use std::ops::{BitAnd, BitOr};

use serde::{Deserialize, Serialize};

/// A JSON Schema dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Draft {
    Draft04,
    Draft06,
    Draft07,
    Draft2019_09,
}

impl Draft {
    pub const ALL: [Draft; 4] = [
        Draft::Draft04,
        Draft::Draft06,
        Draft::Draft07,
        Draft::Draft2019_09,
    ];

    /// The canonical `$schema` URI of the draft's meta-schema.
    pub fn meta_schema_uri(self) -> &'static str {
        match self {
            Draft::Draft04 => "http://json-schema.org/draft-04/schema#",
            Draft::Draft06 => "http://json-schema.org/draft-06/schema#",
            Draft::Draft07 => "http://json-schema.org/draft-07/schema#",
            Draft::Draft2019_09 => "https://json-schema.org/draft/2019-09/schema",
        }
    }

    /// Recognizes a `$schema` value. Trailing `#` and the http/https scheme
    /// are not significant.
    pub fn from_schema_uri(uri: &str) -> Option<Draft> {
        let trimmed = uri.trim_end_matches('#');
        let trimmed = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))?;
        match trimmed {
            "json-schema.org/draft-04/schema" => Some(Draft::Draft04),
            "json-schema.org/draft-06/schema" => Some(Draft::Draft06),
            "json-schema.org/draft-07/schema" => Some(Draft::Draft07),
            "json-schema.org/draft/2019-09/schema" => Some(Draft::Draft2019_09),
            _ => None,
        }
    }

    pub fn mask(self) -> DraftMask {
        DraftMask(1 << self as u8)
    }

    /// Name of the identifier keyword.
    pub fn id_keyword(self) -> &'static str {
        match self {
            Draft::Draft04 => "id",
            _ => "$id",
        }
    }

    pub fn supports_boolean_schemas(self) -> bool {
        self >= Draft::Draft06
    }

    /// Up to draft 07 a `$ref` makes every sibling keyword inert.
    pub fn ref_overrides_siblings(self) -> bool {
        self <= Draft::Draft07
    }
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Draft::Draft04 => "draft-04",
            Draft::Draft06 => "draft-06",
            Draft::Draft07 => "draft-07",
            Draft::Draft2019_09 => "2019-09",
        };
        f.write_str(name)
    }
}

/// A set of drafts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DraftMask(u8);

impl DraftMask {
    pub const NONE: DraftMask = DraftMask(0);
    pub const DRAFT04: DraftMask = DraftMask(1 << Draft::Draft04 as u8);
    pub const DRAFT06: DraftMask = DraftMask(1 << Draft::Draft06 as u8);
    pub const DRAFT07: DraftMask = DraftMask(1 << Draft::Draft07 as u8);
    pub const DRAFT2019_09: DraftMask = DraftMask(1 << Draft::Draft2019_09 as u8);
    pub const ALL: DraftMask = DraftMask(0b1111);

    /// Every draft from `first` on.
    pub const fn since(first: Draft) -> DraftMask {
        DraftMask(0b1111 & !((1 << first as u8) - 1))
    }

    /// Every draft up to and including `last`.
    pub const fn until(last: Draft) -> DraftMask {
        DraftMask((1 << (last as u8 + 1)) - 1)
    }

    pub fn contains(self, draft: Draft) -> bool {
        self.0 & draft.mask().0 != 0
    }

    pub fn intersects(self, other: DraftMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn drafts(self) -> impl Iterator<Item = Draft> {
        Draft::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl From<Draft> for DraftMask {
    fn from(draft: Draft) -> Self {
        draft.mask()
    }
}

impl BitOr for DraftMask {
    type Output = DraftMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        DraftMask(self.0 | rhs.0)
    }
}

impl BitAnd for DraftMask {
    type Output = DraftMask;

    fn bitand(self, rhs: Self) -> Self::Output {
        DraftMask(self.0 & rhs.0)
    }
}

impl fmt::Debug for DraftMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.drafts()).finish()
    }
}

/// The vocabularies of the 2019-09 dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vocabulary {
    Core,
    Applicator,
    Validation,
    MetaData,
    Format,
    Content,
}

impl Vocabulary {
    pub const ALL: [Vocabulary; 6] = [
        Vocabulary::Core,
        Vocabulary::Applicator,
        Vocabulary::Validation,
        Vocabulary::MetaData,
        Vocabulary::Format,
        Vocabulary::Content,
    ];

    pub fn uri(self) -> &'static str {
        match self {
            Vocabulary::Core => "https://json-schema.org/draft/2019-09/vocab/core",
            Vocabulary::Applicator => "https://json-schema.org/draft/2019-09/vocab/applicator",
            Vocabulary::Validation => "https://json-schema.org/draft/2019-09/vocab/validation",
            Vocabulary::MetaData => "https://json-schema.org/draft/2019-09/vocab/meta-data",
            Vocabulary::Format => "https://json-schema.org/draft/2019-09/vocab/format",
            Vocabulary::Content => "https://json-schema.org/draft/2019-09/vocab/content",
        }
    }

    pub fn from_uri(uri: &str) -> Option<Vocabulary> {
        Vocabulary::ALL.into_iter().find(|v| v.uri() == uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_schema_uri() {
        assert_eq!(
            Draft::from_schema_uri("http://json-schema.org/draft-07/schema#"),
            Some(Draft::Draft07)
        );
        assert_eq!(
            Draft::from_schema_uri("http://json-schema.org/draft-04/schema"),
            Some(Draft::Draft04)
        );
        assert_eq!(
            Draft::from_schema_uri("https://json-schema.org/draft/2019-09/schema"),
            Some(Draft::Draft2019_09)
        );
        assert_eq!(Draft::from_schema_uri("http://example.com/schema"), None);
    }

    #[test]
    fn test_masks() {
        let m = DraftMask::since(Draft::Draft06);
        assert!(!m.contains(Draft::Draft04));
        assert!(m.contains(Draft::Draft06));
        assert!(m.contains(Draft::Draft2019_09));

        let m = DraftMask::until(Draft::Draft07);
        assert!(m.contains(Draft::Draft04));
        assert!(m.contains(Draft::Draft07));
        assert!(!m.contains(Draft::Draft2019_09));

        assert_eq!(DraftMask::since(Draft::Draft04), DraftMask::ALL);
        assert_eq!(DraftMask::until(Draft::Draft2019_09), DraftMask::ALL);
        assert_eq!(
            (DraftMask::DRAFT04 | DraftMask::DRAFT07).drafts().collect::<Vec<_>>(),
            vec![Draft::Draft04, Draft::Draft07]
        );
    }

    #[test]
    fn test_vocabulary_uri_roundtrip() {
        for v in Vocabulary::ALL {
            assert_eq!(Vocabulary::from_uri(v.uri()), Some(v));
        }
    }
}
