//! Collection and item identifiers.
//!
//! Both ids end up embedded in store keys of the form
//! `stats:{collection}:{item}`, so anything that would break that layout is
//! rejected at the boundary. Collection ids are also used as file names and
//! URL path segments, so they are held to a narrower alphabet.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Characters that would corrupt the store key schema or a prefix scan.
const RESERVED_CHARS: [char; 2] = [':', '*'];

fn validate(kind: &'static str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing(kind));
    }
    if let Some(c) = trimmed
        .chars()
        .find(|c| RESERVED_CHARS.contains(c) || c.is_control())
    {
        return Err(ValidationError::Malformed {
            field: kind,
            reason: format!("contains reserved character {:?}", c),
        });
    }
    Ok(trimmed.to_string())
}

/// Collection ids become `{dir}/{id}.jsonl`, `{cache}/{id}.json` and
/// `{base_url}/{id}`: only `[A-Za-z0-9_-]` is allowed.
fn validate_path_segment(kind: &'static str, raw: &str) -> Result<String, ValidationError> {
    let id = validate(kind, raw)?;
    if let Some(c) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(ValidationError::Malformed {
            field: kind,
            reason: format!("contains {:?}; only letters, digits, '-' and '_' are allowed", c),
        });
    }
    Ok(id)
}

/// Identifies a catalog of candidates (e.g. one artist's discography).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionId(String);

impl CollectionId {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        validate_path_segment("collectionId", raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifies one candidate inside a collection.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        validate("itemId", raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! id_impls {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($ty), "({})"), self.0)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ValidationError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$ty> for String {
            fn from(id: $ty) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

id_impls!(CollectionId);
id_impls!(ItemId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let id = ItemId::parse("  abc123 ").unwrap();
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert!(matches!(
            CollectionId::parse("   "),
            Err(ValidationError::Missing("collectionId"))
        ));
    }

    #[test]
    fn test_parse_rejects_key_separator() {
        assert!(ItemId::parse("a:b").is_err());
        assert!(CollectionId::parse("bts*").is_err());
    }

    #[test]
    fn test_collection_id_rejects_path_traversal() {
        for raw in ["../x", "a/b", "..", "a\\b", "bts.jsonl", "bts%2F", "b\u{0}ts"] {
            assert!(
                matches!(
                    CollectionId::parse(raw),
                    Err(ValidationError::Malformed { field: "collectionId", .. })
                ),
                "{:?} should be rejected",
                raw
            );
        }
        assert_eq!(CollectionId::parse("bts_2013-2024").unwrap().as_str(), "bts_2013-2024");
    }

    #[test]
    fn test_item_id_rejects_control_characters() {
        assert!(ItemId::parse("a\nb").is_err());
        // item ids never touch the filesystem
        assert!(ItemId::parse("spotify.track-1").is_ok());
    }

    #[test]
    fn test_serde_validates() {
        let ok: ItemId = serde_json::from_str("\"4ZKl\"").unwrap();
        assert_eq!(ok.as_str(), "4ZKl");

        let bad: Result<ItemId, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());

        let traversal: Result<CollectionId, _> = serde_json::from_str("\"../etc\"");
        assert!(traversal.is_err());
    }

    #[test]
    fn test_display_and_debug() {
        let id = CollectionId::parse("bts").unwrap();
        assert_eq!(format!("{}", id), "bts");
        assert_eq!(format!("{:?}", id), "CollectionId(bts)");
    }
}
