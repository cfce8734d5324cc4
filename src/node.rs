//! Closed data model for decoded structured documents.
//!
//! Decoders hand the rest of the crate a tree of [`Node`] values instead of a
//! dynamically typed map. Scalars keep their YAML type so callers can tell a
//! string `kind` from a numeric one, but every scalar also has exactly one
//! canonical text form (its `Display` impl) which is what lands in the index.

use std::collections::HashMap;
use std::fmt;

/// One decoded value: a mapping, a sequence, or a scalar leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// String-keyed mapping, in source order.
    Mapping(Mapping),
    /// Ordered list of values.
    Sequence(Vec<Node>),
    /// Leaf value.
    Scalar(Scalar),
}

impl Node {
    /// Returns the mapping when this node is one.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    /// Returns the string payload of a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(scalar) => scalar.as_str(),
            _ => None,
        }
    }

    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Mapping(_) => "mapping",
            Self::Sequence(_) => "sequence",
            Self::Scalar(_) => "scalar",
        }
    }
}

/// String-keyed mapping that preserves insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(String, Node)>,
    index: HashMap<String, usize>,
}

impl Mapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`, replacing any previous value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: Node) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Looks up the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

/// Leaf value with its canonical text form.
///
/// Canonical forms:
/// - strings are verbatim
/// - booleans are `true` / `false`
/// - null is `null`
/// - integers are plain decimal
/// - integral floats below `1e16` print as integers (`3.0` is `3`), other finite
///   floats use the shortest round-trip form (`1.5`, `1e20`), and non-finite
///   floats use the YAML spellings `.inf`, `-.inf`, `.nan`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    /// Explicit or implicit null.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Number, already in canonical text form.
    Number(String),
    /// String literal.
    String(String),
}

impl Scalar {
    /// Builds a number scalar from any integer type.
    pub fn integer<T: fmt::Display>(value: T) -> Self {
        Self::Number(value.to_string())
    }

    /// Builds a number scalar from a float.
    pub fn float(value: f64) -> Self {
        Self::Number(format_float(value))
    }

    /// Returns the payload of a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) | Self::String(value) => f.write_str(value),
        }
    }
}

fn format_float(value: f64) -> String {
    if value.is_nan() {
        return ".nan".to_string();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { ".inf" } else { "-.inf" };
        return text.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e16 {
        return format!("{}", value as i64);
    }
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_render_canonically() {
        assert_eq!(Scalar::Null.to_string(), "null");
        assert_eq!(Scalar::Bool(false).to_string(), "false");
        assert_eq!(Scalar::integer(-7i64).to_string(), "-7");
        assert_eq!(Scalar::integer(u64::MAX).to_string(), "18446744073709551615");
        assert_eq!(Scalar::String("web".into()).to_string(), "web");
    }

    #[test]
    fn floats_pin_their_text_form() {
        assert_eq!(Scalar::float(3.0).to_string(), "3");
        assert_eq!(Scalar::float(-0.0).to_string(), "0");
        assert_eq!(Scalar::float(1.5).to_string(), "1.5");
        assert_eq!(Scalar::float(0.1).to_string(), "0.1");
        assert_eq!(Scalar::float(1e20).to_string(), "1e20");
        assert_eq!(Scalar::float(f64::INFINITY).to_string(), ".inf");
        assert_eq!(Scalar::float(f64::NEG_INFINITY).to_string(), "-.inf");
        assert_eq!(Scalar::float(f64::NAN).to_string(), ".nan");
    }

    #[test]
    fn mapping_insert_replaces_in_place() {
        let text = |value: &str| Node::Scalar(Scalar::String(value.to_string()));
        let mut mapping = Mapping::new();
        mapping.insert("a", text("1"));
        mapping.insert("b", text("2"));
        mapping.insert("a", text("3"));

        let keys: Vec<&str> = mapping.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(mapping.get("a").and_then(Node::as_str), Some("3"));
        assert!(mapping.get("missing").is_none());
    }

    #[test]
    fn large_mappings_keep_order_and_lookup() {
        let mapping: Mapping = (0..5000)
            .map(|n| (format!("key-{n}"), Node::Scalar(Scalar::integer(n))))
            .collect();
        assert_eq!(mapping.len(), 5000);
        assert_eq!(mapping.iter().next().map(|(key, _)| key), Some("key-0"));
        assert_eq!(mapping.iter().last().map(|(key, _)| key), Some("key-4999"));
        assert_eq!(
            mapping.get("key-4321"),
            Some(&Node::Scalar(Scalar::Number("4321".to_string())))
        );
    }
}
