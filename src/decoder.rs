//! Structured-data decoding into the [`Node`](crate::node::Node) model.
//!
//! The parser never talks to `serde_yaml` directly; it is handed a [`Decoder`]
//! at construction so callers can swap the implementation and so no decoder
//! state is shared between documents processed on different threads.

use crate::node::{Mapping, Node, Scalar};
use serde::Deserialize;
use serde_yaml::Value;
use std::error::Error;
use std::fmt;

/// Decodes raw text into string-keyed mappings.
pub trait Decoder {
    /// Decodes content that must hold exactly one mapping. Blank content is an empty mapping.
    fn decode_one(&self, content: &str) -> Result<Mapping, DecodeError>;

    /// Decodes a stream of zero or more mappings.
    fn decode_many(&self, content: &str) -> Result<Vec<Mapping>, DecodeError>;
}

/// YAML (and therefore JSON) decoder backed by `serde_yaml`.
///
/// Merge keys (`<<: *anchor`) are resolved before conversion, with keys
/// written in the mapping itself taking precedence. Multi-document streams
/// skip empty documents, and a document whose `kind` ends in `List` with an
/// `items` sequence is expanded into its items.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDecoder;

impl YamlDecoder {
    /// Creates a decoder.
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for YamlDecoder {
    fn decode_one(&self, content: &str) -> Result<Mapping, DecodeError> {
        if is_blank(content) {
            return Ok(Mapping::new());
        }
        let mut value: Value = serde_yaml::from_str(content).map_err(DecodeError::Syntax)?;
        value.apply_merge().map_err(DecodeError::Syntax)?;
        match to_node(value)? {
            Node::Mapping(mapping) => Ok(mapping),
            Node::Scalar(Scalar::Null) => Ok(Mapping::new()),
            other => Err(DecodeError::NotAMapping {
                document: 0,
                found: other.type_name(),
            }),
        }
    }

    fn decode_many(&self, content: &str) -> Result<Vec<Mapping>, DecodeError> {
        let mut mappings = Vec::new();
        if is_blank(content) {
            return Ok(mappings);
        }
        for (index, document) in serde_yaml::Deserializer::from_str(content).enumerate() {
            let mut value = Value::deserialize(document).map_err(DecodeError::Syntax)?;
            value.apply_merge().map_err(DecodeError::Syntax)?;
            match to_node(value)? {
                Node::Mapping(mapping) => push_expanded(&mut mappings, mapping, index)?,
                Node::Scalar(Scalar::Null) => continue,
                other => {
                    return Err(DecodeError::NotAMapping {
                        document: index,
                        found: other.type_name(),
                    })
                }
            }
        }
        Ok(mappings)
    }
}

/// Errors surfaced while decoding structured content.
#[derive(Debug)]
pub enum DecodeError {
    /// The content is not well-formed YAML.
    Syntax(serde_yaml::Error),
    /// A top-level document (or list item) is not a mapping.
    NotAMapping {
        /// Zero-based document index within the stream.
        document: usize,
        /// Type label of the offending value.
        found: &'static str,
    },
    /// A mapping key is itself a mapping or sequence.
    ComplexKey,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(err) => write!(f, "yaml syntax error: {err}"),
            Self::NotAMapping { document, found } => {
                write!(f, "document {document} is a {found}, expected a mapping")
            }
            Self::ComplexKey => write!(f, "mapping keys must be scalars"),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Syntax(err) => Some(err),
            Self::NotAMapping { .. } | Self::ComplexKey => None,
        }
    }
}

pub(crate) fn is_blank(content: &str) -> bool {
    content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

fn push_expanded(
    mappings: &mut Vec<Mapping>,
    mapping: Mapping,
    index: usize,
) -> Result<(), DecodeError> {
    let is_list = mapping
        .get("kind")
        .and_then(Node::as_str)
        .is_some_and(|kind| kind.ends_with("List"));
    match mapping.get("items") {
        Some(Node::Sequence(items)) if is_list => {
            for item in items {
                match item {
                    Node::Mapping(inner) => mappings.push(inner.clone()),
                    other => {
                        return Err(DecodeError::NotAMapping {
                            document: index,
                            found: other.type_name(),
                        })
                    }
                }
            }
        }
        _ => mappings.push(mapping),
    }
    Ok(())
}

fn to_node(value: Value) -> Result<Node, DecodeError> {
    let node = match value {
        Value::Null => Node::Scalar(Scalar::Null),
        Value::Bool(flag) => Node::Scalar(Scalar::Bool(flag)),
        Value::Number(number) => Node::Scalar(number_scalar(&number)),
        Value::String(text) => Node::Scalar(Scalar::String(text)),
        Value::Sequence(items) => Node::Sequence(
            items
                .into_iter()
                .map(to_node)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Mapping(entries) => {
            let mut mapping = Mapping::new();
            for (key, value) in entries {
                mapping.insert(key_string(key)?, to_node(value)?);
            }
            Node::Mapping(mapping)
        }
        Value::Tagged(tagged) => to_node(tagged.value)?,
    };
    Ok(node)
}

fn number_scalar(number: &serde_yaml::Number) -> Scalar {
    if let Some(value) = number.as_i64() {
        Scalar::integer(value)
    } else if let Some(value) = number.as_u64() {
        Scalar::integer(value)
    } else {
        Scalar::float(number.as_f64().unwrap_or(f64::NAN))
    }
}

fn key_string(key: Value) -> Result<String, DecodeError> {
    match to_node(key)? {
        Node::Scalar(scalar) => Ok(scalar.to_string()),
        Node::Mapping(_) | Node::Sequence(_) => Err(DecodeError::ComplexKey),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::FlatStructure;

    #[test]
    fn decode_one_reads_single_mapping() {
        let mapping = YamlDecoder
            .decode_one("kind: Kustomization\nresources:\n  - a.yaml\n")
            .expect("decode");
        assert_eq!(mapping.get("kind").and_then(Node::as_str), Some("Kustomization"));
        assert!(matches!(
            mapping.get("resources"),
            Some(Node::Sequence(items)) if items.len() == 1
        ));
    }

    #[test]
    fn blank_content_is_empty_mapping() {
        assert!(YamlDecoder.decode_one("").expect("decode").is_empty());
        assert!(YamlDecoder.decode_one("# just a comment\n").expect("decode").is_empty());
        assert!(YamlDecoder.decode_many("\n\n").expect("decode").is_empty());
    }

    #[test]
    fn decode_one_rejects_non_mappings() {
        let err = YamlDecoder.decode_one("- a\n- b\n").expect_err("sequence");
        assert!(matches!(err, DecodeError::NotAMapping { found: "sequence", .. }));
        let err = YamlDecoder.decode_one("key: [unclosed").expect_err("syntax");
        assert!(matches!(err, DecodeError::Syntax(_)));
    }

    #[test]
    fn decode_many_skips_empty_documents() {
        let content = "---\nkind: Service\n---\n---\nkind: Deployment\n";
        let mappings = YamlDecoder.decode_many(content).expect("decode");
        let kinds: Vec<_> = mappings
            .iter()
            .filter_map(|m| m.get("kind").and_then(Node::as_str))
            .collect();
        assert_eq!(kinds, vec!["Service", "Deployment"]);
    }

    #[test]
    fn decode_many_expands_lists() {
        let content = "apiVersion: v1\nkind: List\nitems:\n  - kind: ConfigMap\n  - kind: Secret\n";
        let mappings = YamlDecoder.decode_many(content).expect("decode");
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[1].get("kind").and_then(Node::as_str), Some("Secret"));
    }

    #[test]
    fn scalar_keys_are_stringified() {
        let mapping = YamlDecoder
            .decode_one("80: http\ntrue: yes\nratio: 2.0\n")
            .expect("decode");
        let keys: Vec<&str> = mapping.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["80", "true", "ratio"]);
        assert_eq!(
            mapping.get("ratio"),
            Some(&Node::Scalar(Scalar::Number("2".to_string())))
        );
        let err = YamlDecoder.decode_one("? [a, b]\n: c\n").expect_err("complex key");
        assert!(matches!(err, DecodeError::ComplexKey));
    }

    #[test]
    fn merge_keys_are_resolved() {
        let content = "base: &b\n  replicas: 3\n  paused: false\nspec:\n  <<: *b\n  paused: true\n";
        let mapping = YamlDecoder.decode_one(content).expect("decode");
        let spec = mapping.get("spec").and_then(Node::as_mapping).expect("spec");
        assert!(spec.get("<<").is_none());
        assert_eq!(
            spec.get("replicas"),
            Some(&Node::Scalar(Scalar::Number("3".to_string())))
        );
        assert_eq!(spec.get("paused"), Some(&Node::Scalar(Scalar::Bool(true))));

        let mut flat = FlatStructure::new();
        for mapping in YamlDecoder.decode_many(content).expect("decode stream") {
            flat.add_mapping(&mapping);
        }
        let (identifiers, values) = flat.into_parts();
        assert!(values.contains(&"spec:replicas=3".to_string()));
        assert!(values.contains(&"spec:paused=true".to_string()));
        assert!(identifiers.iter().all(|identifier| !identifier.contains("<<")));
    }
}
