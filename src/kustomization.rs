//! Kustomization schema plus the fix-ups applied before and after decoding.

use crate::node::{Mapping, Node, Scalar};
use serde_yaml::Value;
use std::error::Error;
use std::fmt;

/// Kind assumed for manifests that do not declare one.
pub const KUSTOMIZATION_KIND: &str = "Kustomization";
/// API version assumed for manifests that do not declare one.
pub const KUSTOMIZATION_API_VERSION: &str = "kustomize.config.k8s.io/v1beta1";

/// Errors surfaced while normalizing raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    /// The content holds a NUL byte, so it is not a text document.
    Binary {
        /// Byte offset of the first NUL.
        offset: usize,
    },
}

impl fmt::Display for NormalizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary { offset } => {
                write!(f, "content looks binary (NUL byte at offset {offset})")
            }
        }
    }
}

impl Error for NormalizationError {}

/// Prepares raw content for decoding: rejects binary data, strips a BOM, and
/// converts CRLF line endings.
pub fn normalize_content(content: &str) -> Result<String, NormalizationError> {
    if let Some(offset) = content.bytes().position(|byte| byte == 0) {
        return Err(NormalizationError::Binary { offset });
    }
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    Ok(content.replace("\r\n", "\n"))
}

/// Rewrites deprecated top-level kustomization fields to their current names.
///
/// `imageTags` becomes `images`, and a `patches` list holding only file paths
/// becomes `patchesStrategicMerge`. Content that cannot be probed is returned
/// unchanged.
pub fn fix_pre_decode(content: String) -> String {
    let legacy_patches = uses_legacy_patches(&content);
    if !legacy_patches && !content.contains("imageTags:") {
        return content;
    }

    let mut fixed = String::with_capacity(content.len() + 16);
    for line in content.split_inclusive('\n') {
        if let Some(rest) = line.strip_prefix("imageTags:") {
            fixed.push_str("images:");
            fixed.push_str(rest);
        } else if let Some(rest) = line.strip_prefix("patches:").filter(|_| legacy_patches) {
            fixed.push_str("patchesStrategicMerge:");
            fixed.push_str(rest);
        } else {
            fixed.push_str(line);
        }
    }
    fixed
}

fn uses_legacy_patches(content: &str) -> bool {
    let Ok(Value::Mapping(root)) = serde_yaml::from_str::<Value>(content) else {
        return false;
    };
    match root.get("patches") {
        Some(Value::Sequence(items)) => !items.is_empty() && items.iter().all(Value::is_string),
        _ => false,
    }
}

/// The parts of a kustomization the crawler reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kustomization {
    /// `apiVersion` field.
    pub api_version: String,
    /// `kind` field.
    pub kind: String,
    /// Paths listed under `resources`.
    pub resources: Vec<String>,
    /// Deprecated `bases` list, folded into `resources` by [`Kustomization::fix_post_decode`].
    pub bases: Vec<String>,
    /// Paths listed under `generators`.
    pub generators: Vec<String>,
    /// Paths listed under `transformers`.
    pub transformers: Vec<String>,
}

impl Kustomization {
    /// Reads the typed fields out of a decoded manifest mapping.
    pub fn from_mapping(mapping: &Mapping) -> Result<Self, SchemaError> {
        Ok(Self {
            api_version: string_field(mapping, "apiVersion")?,
            kind: string_field(mapping, "kind")?,
            resources: list_field(mapping, "resources")?,
            bases: list_field(mapping, "bases")?,
            generators: list_field(mapping, "generators")?,
            transformers: list_field(mapping, "transformers")?,
        })
    }

    /// Fills defaults and folds deprecated fields into their replacements.
    pub fn fix_post_decode(&mut self) {
        if self.kind.is_empty() {
            self.kind = KUSTOMIZATION_KIND.to_string();
        }
        if self.api_version.is_empty() {
            self.api_version = KUSTOMIZATION_API_VERSION.to_string();
        }
        let bases = std::mem::take(&mut self.bases);
        self.resources.extend(bases);
    }
}

/// A kustomization field holds a value of the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Expected a scalar.
    ExpectedString {
        /// Field name.
        field: &'static str,
        /// Type label of what was found.
        found: &'static str,
    },
    /// Expected a list of scalars.
    ExpectedStringList {
        /// Field name.
        field: &'static str,
        /// Type label of what was found.
        found: &'static str,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpectedString { field, found } => {
                write!(f, "field '{field}' must be a string, found a {found}")
            }
            Self::ExpectedStringList { field, found } => {
                write!(f, "field '{field}' must be a list of strings, found a {found}")
            }
        }
    }
}

impl Error for SchemaError {}

fn string_field(mapping: &Mapping, field: &'static str) -> Result<String, SchemaError> {
    match mapping.get(field) {
        None | Some(Node::Scalar(Scalar::Null)) => Ok(String::new()),
        Some(Node::Scalar(scalar)) => Ok(scalar.to_string()),
        Some(other) => Err(SchemaError::ExpectedString {
            field,
            found: other.type_name(),
        }),
    }
}

fn list_field(mapping: &Mapping, field: &'static str) -> Result<Vec<String>, SchemaError> {
    let items = match mapping.get(field) {
        None | Some(Node::Scalar(Scalar::Null)) => return Ok(Vec::new()),
        Some(Node::Sequence(items)) => items,
        Some(other) => {
            return Err(SchemaError::ExpectedStringList {
                field,
                found: other.type_name(),
            })
        }
    };

    items
        .iter()
        .map(|item| match item {
            Node::Scalar(Scalar::Null) => Ok(String::new()),
            Node::Scalar(scalar) => Ok(scalar.to_string()),
            other => Err(SchemaError::ExpectedStringList {
                field,
                found: other.type_name(),
            }),
        })
        .collect()
}
