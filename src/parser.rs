//! Decoding dispatch and derived-field extraction for crawled documents.

use crate::decoder::{DecodeError, Decoder, YamlDecoder};
use crate::document::Document;
use crate::flatten::FlatStructure;
use crate::kustomization::{
    fix_pre_decode, normalize_content, Kustomization, NormalizationError, SchemaError,
    KUSTOMIZATION_KIND,
};
use crate::manifest::ManifestNames;
use crate::node::{Mapping, Node};
use crate::references::{extract_references, ReferenceSelection};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;
use tracing::debug;

/// Sorted, duplicate-free fields derived from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFields {
    /// Distinct kinds declared by the file's mappings.
    pub kinds: Vec<String>,
    /// Identifier paths.
    pub identifiers: Vec<String>,
    /// `path=value` entries.
    pub values: Vec<String>,
}

/// Errors that abort a parse attempt.
#[derive(Debug)]
pub enum ParseError {
    /// Pre-decode normalization failed.
    Normalization(NormalizationError),
    /// A manifest did not decode as a single mapping.
    SingleDecode(DecodeError),
    /// A resource stream did not decode.
    MultiDecode(DecodeError),
    /// A manifest decoded but its reference lists are misshapen.
    Schema(SchemaError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normalization(err) => write!(f, "could not normalize content: {err}"),
            Self::SingleDecode(err) => write!(f, "unable to parse kustomization: {err}"),
            Self::MultiDecode(err) => write!(f, "unable to parse resource: {err}"),
            Self::Schema(err) => write!(f, "could not read kustomization: {err}"),
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Normalization(err) => Some(err),
            Self::SingleDecode(err) | Self::MultiDecode(err) => Some(err),
            Self::Schema(err) => Some(err),
        }
    }
}

/// Turns document content into index fields and child references.
///
/// The parser owns its decoder and the manifest name set, so each worker can
/// hold its own instance with no shared state.
#[derive(Debug, Clone)]
pub struct DocumentParser<D = YamlDecoder> {
    decoder: D,
    manifests: ManifestNames,
}

impl DocumentParser<YamlDecoder> {
    /// Builds a YAML-backed parser recognizing the given manifest names.
    pub fn new(manifests: ManifestNames) -> Self {
        Self::with_decoder(YamlDecoder::new(), manifests)
    }
}

impl Default for DocumentParser<YamlDecoder> {
    fn default() -> Self {
        Self::new(ManifestNames::default())
    }
}

impl<D: Decoder> DocumentParser<D> {
    /// Builds a parser around an explicit decoder.
    pub fn with_decoder(decoder: D, manifests: ManifestNames) -> Self {
        Self { decoder, manifests }
    }

    /// Decodes a document into its mappings.
    ///
    /// Manifests must hold exactly one mapping; any other file is read as a
    /// stream of zero or more mappings.
    pub fn decode(&self, document: &Document) -> Result<Vec<Mapping>, ParseError> {
        let content =
            normalize_content(&document.document_data).map_err(ParseError::Normalization)?;

        if self.manifests.is_manifest(&document.file_path) {
            debug!(path = %document.file_path, "decoding manifest as a single mapping");
            let mapping = self
                .decoder
                .decode_one(&fix_pre_decode(content))
                .map_err(ParseError::SingleDecode)?;
            return Ok(vec![mapping]);
        }

        debug!(path = %document.file_path, "decoding resource stream");
        self.decoder
            .decode_many(&content)
            .map_err(ParseError::MultiDecode)
    }

    /// Computes the kinds, identifiers and values for a document.
    pub fn parse(&self, document: &Document) -> Result<ParsedFields, ParseError> {
        let mappings = self.decode(document)?;

        let mut kinds = BTreeSet::new();
        let mut flat = FlatStructure::new();
        for mapping in &mappings {
            kinds.insert(kind_of(mapping).to_string());
            flat.add_mapping(mapping);
        }

        let (identifiers, values) = flat.into_parts();
        Ok(ParsedFields {
            kinds: kinds.into_iter().collect(),
            identifiers,
            values,
        })
    }

    /// Resolves the files a manifest references, in resources, generators,
    /// transformers order.
    ///
    /// Returns an empty list for anything that is not a manifest. References that
    /// fail to resolve are logged and left out.
    pub fn references(
        &self,
        document: &Document,
        selection: ReferenceSelection,
    ) -> Result<Vec<Document>, ParseError> {
        if !self.manifests.is_manifest(&document.file_path) {
            return Ok(Vec::new());
        }

        let content =
            normalize_content(&document.document_data).map_err(ParseError::Normalization)?;
        let mapping = self
            .decoder
            .decode_one(&fix_pre_decode(content))
            .map_err(ParseError::SingleDecode)?;
        let mut kustomization = Kustomization::from_mapping(&mapping).map_err(ParseError::Schema)?;
        kustomization.fix_post_decode();

        Ok(extract_references(document, &kustomization, selection))
    }
}

fn kind_of(mapping: &Mapping) -> &str {
    match mapping.get("kind").and_then(Node::as_str) {
        Some(kind) if !kind.is_empty() => kind,
        _ => KUSTOMIZATION_KIND,
    }
}
