//! Search-index record for a crawled kustomization or resource file.
//!
//! `document_data`, `file_path`, `repository_url`, `identifiers` and `values`
//! are meant for full-text queries; `kinds`, `creation_time_epoch_ms` and
//! `file_type` are filters or display metadata.
//!
//! Identifiers are colon-delimited paths (`spec:replicas`) and values append
//! the leaf after `=` (`spec:replicas=4`). Keeping them as flat strings lets the
//! index apply fuzzy, wildcard and regex matching to structure.

use crate::decoder::Decoder;
use crate::document::Document;
use crate::parser::{DocumentParser, ParseError};
use crate::references::ReferenceSelection;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A [`Document`] plus the fields derived from parsing its content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Underlying crawl document.
    #[serde(flatten)]
    pub document: Document,
    /// Distinct kinds present in the file, sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<String>,
    /// Partial and full identifier paths, sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<String>,
    /// `path=value` entries, sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl IndexedDocument {
    /// Wraps a document with empty derived fields.
    pub fn new(document: Document) -> Self {
        Self {
            document,
            ..Self::default()
        }
    }

    /// Parses the document content and sets kinds, identifiers and values.
    ///
    /// The fields are cleared first and only written once parsing succeeds, so
    /// a failed parse leaves all three empty.
    pub fn parse_yaml<D: Decoder>(&mut self, parser: &DocumentParser<D>) -> Result<(), ParseError> {
        self.kinds.clear();
        self.identifiers.clear();
        self.values.clear();

        let fields = parser.parse(&self.document)?;
        self.kinds = fields.kinds;
        self.identifiers = fields.identifiers;
        self.values = fields.values;
        Ok(())
    }

    /// Documents referenced by this file when it is a manifest.
    pub fn get_resources<D: Decoder>(
        &self,
        parser: &DocumentParser<D>,
        selection: ReferenceSelection,
    ) -> Result<Vec<Document>, ParseError> {
        parser.references(&self.document, selection)
    }
}

impl From<Document> for IndexedDocument {
    fn from(document: Document) -> Self {
        Self::new(document)
    }
}

impl fmt::Display for IndexedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doc = &self.document;
        write!(
            f,
            "{} {} {} {:?} {} {:?} len(identifiers):{} len(values):{}",
            doc.repository_url,
            doc.file_path,
            doc.default_branch,
            doc.creation_time_epoch_ms,
            doc.is_same,
            self.kinds,
            self.identifiers.len(),
            self.values.len()
        )
    }
}
