#![warn(missing_docs)]
//! Core library entry points for the kustcrawl manifest indexer.
//!
//! A crawled file is decoded, its kinds are collected, and its structure is
//! flattened into identifier paths and `path=value` entries for full-text
//! search. Kustomization manifests additionally yield the documents they
//! reference so a crawler can schedule them next.

pub mod controls;
pub mod decoder;
pub mod document;
pub mod flatten;
pub mod frontier;
pub mod indexed;
pub mod kustomization;
pub mod manifest;
pub mod node;
pub mod parser;
pub mod references;
pub mod repository;
pub mod runtime;

pub use controls::{Cli, IndexControls};
pub use decoder::{DecodeError, Decoder, YamlDecoder};
pub use document::{Document, FileType, ResolveError};
pub use flatten::FlatStructure;
pub use frontier::{CrawlTask, Frontier, FrontierError, DEFAULT_FRONTIER_CAPACITY};
pub use indexed::IndexedDocument;
pub use kustomization::{Kustomization, NormalizationError, SchemaError};
pub use manifest::{is_manifest, ManifestNames, DEFAULT_MANIFEST_NAMES};
pub use node::{Mapping, Node, Scalar};
pub use parser::{DocumentParser, ParseError, ParsedFields};
pub use references::{collect_documents, extract_references, ReferenceSelection};
pub use repository::{LocalRepository, RepositoryError};
pub use runtime::{run as run_crawler, CrawlStats};

#[cfg(feature = "debug_logs")]
#[macro_export]
// This allows use of the `eprintln!` macro via `debug_log!` macro.
macro_rules! debug_log {
        ($($arg:tt)*) => {
            eprintln!($($arg)*);
        };
    }
#[cfg(not(feature = "debug_logs"))]
#[macro_export]
// This effectively disables the `eprintln!` macro, effectively removing it from the code during
// compilation.
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}
