//! Flattens decoded mappings into searchable identifier paths and value entries.
//!
//! Every key reachable from a document root yields an identifier path such as
//! `spec:template:metadata:labels`, and every scalar leaf additionally yields a
//! value entry such as `spec:replicas=3`. Sequences never extend the path, so
//! all elements of a list share their parent's identifier.

use crate::node::{Mapping, Node};
use std::collections::{BTreeSet, VecDeque};

/// Separator between keys in an identifier path.
pub const PATH_SEPARATOR: char = ':';
/// Separator between an identifier path and its value.
pub const VALUE_SEPARATOR: char = '=';

/// Accumulated identifier and value sets for one file.
///
/// Both sets are ordered, so draining them yields sorted, duplicate-free output
/// regardless of the order mappings were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatStructure {
    identifiers: BTreeSet<String>,
    values: BTreeSet<String>,
}

impl FlatStructure {
    /// Creates empty accumulators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every identifier and value entry reachable from `mapping`.
    ///
    /// Nested mappings are expanded breadth-first from a worklist; sequences are
    /// walked in place under the identifier of the key that holds them.
    pub fn add_mapping(&mut self, mapping: &Mapping) {
        let mut pending: VecDeque<(&Mapping, String)> = VecDeque::new();
        pending.push_back((mapping, String::new()));

        while let Some((current, prefix)) = pending.pop_front() {
            crate::debug_log!("flatten: expanding '{}' ({} keys)", prefix, current.len());
            for (key, value) in current.iter() {
                let identifier = join_path(&prefix, key);
                self.visit(value, &identifier, &mut pending);
                self.identifiers.insert(identifier);
            }
        }
    }

    fn visit<'a>(
        &mut self,
        node: &'a Node,
        identifier: &str,
        pending: &mut VecDeque<(&'a Mapping, String)>,
    ) {
        match node {
            Node::Mapping(child) => pending.push_back((child, identifier.to_string())),
            Node::Sequence(items) => {
                for item in items {
                    self.visit(item, identifier, pending);
                }
            }
            Node::Scalar(scalar) => {
                self.values
                    .insert(format!("{identifier}{VALUE_SEPARATOR}{scalar}"));
            }
        }
    }

    /// Consumes the accumulators, returning sorted `(identifiers, values)`.
    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (
            self.identifiers.into_iter().collect(),
            self.values.into_iter().collect(),
        )
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    let joined = format!("{prefix}{PATH_SEPARATOR}{key}");
    joined.trim_start_matches(PATH_SEPARATOR).to_string()
}
