//! Reverse path index over key definitions
//!
//! The index holds every known key definition twice over: once under its
//! owning document (for atomic removal) and once under each suffix of its
//! logical path (for lookup). References are typically partial (a short
//! trailing fragment of the true path), so indexing every suffix trades
//! memory for constant-time lookups per query level, without the query
//! having to guess how much of its own path is real.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{DocumentId, KeyDefinition, Match};

/// Mutable in-memory store of key definitions, indexed by owning document
/// and by every path suffix.
#[derive(Debug, Default)]
pub struct ReversePathIndex {
    /// Definitions grouped by owning document, in parse order
    by_document: HashMap<DocumentId, Vec<Arc<KeyDefinition>>>,
    /// Suffix buckets; a definition with a path of length N appears in
    /// exactly N buckets, one per suffix length
    by_suffix: HashMap<Vec<String>, Vec<Arc<KeyDefinition>>>,
}

impl ReversePathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a definition under its document and every path suffix
    pub fn add(&mut self, definition: KeyDefinition) {
        debug_assert!(!definition.logical_path.is_empty());

        let definition = Arc::new(definition);

        for start in 0..definition.logical_path.len() {
            self.by_suffix
                .entry(definition.logical_path[start..].to_vec())
                .or_default()
                .push(Arc::clone(&definition));
        }

        self.by_document
            .entry(definition.document.clone())
            .or_default()
            .push(definition);
    }

    /// Remove every definition owned by a document.
    ///
    /// Buckets left empty are deleted. Removing an unindexed document is a
    /// no-op.
    pub fn remove_document(&mut self, document: &DocumentId) {
        let Some(definitions) = self.by_document.remove(document) else {
            return;
        };

        for definition in definitions {
            for start in 0..definition.logical_path.len() {
                let suffix = &definition.logical_path[start..];
                let emptied = match self.by_suffix.get_mut(suffix) {
                    Some(bucket) => {
                        bucket.retain(|entry| !Arc::ptr_eq(entry, &definition));
                        bucket.is_empty()
                    }
                    None => false,
                };
                if emptied {
                    self.by_suffix.remove(suffix);
                }
            }
        }
    }

    /// Look up every definition whose path ends in a suffix of the query.
    ///
    /// Levels are visited from the full query length down to one, so the
    /// output is ordered by level descending. A definition that matches at
    /// more than one level appears once per level; consumers deduplicate.
    pub fn query(&self, components: &[String]) -> Vec<Match> {
        let mut matches = Vec::new();

        for level in (1..=components.len()).rev() {
            let suffix = &components[components.len() - level..];
            if let Some(bucket) = self.by_suffix.get(suffix) {
                matches.extend(bucket.iter().map(|definition| Match {
                    definition: Arc::clone(definition),
                    level,
                }));
            }
        }

        matches
    }

    /// Discard everything
    pub fn clear(&mut self) {
        self.by_document.clear();
        self.by_suffix.clear();
    }

    pub fn contains_document(&self, document: &DocumentId) -> bool {
        self.by_document.contains_key(document)
    }

    /// Documents currently contributing definitions
    pub fn document_count(&self) -> usize {
        self.by_document.len()
    }

    /// Total definitions held
    pub fn definition_count(&self) -> usize {
        self.by_document.values().map(Vec::len).sum()
    }

    /// Distinct suffix buckets
    pub fn suffix_count(&self) -> usize {
        self.by_suffix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_document.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Span;

    fn definition(doc: &str, path: &[&str]) -> KeyDefinition {
        KeyDefinition {
            logical_path: path.iter().map(|s| s.to_string()).collect(),
            document: DocumentId::new(doc),
            span: Span::new(1, 0, 1, 1),
        }
    }

    fn components(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_registers_every_suffix() {
        let mut index = ReversePathIndex::new();
        index.add(definition("a/b.yaml", &["a", "b", "c"]));

        // One bucket per suffix length 1..=3
        assert_eq!(index.suffix_count(), 3);
        assert_eq!(index.query(&components(&["c"])).len(), 1);
        assert_eq!(index.query(&components(&["b", "c"]))[0].level, 2);
        assert_eq!(index.query(&components(&["a", "b", "c"]))[0].level, 3);
    }

    #[test]
    fn test_remove_document_clears_buckets() {
        let mut index = ReversePathIndex::new();
        index.add(definition("a/b.yaml", &["a", "b", "c"]));
        assert!(index.contains_document(&DocumentId::new("a/b.yaml")));

        index.remove_document(&DocumentId::new("a/b.yaml"));

        assert_eq!(index.suffix_count(), 0);
        assert_eq!(index.document_count(), 0);
        assert!(!index.contains_document(&DocumentId::new("a/b.yaml")));
        assert!(index.query(&components(&["c"])).is_empty());
    }

    #[test]
    fn test_remove_unknown_document_is_noop() {
        let mut index = ReversePathIndex::new();
        index.add(definition("a.yaml", &["x"]));

        index.remove_document(&DocumentId::new("never-added.yaml"));
        index.remove_document(&DocumentId::new("never-added.yaml"));

        assert_eq!(index.definition_count(), 1);
    }

    #[test]
    fn test_add_remove_round_trip() {
        let mut index = ReversePathIndex::new();
        index.add(definition("keep.yaml", &["shared", "key"]));

        index.add(definition("temp.yaml", &["other", "key"]));
        index.remove_document(&DocumentId::new("temp.yaml"));

        // Observably identical to before the add
        let matches = index.query(&components(&["key"]));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].definition.document.as_str(), "keep.yaml");
        assert_eq!(index.suffix_count(), 2);
    }

    #[test]
    fn test_remove_keeps_shared_buckets() {
        let mut index = ReversePathIndex::new();
        index.add(definition("one.yaml", &["deep", "lr"]));
        index.add(definition("two.yaml", &["lr"]));

        index.remove_document(&DocumentId::new("one.yaml"));

        let matches = index.query(&components(&["lr"]));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].definition.document.as_str(), "two.yaml");
    }

    #[test]
    fn test_query_levels_descend() {
        let mut index = ReversePathIndex::new();
        index.add(definition("full.yaml", &["a", "b"]));
        index.add(definition("tail.yaml", &["b"]));

        let matches = index.query(&components(&["a", "b"]));
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].level, 2);
        assert_eq!(matches[0].definition.document.as_str(), "full.yaml");
        assert_eq!(matches[1].level, 1);
    }

    #[test]
    fn test_definition_may_match_multiple_levels() {
        // Path [b, b] matches query [b, b] at level 2 and level 1
        let mut index = ReversePathIndex::new();
        index.add(definition("doc.yaml", &["b", "b"]));

        let matches = index.query(&components(&["b", "b"]));
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].level, 2);
        assert_eq!(matches[1].level, 1);
    }

    #[test]
    fn test_empty_query_yields_nothing() {
        let mut index = ReversePathIndex::new();
        index.add(definition("doc.yaml", &["a"]));
        assert!(index.query(&[]).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut index = ReversePathIndex::new();
        index.add(definition("doc.yaml", &["a", "b"]));
        index.clear();

        assert!(index.is_empty());
        assert_eq!(index.suffix_count(), 0);
    }

    #[test]
    fn test_change_replaces_definitions_atomically() {
        let mut index = ReversePathIndex::new();
        let doc = DocumentId::new("conf.yaml");
        index.add(definition("conf.yaml", &["old"]));

        index.remove_document(&doc);
        index.add(definition("conf.yaml", &["new"]));

        assert!(index.query(&components(&["old"])).is_empty());
        assert_eq!(index.query(&components(&["new"])).len(), 1);
    }
}
