//! Resolution policy over raw index matches
//!
//! The index returns every definition matching any suffix level of a query,
//! with duplicates across levels. This module turns that raw sequence into
//! the final candidate set: deduplicate per owning document (keeping the
//! highest match level), order deterministically, optionally drop matches
//! from foreign workspace roots, and apply the configured filter mode.

use std::collections::HashMap;

use crate::models::{DocumentId, Match, MatchFilter};

/// Parse a raw reference into path components.
///
/// Accepts both the interpolation form `${a.b.c}` and the bare dotted form
/// `a.b.c`. Empty segments are dropped; an empty or degenerate reference
/// yields an empty path (resolution of which yields no matches, not an
/// error).
pub fn parse_reference(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(trimmed);

    inner
        .split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Apply the resolution policy to raw query output.
///
/// `root_of` maps a document to its workspace root, when it has one; the
/// isolation filter only engages when `isolate` is set and the source
/// document itself resolves to a root.
pub fn resolve<R: PartialEq>(
    raw_matches: Vec<Match>,
    query_len: usize,
    filter: MatchFilter,
    isolate: bool,
    source: Option<&DocumentId>,
    root_of: impl Fn(&DocumentId) -> Option<R>,
) -> Vec<Match> {
    // Deduplicate by owning document, keeping the highest match level.
    // The comparison is explicit: the outcome must not depend on the
    // iteration order of the raw matches.
    let mut best: HashMap<DocumentId, Match> = HashMap::new();
    for candidate in raw_matches {
        match best.get(&candidate.definition.document) {
            Some(existing) if existing.level >= candidate.level => {}
            _ => {
                best.insert(candidate.definition.document.clone(), candidate);
            }
        }
    }

    let mut matches: Vec<Match> = best.into_values().collect();
    matches.sort_by(|a, b| {
        b.level
            .cmp(&a.level)
            .then_with(|| a.definition.document.cmp(&b.definition.document))
    });

    if isolate {
        if let Some(source_root) = source.and_then(&root_of) {
            matches.retain(|m| {
                root_of(&m.definition.document).as_ref() == Some(&source_root)
            });
        }
    }

    match filter {
        MatchFilter::All => matches,
        MatchFilter::TopMatches => {
            // Highest level present in this result set, not globally
            let Some(top) = matches.first().map(|m| m.level) else {
                return Vec::new();
            };
            matches.retain(|m| m.level == top);
            matches
        }
        MatchFilter::PerfectMatches => {
            matches.retain(|m| m.level == query_len);
            matches
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KeyDefinition, Span};
    use std::sync::Arc;

    fn entry(doc: &str, path: &[&str], level: usize) -> Match {
        Match {
            definition: Arc::new(KeyDefinition {
                logical_path: path.iter().map(|s| s.to_string()).collect(),
                document: DocumentId::new(doc),
                span: Span::new(1, 0, 1, 1),
            }),
            level,
        }
    }

    fn no_roots(_: &DocumentId) -> Option<usize> {
        None
    }

    #[test]
    fn test_parse_reference_forms() {
        assert_eq!(parse_reference("${a.b.c}"), vec!["a", "b", "c"]);
        assert_eq!(parse_reference("a.b.c"), vec!["a", "b", "c"]);
        assert_eq!(parse_reference(" ${ a.b } "), vec!["a", "b"]);
        assert_eq!(parse_reference("a..b"), vec!["a", "b"]);
        assert!(parse_reference("${}").is_empty());
        assert!(parse_reference("").is_empty());
        assert!(parse_reference("...").is_empty());
    }

    #[test]
    fn test_dedup_keeps_highest_level() {
        // Same document matching at levels 1 and 3, in both input orders
        for input in [
            vec![entry("doc.yaml", &["a", "b", "c"], 3), entry("doc.yaml", &["x", "c"], 1)],
            vec![entry("doc.yaml", &["x", "c"], 1), entry("doc.yaml", &["a", "b", "c"], 3)],
        ] {
            let out = resolve(input, 3, MatchFilter::All, false, None, no_roots);
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].level, 3);
        }
    }

    #[test]
    fn test_sort_level_then_document() {
        let out = resolve(
            vec![
                entry("b.yaml", &["k"], 1),
                entry("a.yaml", &["k"], 1),
                entry("c.yaml", &["x", "k"], 2),
            ],
            2,
            MatchFilter::All,
            false,
            None,
            no_roots,
        );
        let order: Vec<&str> = out
            .iter()
            .map(|m| m.definition.document.as_str())
            .collect();
        assert_eq!(order, vec!["c.yaml", "a.yaml", "b.yaml"]);
    }

    #[test]
    fn test_filter_modes_on_mixed_levels() {
        // Levels {3, 3, 2, 1} with query length 3
        let raw = || {
            vec![
                entry("p.yaml", &["a", "b", "c"], 3),
                entry("q.yaml", &["a", "b", "c"], 3),
                entry("r.yaml", &["b", "c"], 2),
                entry("s.yaml", &["c"], 1),
            ]
        };

        let all = resolve(raw(), 3, MatchFilter::All, false, None, no_roots);
        assert_eq!(all.len(), 4);

        let top = resolve(raw(), 3, MatchFilter::TopMatches, false, None, no_roots);
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|m| m.level == 3));

        let perfect = resolve(raw(), 3, MatchFilter::PerfectMatches, false, None, no_roots);
        assert_eq!(perfect.len(), 2);
        assert!(perfect.iter().all(|m| m.level == 3));
    }

    #[test]
    fn test_top_matches_is_relative_to_result_set() {
        // Best match is level 2 out of a length-3 query; top keeps it,
        // perfect rejects it
        let raw = || vec![entry("p.yaml", &["b", "c"], 2), entry("q.yaml", &["c"], 1)];

        let top = resolve(raw(), 3, MatchFilter::TopMatches, false, None, no_roots);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].level, 2);

        let perfect = resolve(raw(), 3, MatchFilter::PerfectMatches, false, None, no_roots);
        assert!(perfect.is_empty());
    }

    #[test]
    fn test_isolation_drops_foreign_roots() {
        let root_of = |doc: &DocumentId| match doc.as_str() {
            "main/conf.yaml" | "main/other.yaml" => Some(0usize),
            "vendor/conf.yaml" => Some(1usize),
            _ => None,
        };
        let source = DocumentId::new("main/conf.yaml");

        let out = resolve(
            vec![
                entry("main/other.yaml", &["k"], 1),
                entry("vendor/conf.yaml", &["k"], 1),
                entry("rootless.yaml", &["k"], 1),
            ],
            1,
            MatchFilter::All,
            true,
            Some(&source),
            root_of,
        );
        let docs: Vec<&str> = out.iter().map(|m| m.definition.document.as_str()).collect();
        assert_eq!(docs, vec!["main/other.yaml"]);
    }

    #[test]
    fn test_isolation_skipped_without_source_root() {
        let out = resolve(
            vec![entry("a.yaml", &["k"], 1), entry("b.yaml", &["k"], 1)],
            1,
            MatchFilter::All,
            true,
            Some(&DocumentId::new("outside.yaml")),
            no_roots,
        );
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        for filter in [
            MatchFilter::All,
            MatchFilter::TopMatches,
            MatchFilter::PerfectMatches,
        ] {
            assert!(resolve(Vec::new(), 2, filter, true, None, no_roots).is_empty());
        }
    }
}
