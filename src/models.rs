//! Core data models for Keyref
//!
//! These structures represent the normalized, deterministic output format
//! that Keyref provides to editors and other programmatic consumers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Represents a source location span (line:col range)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Starting line number (1-indexed)
    pub start_line: usize,
    /// Starting column number (0-indexed)
    pub start_col: usize,
    /// Ending line number (1-indexed)
    pub end_line: usize,
    /// Ending column number (0-indexed)
    pub end_col: usize,
}

impl Span {
    pub fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

/// Identifies a tracked document.
///
/// The identifier is the document's path string: stable across content
/// edits, distinct across files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One occurrence of a key in a document.
///
/// The logical path is the document's directory components (workspace-relative,
/// file stem included) followed by the chain of nested keys leading to this
/// definition. Always non-empty. Multiple definitions may share a path;
/// uniqueness is never assumed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyDefinition {
    /// Full logical path, outermost component first
    pub logical_path: Vec<String>,
    /// Owning document
    pub document: DocumentId,
    /// Where the key token appears in the document
    pub span: Span,
}

impl KeyDefinition {
    /// The logical path rendered in dotted reference form
    pub fn dotted_path(&self) -> String {
        self.logical_path.join(".")
    }
}

/// A query result: a definition paired with the suffix length that matched
#[derive(Debug, Clone)]
pub struct Match {
    pub definition: std::sync::Arc<KeyDefinition>,
    /// Number of trailing path components the query matched
    pub level: usize,
}

/// Serializable match shape for CLI/JSON consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedMatch {
    /// Path of the owning document
    pub path: String,
    /// Full logical path of the matched definition, dotted
    pub key: String,
    /// Location of the key token
    pub span: Span,
    /// Suffix length the query matched, in path components
    pub level: usize,
}

impl From<&Match> for ResolvedMatch {
    fn from(m: &Match) -> Self {
        Self {
            path: m.definition.document.0.clone(),
            key: m.definition.dotted_path(),
            span: m.definition.span.clone(),
            level: m.level,
        }
    }
}

/// How resolution narrows the candidate set after ranking
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, EnumString, Display,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MatchFilter {
    /// Return every deduplicated match
    All,
    /// Keep only matches at the highest level present in the result set
    #[default]
    #[strum(serialize = "top", serialize = "top-matches")]
    TopMatches,
    /// Keep only matches whose level equals the full query length
    #[strum(serialize = "perfect", serialize = "perfect-matches")]
    PerfectMatches,
}

/// Statistics about the in-memory index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Documents currently contributing definitions
    pub total_documents: usize,
    /// Key definitions held by the index
    pub total_definitions: usize,
    /// Distinct suffix buckets
    pub total_suffixes: usize,
    /// Last update timestamp (RFC 3339)
    pub last_updated: String,
}
