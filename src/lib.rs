//! Keyref: workspace indexer and reverse-path resolver for configuration keys
//!
//! Keyref resolves symbolic cross-references (`${a.b.c}`) inside a tree of
//! YAML-like configuration documents spread across a directory hierarchy.
//! A reference is resolved to the concrete document locations defining a
//! matching key path, even when the defining document lives anywhere in the
//! workspace and the reference covers only a trailing suffix of the true
//! logical path.
//!
//! # Architecture
//!
//! - **Parser**: Converts a document into a flat list of key definitions
//!   whose logical paths concatenate directory location and nested key chain
//! - **Reverse Path Index**: In-memory store indexed by owning document and
//!   by every path suffix; supports incremental insert/removal
//! - **Workspace Indexer**: Discovery, incremental updates on file events,
//!   and the query entry point
//! - **Resolver**: Deduplication, ranking, and filter modes over raw matches
//!
//! # Example Usage
//!
//! ```no_run
//! use keyref::config::Settings;
//! use keyref::resolver::parse_reference;
//! use keyref::workspace::{FsProvider, WorkspaceIndexer};
//!
//! let settings = Settings::default();
//! let provider = FsProvider::new(vec!["conf".into()], &settings).unwrap();
//! let mut indexer = WorkspaceIndexer::new(provider, settings);
//! indexer.initialize().unwrap();
//!
//! let components = parse_reference("${optimizer.lr}");
//! for m in indexer.resolve(&components, None, None) {
//!     println!("{} (level {})", m.definition.dotted_path(), m.level);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod index;
pub mod models;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod watcher;
pub mod workspace;

// Re-export commonly used types
pub use config::Settings;
pub use index::ReversePathIndex;
pub use models::{DocumentId, IndexStats, KeyDefinition, Match, MatchFilter, ResolvedMatch, Span};
pub use workspace::{DocumentEvent, DocumentProvider, FsProvider, WorkspaceIndexer};
