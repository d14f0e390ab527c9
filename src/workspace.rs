//! Workspace indexer: discovery, incremental updates, and the query entry point
//!
//! The indexer owns the reverse path index and keeps it in sync with the
//! corpus. Documents move Unindexed → Indexed at startup or on a create
//! notification, are re-indexed on change notifications (remove-then-add,
//! so the index never holds stale definitions for a changed document), and
//! drop out on delete notifications. All mutations run strictly in sequence;
//! queries never observe a half-applied update.

use anyhow::{Context, Result};
use globset::GlobSet;
use ignore::WalkBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::index::ReversePathIndex;
use crate::models::{DocumentId, IndexStats, Match, MatchFilter};
use crate::parser;
use crate::resolver;

/// Ordinal of a workspace root within the configured root set
pub type RootId = usize;

/// File notifications delivered by the host environment, one at a time,
/// in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    Created(DocumentId),
    Changed(DocumentId),
    Deleted(DocumentId),
}

impl DocumentEvent {
    pub fn document(&self) -> &DocumentId {
        match self {
            Self::Created(id) | Self::Changed(id) | Self::Deleted(id) => id,
        }
    }
}

/// Host-environment boundary: document discovery, content access, and
/// workspace-root association
pub trait DocumentProvider {
    /// Discover every tracked document under the workspace roots
    fn list_documents(&self) -> Result<Vec<DocumentId>>;

    /// Read a document's current text
    fn read_text(&self, document: &DocumentId) -> Result<String>;

    /// Location relative to the owning workspace root, filename extension
    /// stripped; empty for documents outside every root
    fn directory_components(&self, document: &DocumentId) -> Vec<String>;

    /// Owning workspace root, when the document has one
    fn workspace_root(&self, document: &DocumentId) -> Option<RootId>;

    /// Whether the document belongs to the tracked corpus (extension and
    /// exclusion patterns); applied to scan results and notifications alike
    fn is_tracked(&self, document: &DocumentId) -> bool;
}

/// Filesystem-backed document provider over one or more workspace roots
pub struct FsProvider {
    roots: Vec<PathBuf>,
    exclusions: GlobSet,
}

/// Extensions recognized as configuration documents
const TRACKED_EXTENSIONS: &[&str] = &["yaml", "yml"];

impl FsProvider {
    pub fn new(roots: Vec<PathBuf>, settings: &Settings) -> Result<Self> {
        let exclusions = settings.exclusion_set()?;
        Ok(Self { roots, exclusions })
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Document identity for a filesystem path
    pub fn document_id(path: &Path) -> DocumentId {
        DocumentId::new(path.to_string_lossy())
    }

    fn has_tracked_extension(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| TRACKED_EXTENSIONS.contains(&ext))
    }

    /// The owning root, by longest matching prefix (roots may be nested)
    fn owning_root(&self, path: &Path) -> Option<RootId> {
        self.roots
            .iter()
            .enumerate()
            .filter(|(_, root)| path.starts_with(root))
            .max_by_key(|(_, root)| root.components().count())
            .map(|(id, _)| id)
    }
}

impl DocumentProvider for FsProvider {
    fn list_documents(&self) -> Result<Vec<DocumentId>> {
        let mut documents = Vec::new();

        for root in &self.roots {
            let walker = WalkBuilder::new(root).build();
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                        continue;
                    }
                };
                if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                    continue;
                }

                let id = Self::document_id(entry.path());
                if self.is_tracked(&id) {
                    documents.push(id);
                }
            }
        }

        // Deterministic scan order regardless of walk order
        documents.sort();
        documents.dedup();
        Ok(documents)
    }

    fn read_text(&self, document: &DocumentId) -> Result<String> {
        std::fs::read_to_string(document.as_str())
            .with_context(|| format!("Failed to read document: {document}"))
    }

    fn directory_components(&self, document: &DocumentId) -> Vec<String> {
        let path = Path::new(document.as_str());
        let Some(root_id) = self.owning_root(path) else {
            return Vec::new();
        };
        let Ok(relative) = path.strip_prefix(&self.roots[root_id]) else {
            return Vec::new();
        };

        let mut components: Vec<String> = relative
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        if let Some(stem) = relative.file_stem().and_then(|s| s.to_str()) {
            components.push(stem.to_string());
        }

        components
    }

    fn workspace_root(&self, document: &DocumentId) -> Option<RootId> {
        self.owning_root(Path::new(document.as_str()))
    }

    fn is_tracked(&self, document: &DocumentId) -> bool {
        let path = Path::new(document.as_str());
        Self::has_tracked_extension(path) && !self.exclusions.is_match(path)
    }
}

/// Owns the live index and the per-document bookkeeping.
///
/// Constructed empty; populated by [`initialize`](Self::initialize);
/// mutated incrementally through [`apply_event`](Self::apply_event);
/// rebuilt from scratch by [`refresh`](Self::refresh) when the incremental
/// protocol is suspected to have drifted.
pub struct WorkspaceIndexer<P: DocumentProvider> {
    provider: P,
    settings: Settings,
    index: ReversePathIndex,
    /// Content hash per scanned document, for skipping no-op changes
    scanned: HashMap<DocumentId, String>,
    last_updated: String,
}

impl<P: DocumentProvider> WorkspaceIndexer<P> {
    pub fn new(provider: P, settings: Settings) -> Self {
        Self {
            provider,
            settings,
            index: ReversePathIndex::new(),
            scanned: HashMap::new(),
            last_updated: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Discover and index every tracked document.
    ///
    /// Individual read or parse problems are logged and leave that document
    /// with zero definitions; the scan itself never aborts on one bad
    /// document.
    pub fn initialize(&mut self) -> Result<()> {
        let documents = self
            .provider
            .list_documents()
            .context("Workspace discovery failed")?;
        let total = documents.len();

        for document in documents {
            self.index_document(document);
        }

        self.touch();
        log::info!(
            "Indexed {} definitions from {} documents ({} scanned)",
            self.index.definition_count(),
            self.index.document_count(),
            total
        );
        Ok(())
    }

    /// Discard the entire index and repeat the startup scan
    pub fn refresh(&mut self) -> Result<()> {
        log::info!("Refreshing workspace index");
        self.index.clear();
        self.scanned.clear();
        self.initialize()
    }

    /// Apply one file notification.
    ///
    /// Notifications for untracked documents are ignored. A change is
    /// remove-then-add: the index briefly holds zero definitions for the
    /// document, never stale ones.
    pub fn apply_event(&mut self, event: DocumentEvent) {
        if !self.provider.is_tracked(event.document()) {
            log::debug!("Ignoring event for untracked document: {}", event.document());
            return;
        }

        match event {
            DocumentEvent::Created(document) | DocumentEvent::Changed(document) => {
                self.reindex_document(document);
            }
            DocumentEvent::Deleted(document) => {
                log::debug!("Removing deleted document: {document}");
                self.index.remove_document(&document);
                self.scanned.remove(&document);
            }
        }
        self.touch();
    }

    /// Resolve a reference path to its final candidate set.
    ///
    /// `filter` overrides the configured match filter when given; `source`
    /// is the document issuing the query, used by the workspace-isolation
    /// filter.
    pub fn resolve(
        &self,
        components: &[String],
        filter: Option<MatchFilter>,
        source: Option<&DocumentId>,
    ) -> Vec<Match> {
        let raw = self.index.query(components);
        resolver::resolve(
            raw,
            components.len(),
            filter.unwrap_or(self.settings.match_filter),
            self.settings.isolate_workspace_folders,
            source,
            |document| self.provider.workspace_root(document),
        )
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_documents: self.index.document_count(),
            total_definitions: self.index.definition_count(),
            total_suffixes: self.index.suffix_count(),
            last_updated: self.last_updated.clone(),
        }
    }

    /// Parse a document and add its definitions, replacing any previous
    /// contribution. Skips the reparse when the content hash is unchanged.
    fn reindex_document(&mut self, document: DocumentId) {
        let text = match self.provider.read_text(&document) {
            Ok(text) => text,
            Err(e) => {
                // Contribution left absent; the rest of the corpus stands
                log::warn!("Failed to read {document}: {e:#}");
                self.index.remove_document(&document);
                self.scanned.remove(&document);
                return;
            }
        };

        let hash = hash_content(&text);
        if self.scanned.get(&document).is_some_and(|known| *known == hash) {
            log::debug!("Content unchanged, skipping reparse: {document}");
            return;
        }

        self.index.remove_document(&document);
        self.add_definitions(document, &text, hash);
    }

    fn index_document(&mut self, document: DocumentId) {
        let text = match self.provider.read_text(&document) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Failed to read {document}: {e:#}");
                return;
            }
        };
        let hash = hash_content(&text);
        self.add_definitions(document, &text, hash);
    }

    fn add_definitions(&mut self, document: DocumentId, text: &str, hash: String) {
        let dir_components = self.provider.directory_components(&document);
        let definitions = parser::parse(&document, text, &dir_components);

        log::debug!("Parsed {} definitions from {document}", definitions.len());
        for definition in definitions {
            self.index.add(definition);
        }
        self.scanned.insert(document, hash);
    }

    fn touch(&mut self) {
        self.last_updated = chrono::Utc::now().to_rfc3339();
    }
}

/// Content hash for change detection
fn hash_content(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}
