//! File system watcher for incremental index updates
//!
//! The watcher monitors the workspace roots and feeds coalesced document
//! events into the workspace indexer. Debouncing is per document: rapid
//! repeated notifications for one file (keystroke-driven saves) collapse to
//! the most recent pending update, and intermediate states are discarded
//! since only the final content ever matters. Flushed events are applied strictly
//! in sequence; the indexer never sees interleaved updates.

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::workspace::{DocumentEvent, DocumentProvider, FsProvider, WorkspaceIndexer};

/// Configuration for file watching
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Per-document debounce window in milliseconds
    pub debounce_ms: u64,
    /// Suppress output (only log errors)
    pub quiet: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            quiet: false,
        }
    }
}

/// The latest pending update for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    Created,
    Changed,
    Removed,
}

/// Watch the indexer's workspace roots and apply updates until interrupted.
///
/// Blocks the calling thread. Each file system notification lands in a
/// per-path pending map where the latest event wins; once a path has been
/// quiet for the debounce window, its single surviving event is applied.
pub fn watch(indexer: &mut WorkspaceIndexer<FsProvider>, config: WatchConfig) -> Result<()> {
    let roots: Vec<PathBuf> = indexer.provider().roots().to_vec();
    log::info!(
        "Starting file watcher for {} root(s) with {}ms debounce",
        roots.len(),
        config.debounce_ms
    );

    let (tx, rx) = channel();
    let mut watcher =
        RecommendedWatcher::new(tx, Config::default()).context("Failed to create file watcher")?;
    for root in &roots {
        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", root.display()))?;
    }

    if !config.quiet {
        println!(
            "Watching for changes (debounce: {}ms)...",
            config.debounce_ms
        );
    }

    let debounce = Duration::from_millis(config.debounce_ms);
    let mut pending: HashMap<PathBuf, (Instant, PendingKind)> = HashMap::new();

    loop {
        // Receive with a short timeout so due entries flush promptly
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(Ok(event)) => {
                if let Some((path, kind)) = classify_event(&event) {
                    if should_watch_path(&path)
                        && indexer.provider().is_tracked(&FsProvider::document_id(&path))
                    {
                        log::debug!("Detected {kind:?}: {}", path.display());
                        // Only the most recent pending update per document
                        // is retained
                        pending.insert(path, (Instant::now(), kind));
                    }
                }
            }
            Ok(Err(e)) => {
                log::warn!("Watch error: {e}");
            }
            Err(RecvTimeoutError::Timeout) => {
                flush_due(indexer, &mut pending, debounce, config.quiet);
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::info!("Watcher channel disconnected, stopping...");
                break;
            }
        }
    }

    if !config.quiet {
        println!("Watcher stopped.");
    }

    Ok(())
}

/// Apply every pending update whose debounce window has elapsed
fn flush_due(
    indexer: &mut WorkspaceIndexer<FsProvider>,
    pending: &mut HashMap<PathBuf, (Instant, PendingKind)>,
    debounce: Duration,
    quiet: bool,
) {
    let mut due: Vec<PathBuf> = pending
        .iter()
        .filter(|(_, (seen, _))| seen.elapsed() >= debounce)
        .map(|(path, _)| path.clone())
        .collect();
    if due.is_empty() {
        return;
    }
    due.sort();

    for path in due {
        let Some((_, kind)) = pending.remove(&path) else {
            continue;
        };
        let document = FsProvider::document_id(&path);
        let event = match kind {
            PendingKind::Created => DocumentEvent::Created(document),
            PendingKind::Changed => DocumentEvent::Changed(document),
            PendingKind::Removed => DocumentEvent::Deleted(document),
        };
        if !quiet {
            println!("Updating {}", path.display());
        }
        indexer.apply_event(event);
    }
}

/// Map a file system notification to a pending update kind and its path.
///
/// Returns `None` for events that should be ignored (metadata access,
/// directory-only events).
fn classify_event(event: &Event) -> Option<(PathBuf, PendingKind)> {
    let kind = match event.kind {
        EventKind::Create(_) => PendingKind::Created,
        EventKind::Modify(_) => PendingKind::Changed,
        EventKind::Remove(_) => PendingKind::Removed,
        _ => return None,
    };
    event.paths.first().cloned().map(|path| (path, kind))
}

/// Pre-filter applied before a path may enter the pending map
fn should_watch_path(path: &Path) -> bool {
    // Skip hidden files and directories
    if let Some(file_name) = path.file_name() {
        if file_name.to_string_lossy().starts_with('.') {
            return false;
        }
    }

    // Skip directories (a removed path no longer exists; let it through)
    if path.is_dir() {
        return false;
    }

    true
}
