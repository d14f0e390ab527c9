//! CLI argument parsing and command handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use crate::config::Settings;
use crate::models::{DocumentId, MatchFilter, ResolvedMatch};
use crate::output;
use crate::resolver;
use crate::watcher::{self, WatchConfig};
use crate::workspace::{FsProvider, WorkspaceIndexer};

/// Keyref: workspace indexer and reverse-path resolver for configuration keys
#[derive(Parser, Debug)]
#[command(
    name = "kref",
    version,
    about = "Resolve configuration key references across a workspace",
    long_about = "Keyref indexes every key definition in a workspace of YAML \
                  configuration documents and resolves references like ${a.b.c} \
                  to the concrete locations defining a matching key path, even \
                  when the reference is only a trailing fragment of the true \
                  logical path."
)]
pub struct Cli {
    /// Enable verbose logging (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan the workspace and report index statistics
    Scan {
        /// Workspace roots to index (defaults to the current directory)
        #[arg(value_name = "PATH", default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format as JSON
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output (only with --json)
        #[arg(long)]
        pretty: bool,
    },

    /// Resolve a key reference against the workspace
    ///
    /// The reference may be the interpolation form or the bare dotted path:
    ///   kref resolve '${optimizer.lr}'
    ///   kref resolve optimizer.lr
    ///
    /// Filter modes:
    ///   - top (default): only matches at the highest level attained
    ///   - perfect: only matches covering the entire reference path
    ///   - all: every deduplicated match
    Resolve {
        /// Reference to resolve, e.g. '${a.b.c}' or 'a.b.c'
        reference: String,

        /// Workspace roots to index (defaults to the current directory)
        #[arg(value_name = "PATH", default_value = ".")]
        paths: Vec<PathBuf>,

        /// Match filter mode (all, top, perfect); overrides keyref.toml
        #[arg(short, long)]
        mode: Option<String>,

        /// Source document issuing the reference (enables workspace
        /// isolation relative to this document)
        #[arg(short, long, value_name = "FILE")]
        from: Option<PathBuf>,

        /// Output format as JSON
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output (only with --json)
        #[arg(long)]
        pretty: bool,
    },

    /// Watch the workspace and keep the index up to date
    ///
    /// Applies create/change/delete notifications incrementally with a
    /// per-document debounce until interrupted (Ctrl+C).
    Watch {
        /// Workspace roots to watch (defaults to the current directory)
        #[arg(value_name = "PATH", default_value = ".")]
        paths: Vec<PathBuf>,

        /// Per-document debounce in milliseconds; overrides keyref.toml
        #[arg(short, long)]
        debounce_ms: Option<u64>,

        /// Suppress output (only log errors)
        #[arg(short, long)]
        quiet: bool,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // Setup logging based on verbosity
        let log_level = match self.verbose {
            0 => "warn",  // Default: only warnings and errors
            1 => "info",  // -v: show info messages
            2 => "debug", // -vv: show debug messages
            _ => "trace", // -vvv: show trace messages
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .init();

        match self.command {
            Command::Scan { paths, json, pretty } => handle_scan(paths, json, pretty),
            Command::Resolve {
                reference,
                paths,
                mode,
                from,
                json,
                pretty,
            } => handle_resolve(reference, paths, mode, from, json, pretty),
            Command::Watch {
                paths,
                debounce_ms,
                quiet,
            } => handle_watch(paths, debounce_ms, quiet),
        }
    }
}

/// Canonicalize the workspace roots and build an initialized indexer
fn build_indexer(paths: Vec<PathBuf>) -> Result<WorkspaceIndexer<FsProvider>> {
    let mut roots = Vec::with_capacity(paths.len());
    for path in paths {
        let root = std::fs::canonicalize(&path)
            .with_context(|| format!("Workspace root not found: {}", path.display()))?;
        roots.push(root);
    }

    // Settings come from the first root's keyref.toml, when present
    let settings = match roots.first() {
        Some(root) => Settings::load(root)?,
        None => Settings::default(),
    };

    let provider = FsProvider::new(roots, &settings)?;
    let mut indexer = WorkspaceIndexer::new(provider, settings);
    indexer.initialize()?;
    Ok(indexer)
}

fn handle_scan(paths: Vec<PathBuf>, json: bool, pretty: bool) -> Result<()> {
    let start = Instant::now();
    let indexer = build_indexer(paths)?;
    let stats = indexer.stats();
    let elapsed = start.elapsed();

    if json {
        let rendered = if pretty {
            serde_json::to_string_pretty(&stats)?
        } else {
            serde_json::to_string(&stats)?
        };
        println!("{rendered}");
    } else {
        println!(
            "Indexed {} definitions from {} documents in {:.1}ms",
            stats.total_definitions,
            stats.total_documents,
            elapsed.as_secs_f64() * 1000.0
        );
        println!("Suffix buckets: {}", stats.total_suffixes);
    }
    Ok(())
}

fn handle_resolve(
    reference: String,
    paths: Vec<PathBuf>,
    mode: Option<String>,
    from: Option<PathBuf>,
    json: bool,
    pretty: bool,
) -> Result<()> {
    let filter = match mode {
        Some(raw) => Some(MatchFilter::from_str(&raw).map_err(|_| {
            anyhow::anyhow!("Unknown match filter: '{raw}'. Supported: all, top, perfect")
        })?),
        None => None,
    };

    let source = match from {
        Some(path) => {
            let canonical = std::fs::canonicalize(&path)
                .with_context(|| format!("Source document not found: {}", path.display()))?;
            Some(FsProvider::document_id(&canonical))
        }
        None => None,
    };

    let components = resolver::parse_reference(&reference);
    if components.is_empty() && !json {
        output::warn(&format!("Reference '{reference}' has no path components"));
    }

    let indexer = build_indexer(paths)?;
    let matches = indexer.resolve(&components, filter, source.as_ref());
    let resolved: Vec<ResolvedMatch> = matches.iter().map(ResolvedMatch::from).collect();

    if json {
        let rendered = if pretty {
            serde_json::to_string_pretty(&resolved)?
        } else {
            serde_json::to_string(&resolved)?
        };
        println!("{rendered}");
    } else if resolved.is_empty() {
        output::info(&format!("No definitions matched '{reference}'"));
    } else {
        for m in &resolved {
            println!(
                "{}:{}:{}  {}  (level {})",
                m.path, m.span.start_line, m.span.start_col, m.key, m.level
            );
        }
    }
    Ok(())
}

fn handle_watch(paths: Vec<PathBuf>, debounce_ms: Option<u64>, quiet: bool) -> Result<()> {
    let mut indexer = build_indexer(paths)?;

    if !quiet {
        let stats = indexer.stats();
        println!(
            "Indexed {} definitions from {} documents",
            stats.total_definitions, stats.total_documents
        );
    }

    let config = WatchConfig {
        debounce_ms: debounce_ms.unwrap_or(indexer.settings().debounce_ms),
        quiet,
    };
    watcher::watch(&mut indexer, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_scan() {
        let cli = Cli::try_parse_from(["kref", "scan", "conf"]).unwrap();
        match cli.command {
            Command::Scan { paths, json, .. } => {
                assert_eq!(paths, vec![PathBuf::from("conf")]);
                assert!(!json);
            }
            _ => panic!("expected scan command"),
        }
    }

    #[test]
    fn test_cli_parses_resolve_with_mode() {
        let cli =
            Cli::try_parse_from(["kref", "resolve", "${a.b}", "--mode", "perfect", "--json"])
                .unwrap();
        match cli.command {
            Command::Resolve {
                reference, mode, json, ..
            } => {
                assert_eq!(reference, "${a.b}");
                assert_eq!(mode.as_deref(), Some("perfect"));
                assert!(json);
            }
            _ => panic!("expected resolve command"),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["kref"]).is_err());
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["kref", "-vv", "scan"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
