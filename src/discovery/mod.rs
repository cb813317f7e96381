//! Transcript discovery.
//!
//! Claude Code keeps one directory per project under its `projects` root,
//! each holding `<session-uuid>.jsonl` transcripts and, for subagents,
//! `agent-<id>.jsonl`. The scanner lists them in lexicographic path order so
//! every run processes sources in the same sequence.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Result, ViewerError};
use crate::export::short_hash;

/// Prefix of subagent transcript filenames.
pub const AGENT_PREFIX: &str = "agent-";

/// A transcript found under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceChat {
    /// Path to the JSONL file.
    pub path: PathBuf,
    /// Chat identity (file stem).
    pub identity: String,
    /// Encoded project directory name, empty for top-level files.
    pub project_dir: String,
    /// Whether this is a subagent transcript.
    pub is_agent: bool,
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
    /// Identity hash used in output filenames.
    pub hash: String,
}

/// Lists transcripts under a source root.
#[derive(Debug, Clone)]
pub struct SourceScanner {
    root: PathBuf,
    include_agents: bool,
    agent_min_bytes: u64,
}

impl SourceScanner {
    /// Scanner over `root` that includes every agent transcript.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_agents: true,
            agent_min_bytes: 0,
        }
    }

    /// Scanner configured from the `source` and `agents` settings.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.source_dir()).with_agents(config.agents.include, config.agent_min_bytes())
    }

    /// Set whether agent transcripts are included and their minimum size.
    #[must_use]
    pub fn with_agents(mut self, include: bool, min_bytes: u64) -> Self {
        self.include_agents = include;
        self.agent_min_bytes = min_bytes;
        self
    }

    /// Source root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List transcripts sorted by path.
    ///
    /// A missing or unreadable root is an error; unreadable entries below it
    /// are logged and skipped.
    pub fn scan(&self) -> Result<Vec<SourceChat>> {
        if !self.root.is_dir() {
            return Err(ViewerError::SourceNotFound {
                path: self.root.clone(),
            });
        }
        std::fs::read_dir(&self.root).map_err(|_| ViewerError::SourceNotFound {
            path: self.root.clone(),
        })?;

        let mut chats = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(2) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Cannot read source entry, skipping");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_transcript(entry.path()) {
                continue;
            }

            let Some(identity) = entry.path().file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Cannot stat transcript, skipping");
                    continue;
                }
            };

            let is_agent = identity.starts_with(AGENT_PREFIX);
            if is_agent && (!self.include_agents || metadata.len() < self.agent_min_bytes) {
                debug!(path = %entry.path().display(), "Skipping agent transcript");
                continue;
            }

            let project_dir = if entry.depth() == 2 {
                entry
                    .path()
                    .parent()
                    .and_then(Path::file_name)
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string()
            } else {
                String::new()
            };

            chats.push(SourceChat {
                path: entry.path().to_path_buf(),
                identity: identity.to_string(),
                project_dir,
                is_agent,
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                hash: short_hash(identity),
            });
        }

        chats.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(count = chats.len(), root = %self.root.display(), "Scanned transcripts");
        Ok(chats)
    }
}

/// List the transcripts selected by `config`.
pub fn scan_sources(config: &Config) -> Result<Vec<SourceChat>> {
    SourceScanner::from_config(config).scan()
}

fn is_transcript(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "jsonl")
}

/// Format a project directory name or path for display.
///
/// Claude Code encodes a project path by replacing separators with `-`, so
/// `-home-dev-projects-app` or `C--Users-dev-projects-app` become
/// `projects/app`: the system prefix and user name are dropped. Anything else
/// is shown by its last path component.
#[must_use]
pub fn format_project_name(raw: &str) -> String {
    let name = raw
        .rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or_default();
    if name.is_empty() {
        return "Unknown".to_string();
    }

    let parts: Vec<&str> = name.split('-').collect();
    for (i, part) in parts.iter().enumerate() {
        if (part.eq_ignore_ascii_case("users") || part.eq_ignore_ascii_case("home")) && i + 1 < parts.len() {
            let meaningful: Vec<&str> = parts[i + 2..].iter().copied().filter(|p| !p.is_empty()).collect();
            if !meaningful.is_empty() {
                return meaningful.join("/");
            }
            break;
        }
    }
    name.to_string()
}
