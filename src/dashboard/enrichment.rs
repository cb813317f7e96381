//! Optional session metadata from Claude Code's `sessions-index.json`.
//!
//! Each project directory may hold an index with titles and summaries for
//! its sessions. The index is advisory: missing, unreadable or malformed
//! files are skipped and the dashboard falls back to transcript data.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::model::Enrichment;

/// Filename of the per-project session index.
pub const SESSIONS_INDEX_FILENAME: &str = "sessions-index.json";

#[derive(Deserialize)]
struct SessionsIndexFile {
    #[serde(default)]
    entries: Vec<Value>,
}

/// Enrichment entries keyed by session id.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentIndex {
    entries: HashMap<String, Enrichment>,
}

impl EnrichmentIndex {
    /// Read every `<project>/sessions-index.json` below `source_root`.
    ///
    /// Never fails; problems are logged at debug level.
    #[must_use]
    pub fn load(source_root: &Path) -> Self {
        let mut index = Self::default();
        let Ok(dirs) = std::fs::read_dir(source_root) else {
            debug!(root = %source_root.display(), "No enrichment source");
            return index;
        };

        let mut files: Vec<_> = dirs
            .filter_map(std::result::Result::ok)
            .map(|e| e.path().join(SESSIONS_INDEX_FILENAME))
            .filter(|p| p.is_file())
            .collect();
        files.sort();

        for file in files {
            let parsed = std::fs::read_to_string(&file)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str::<SessionsIndexFile>(&s).map_err(|e| e.to_string()));
            match parsed {
                Ok(data) => {
                    for (position, raw) in data.entries.into_iter().enumerate() {
                        match serde_json::from_value::<Enrichment>(raw) {
                            Ok(entry) => index.insert(entry),
                            Err(e) => debug!(path = %file.display(), position, error = %e, "Skipping malformed index entry"),
                        }
                    }
                }
                Err(e) => debug!(path = %file.display(), error = %e, "Ignoring unreadable session index"),
            }
        }

        debug!(entries = index.len(), "Loaded enrichment index");
        index
    }

    /// Add an entry; entries without a session id are ignored.
    pub fn insert(&mut self, entry: Enrichment) {
        if !entry.session_id.is_empty() {
            self.entries.insert(entry.session_id.clone(), entry);
        }
    }

    /// Entry for a chat identity.
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<&Enrichment> {
        self.entries.get(identity)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_skips_bad_files() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("-home-dev-a");
        let bad = dir.path().join("-home-dev-b");
        std::fs::create_dir_all(&good).unwrap();
        std::fs::create_dir_all(&bad).unwrap();
        std::fs::write(
            good.join(SESSIONS_INDEX_FILENAME),
            r#"{"version":1,"entries":[{"sessionId":"s1","customTitle":"Deploy fix","messageCount":12},{"summary":"no id"}]}"#,
        )
        .unwrap();
        std::fs::write(bad.join(SESSIONS_INDEX_FILENAME), "{not json").unwrap();

        let index = EnrichmentIndex::load(dir.path());
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("s1").unwrap().custom_title.as_deref(), Some("Deploy fix"));
        assert!(index.get("s2").is_none());
    }

    #[test]
    fn test_mistyped_entry_keeps_the_rest() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("-home-dev-a");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(
            project.join(SESSIONS_INDEX_FILENAME),
            r#"{"entries":[{"sessionId":"good","customTitle":"Good title"},{"sessionId":"bad","messageCount":"12"},{"sessionId":"worse","customTitle":123}]}"#,
        )
        .unwrap();

        let index = EnrichmentIndex::load(dir.path());
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("good").unwrap().custom_title.as_deref(), Some("Good title"));
        assert!(index.get("bad").is_none());
        assert!(index.get("worse").is_none());
    }

    #[test]
    fn test_missing_root_is_empty() {
        let index = EnrichmentIndex::load(Path::new("/nonexistent/projects"));
        assert!(index.is_empty());
    }
}
