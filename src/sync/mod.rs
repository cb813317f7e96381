//! The batch conversion run.
//!
//! One run renders every new or changed transcript, removes pages of chats
//! that no longer have any visible turn, re-organizes pages into category
//! folders and rewrites the dashboard. Sources are processed in path order
//! on a single thread, so two runs over the same input produce the same
//! output tree.

mod change;

pub use change::{ChangeDecision, ChangeDetector};

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::dashboard::{DashboardAggregator, EnrichmentIndex};
use crate::discovery::{scan_sources, SourceChat};
use crate::error::Result;
use crate::export::{render_dashboard, DashboardOptions, PageAssembler};
use crate::layout::{OutputLayout, PageFile};
use crate::model::Category;
use crate::organize::Classifier;
use crate::parser::TranscriptParser;
use crate::util::{atomic_write, remove_file_if_exists, to_utc};

/// `localStorage` key under which the dashboard keeps its UI state.
const DASHBOARD_STATE_KEY: &str = "ccv-dashboard-state";

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Chats rendered for the first time.
    pub new: usize,
    /// Chats re-rendered because the source changed.
    pub updated: usize,
    /// Chats whose page was already current.
    pub unchanged: usize,
    /// Transcripts with no visible turn and no page.
    pub empty: usize,
    /// Pages removed because their chat has no visible turn any more.
    pub removed: usize,
    /// Pages moved between category folders.
    pub moved: usize,
    /// Stale duplicate pages removed while organizing.
    pub duplicates_removed: usize,
    /// Files that failed; see `failures`.
    pub failed: usize,
    /// Failed path and reason, in processing order.
    pub failures: Vec<(PathBuf, String)>,
    /// Malformed lines skipped across all parsed transcripts.
    pub malformed_lines: usize,
    /// Events dropped by the filtering rules across all parsed transcripts.
    pub filtered_events: usize,
    /// Rows on the dashboard.
    pub dashboard_entries: usize,
}

impl RunSummary {
    /// Whether any file failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    fn record_failure(&mut self, path: &Path, message: String) {
        warn!(path = %path.display(), error = %message, "Failed");
        self.failed += 1;
        self.failures.push((path.to_path_buf(), message));
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} new, {} updated, {} unchanged, {} empty, {} removed",
            self.new, self.updated, self.unchanged, self.empty, self.removed
        )?;
        writeln!(
            f,
            "{} moved, {} duplicates removed, {} failed",
            self.moved, self.duplicates_removed, self.failed
        )?;
        writeln!(
            f,
            "{} malformed lines skipped, {} events filtered",
            self.malformed_lines, self.filtered_events
        )?;
        write!(f, "Dashboard lists {} chats", self.dashboard_entries)?;
        for (path, message) in &self.failures {
            write!(f, "\n  {}: {message}", path.display())?;
        }
        Ok(())
    }
}

/// Runs a conversion over one configuration.
#[derive(Debug, Clone)]
pub struct SyncRunner {
    config: Config,
    layout: OutputLayout,
}

impl SyncRunner {
    /// Create a runner for `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let layout = OutputLayout::from_config(&config);
        Self { config, layout }
    }

    /// Output layout of this run.
    #[must_use]
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Run once, classifying against `now`.
    ///
    /// Invalid configuration and a missing source directory are fatal and
    /// leave the output untouched. Failures of single files are collected in
    /// the summary.
    #[instrument(skip_all, fields(source = %self.config.source_dir().display(), output = %self.layout.root().display()))]
    pub fn run(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        self.config.validate()?;
        let sources = scan_sources(&self.config)?;
        info!(sources = sources.len(), "Starting run");

        let mut summary = RunSummary::default();

        let mut pages: HashMap<String, Vec<PageFile>> = HashMap::new();
        for page in self.layout.scan_pages()? {
            pages.entry(page.hash.clone()).or_default().push(page);
        }

        let assembler = PageAssembler::new(self.layout.dashboard_filename());
        for source in &sources {
            let existing = pages.remove(&source.hash).unwrap_or_default();
            if let Err(e) = self.sync_one(source, &existing, &assembler, &mut summary) {
                summary.record_failure(&source.path, e.to_string());
            }
        }

        let organized = Classifier::from_config(&self.config).organize(&self.layout, &sources, now)?;
        summary.moved = organized.moved;
        summary.duplicates_removed = organized.duplicates_removed;
        for (path, message) in organized.failures {
            summary.record_failure(&path, message);
        }

        let enrichment = EnrichmentIndex::load(&self.config.source_dir());
        let entries = DashboardAggregator::collect(&self.layout, &sources, &enrichment)?;
        summary.dashboard_entries = entries.len();

        let dashboard_path = self.layout.dashboard_path();
        let written = render_dashboard(&entries, &self.dashboard_options())
            .and_then(|html| atomic_write(&dashboard_path, html.as_bytes()));
        match written {
            Ok(()) => info!(path = %dashboard_path.display(), entries = entries.len(), "Wrote dashboard"),
            Err(e) => summary.record_failure(&dashboard_path, e.to_string()),
        }

        info!(
            new = summary.new,
            updated = summary.updated,
            unchanged = summary.unchanged,
            failed = summary.failed,
            "Run complete"
        );
        Ok(summary)
    }

    fn sync_one(
        &self,
        source: &SourceChat,
        existing: &[PageFile],
        assembler: &PageAssembler,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let current = existing.iter().max_by_key(|p| p.modified);
        let decision = ChangeDetector::decide(source.modified, current.map(|p| p.modified));
        debug!(identity = %source.identity, %decision, "Change check");
        if !decision.needs_render() {
            summary.unchanged += 1;
            return Ok(());
        }

        let mut parser = TranscriptParser::new().with_max_file_size(self.config.max_file_size_bytes());
        let doc = parser.parse_file(&source.path, &source.identity)?;
        summary.malformed_lines += parser.stats().malformed_lines;
        summary.filtered_events += parser.stats().filtered_events;

        let Some(page) = assembler.render_dated(&doc, Some(to_utc(source.modified)))? else {
            if existing.is_empty() {
                debug!(identity = %source.identity, "No visible turns, nothing to write");
                summary.empty += 1;
            }
            for stale in existing {
                if remove_file_if_exists(&stale.path)? {
                    info!(path = %stale.path.display(), "Removed page of empty chat");
                    summary.removed += 1;
                }
            }
            return Ok(());
        };

        let target = self.layout.category_dir(Category::Active).join(&page.filename);
        atomic_write(&target, page.html.as_bytes())?;
        info!(path = %target.display(), turns = doc.turns.len(), %decision, "Wrote page");

        for stale in existing.iter().filter(|p| p.path != target) {
            if remove_file_if_exists(&stale.path)? {
                debug!(path = %stale.path.display(), "Removed superseded page");
            }
        }

        match decision {
            ChangeDecision::New => summary.new += 1,
            ChangeDecision::Updated => summary.updated += 1,
            ChangeDecision::Unchanged => {}
        }
        Ok(())
    }

    fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            title: self.config.dashboard.title.clone(),
            enabled_categories: self.config.enabled_categories(),
            inactive_days: self.config.inactive_days,
            short_max_kb: self.config.shorts.max_size_kb,
            state_ttl_hours: self.config.dashboard.state_ttl_hours,
            state_key: DASHBOARD_STATE_KEY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewerError;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::{tempdir, TempDir};

    const CHAT: &str = r#"{"type":"user","timestamp":"2025-03-01T10:00:00Z","message":{"role":"user","content":"hello"}}
{"type":"assistant","timestamp":"2025-03-01T10:00:05Z","message":{"role":"assistant","content":[{"type":"text","text":"hi"}]}}
"#;

    struct Fixture {
        _dir: TempDir,
        source: PathBuf,
        config: Config,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let source = dir.path().join("projects");
        let mut config = Config::default();
        config.source.projects_path = source.clone();
        config.output.folder = dir.path().join("out");
        Fixture {
            _dir: dir,
            source,
            config,
        }
    }

    fn write_source(root: &Path, identity: &str, content: &str, modified: SystemTime) -> PathBuf {
        let path = root.join("-home-dev-app").join(format!("{identity}.jsonl"));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        File::options().write(true).open(&path).unwrap().set_modified(modified).unwrap();
        path
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_run_then_rerun_is_unchanged() {
        let fx = fixture();
        write_source(&fx.source, "s1", CHAT, SystemTime::now() - Duration::from_secs(3600));

        let runner = SyncRunner::new(fx.config.clone());
        let first = runner.run(now()).unwrap();
        assert_eq!(first.new, 1);
        assert_eq!(first.dashboard_entries, 1);
        assert!(runner.layout().dashboard_path().exists());

        let second = runner.run(now()).unwrap();
        assert_eq!(second.new, 0);
        assert_eq!(second.unchanged, 1);
        assert_eq!(second.dashboard_entries, 1);
    }

    #[test]
    fn test_empty_chat_removes_page() {
        let fx = fixture();
        let path = write_source(&fx.source, "s1", CHAT, SystemTime::now() - Duration::from_secs(3600));
        let runner = SyncRunner::new(fx.config.clone());
        runner.run(now()).unwrap();

        std::fs::write(&path, "{\"type\":\"file-history-snapshot\"}\n").unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();

        let summary = runner.run(now()).unwrap();
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.filtered_events, 1);
        assert_eq!(summary.dashboard_entries, 0);
        assert!(runner.layout().scan_pages().unwrap().is_empty());
    }

    #[test]
    fn test_empty_new_chat_writes_nothing() {
        let fx = fixture();
        write_source(&fx.source, "s1", "\n\nnot json\n", SystemTime::now());
        let summary = SyncRunner::new(fx.config).run(now()).unwrap();
        assert_eq!(summary.empty, 1);
        assert_eq!(summary.malformed_lines, 1);
        assert_eq!(summary.new, 0);
    }

    #[test]
    fn test_undated_chat_is_named_after_source_time() {
        let fx = fixture();
        let undated = r#"{"type":"user","message":{"role":"user","content":"no clock here"}}"#;
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_740_000_000);
        write_source(&fx.source, "s1", undated, modified);

        let runner = SyncRunner::new(fx.config.clone());
        let summary = runner.run(now()).unwrap();
        assert_eq!(summary.new, 1);

        let pages = runner.layout().scan_pages().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(
            pages[0].file_name(),
            crate::export::output_filename("s1", to_utc(modified))
        );
        assert!(!pages[0].file_name().starts_with("Chat 1970"));
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let fx = fixture();
        let runner = SyncRunner::new(fx.config.clone());
        let err = runner.run(now()).unwrap_err();
        assert!(matches!(err, ViewerError::SourceNotFound { .. }));
        assert!(!fx.config.output.folder.exists());
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut fx = fixture();
        fx.config.archive.folder = "Active".to_string();
        let err = SyncRunner::new(fx.config).run(now()).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidConfig { .. }));
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            new: 2,
            failed: 1,
            failures: vec![(PathBuf::from("/src/a.jsonl"), "boom".to_string())],
            dashboard_entries: 2,
            ..RunSummary::default()
        };
        let text = summary.to_string();
        assert!(text.starts_with("2 new, 0 updated"));
        assert!(text.contains("Dashboard lists 2 chats"));
        assert!(text.contains("/src/a.jsonl: boom"));
        assert!(summary.has_failures());
    }
}
