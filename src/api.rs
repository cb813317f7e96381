//! High-level programmatic API.
//!
//! Two narrow entry points cover single chats: [`parse_transcript`] turns a
//! transcript into a [`ChatDocument`] and [`render_chat`] turns that document
//! into a page. [`ChatViewer`] wraps a configuration for whole runs.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use code_chat_viewer::api::{parse_transcript, render_chat, ChatViewer};
//!
//! fn main() -> code_chat_viewer::Result<()> {
//!     let doc = parse_transcript("session.jsonl")?;
//!     if let Some(page) = render_chat(&doc, "CCV-Dashboard.html")? {
//!         std::fs::write(&page.filename, page.html)?;
//!     }
//!
//!     let viewer = ChatViewer::load()?;
//!     let summary = viewer.run(chrono::Utc::now())?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::discovery::{scan_sources, SourceChat};
use crate::error::{Result, ViewerError};
use crate::export::{PageAssembler, RenderedPage};
use crate::model::ChatDocument;
use crate::parser::TranscriptParser;
use crate::sync::{RunSummary, SyncRunner};

/// Parse a transcript; the identity is the file stem.
///
/// Malformed lines are skipped.
pub fn parse_transcript(path: impl AsRef<Path>) -> Result<ChatDocument> {
    let path = path.as_ref();
    let identity = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ViewerError::FileNotFound {
            path: path.to_path_buf(),
        })?;
    TranscriptParser::new().parse_file(path, identity)
}

/// Render a document as a page linking back to `dashboard_filename`.
///
/// Returns `None` for a chat without visible turns.
pub fn render_chat(doc: &ChatDocument, dashboard_filename: &str) -> Result<Option<RenderedPage>> {
    PageAssembler::new(dashboard_filename).render(doc)
}

/// Conversion runs over one configuration.
#[derive(Debug, Clone)]
pub struct ChatViewer {
    config: Config,
}

impl ChatViewer {
    /// Viewer with the configuration from the default location.
    pub fn load() -> Result<Self> {
        Ok(Self::with_config(Config::load()?))
    }

    /// Viewer with an explicit configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Transcripts a run would consider.
    pub fn sources(&self) -> Result<Vec<SourceChat>> {
        scan_sources(&self.config)
    }

    /// Parse one discovered transcript.
    pub fn parse(&self, source: &SourceChat) -> Result<ChatDocument> {
        TranscriptParser::new()
            .with_max_file_size(self.config.max_file_size_bytes())
            .parse_file(&source.path, &source.identity)
    }

    /// Render one document with the configured dashboard link.
    pub fn render(&self, doc: &ChatDocument) -> Result<Option<RenderedPage>> {
        render_chat(doc, &self.config.output.index_filename)
    }

    /// Run a full conversion, classifying against `now`.
    pub fn run(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        SyncRunner::new(self.config.clone()).run(now)
    }
}
