//! JSONL parsing for Claude Code transcripts.
//!
//! The parser turns a transcript into a [`ChatDocument`]:
//! - Malformed lines are counted and skipped, the rest of the file is kept
//! - Undo snapshots and empty placeholder messages are suppressed
//! - `custom-title` records feed the document metadata instead of a turn
//! - Unrecognized record kinds survive as a turn with an `Unknown` block
//!
//! # Example
//!
//! ```rust,no_run
//! use code_chat_viewer::parser::TranscriptParser;
//!
//! let mut parser = TranscriptParser::new();
//! let doc = parser.parse_file("session.jsonl", "session")?;
//! println!("{} turns, {} malformed lines", doc.turns.len(), parser.stats().malformed_lines);
//! # Ok::<(), code_chat_viewer::ViewerError>(())
//! ```
//!
//! # Parsing Modes
//!
//! - **Lenient mode** (default): skips malformed lines, records them in [`ParseStats`]
//! - **Strict mode**: fails on the first malformed line

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::error::{Result, ViewerError};
use crate::model::{
    blocks_from_content, ChatDocument, ChatMeta, ContentBlock, ConversationTurn, EventKind,
    RawEvent, Role,
};
use crate::util::{collapse_whitespace, truncate_chars};

/// Maximum length of the captured first prompt, in characters.
pub const FIRST_PROMPT_CHARS: usize = 100;

/// Maximum length of a malformed line preview.
const PREVIEW_CHARS: usize = 100;

/// Transcript parser.
#[derive(Debug)]
pub struct TranscriptParser {
    /// Whether to skip malformed lines instead of failing.
    lenient: bool,
    /// Maximum file size in bytes (0 = unlimited).
    max_file_size: u64,
    /// Statistics about the last parse.
    stats: ParseStats,
}

/// Statistics about a parse.
///
/// `lines_processed = blank_lines + malformed_lines + events_parsed` and
/// `turns = events_parsed - filtered_events`. Metadata records are filtered
/// events too; `metadata_events` tells how many of them were consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Total lines read.
    pub lines_processed: usize,
    /// Whitespace-only lines.
    pub blank_lines: usize,
    /// Lines that were not a JSON object.
    pub malformed_lines: usize,
    /// Well-formed events.
    pub events_parsed: usize,
    /// Events that produced no turn: snapshots, empty placeholders and
    /// metadata records.
    pub filtered_events: usize,
    /// Of `filtered_events`, the records consumed as document metadata.
    pub metadata_events: usize,
    /// Details of malformed lines.
    pub errors: Vec<LineError>,
}

impl ParseStats {
    /// Number of turns the parse produced.
    #[must_use]
    pub fn turns(&self) -> usize {
        self.events_parsed - self.filtered_events
    }
}

/// A malformed line with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    /// 1-based line number.
    pub line: usize,
    /// Error message.
    pub message: String,
    /// Original line content (truncated).
    pub content_preview: String,
}

/// What a single event contributes to the document.
enum Disposition {
    Turn(ConversationTurn),
    Metadata,
    Filtered,
}

impl TranscriptParser {
    /// Create a new lenient parser without a size limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lenient: true,
            max_file_size: 0,
            stats: ParseStats::default(),
        }
    }

    /// Set lenient mode (skip malformed lines instead of failing).
    #[must_use]
    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Set maximum file size in bytes (0 = unlimited).
    #[must_use]
    pub fn with_max_file_size(mut self, max_bytes: u64) -> Self {
        self.max_file_size = max_bytes;
        self
    }

    /// Statistics of the last parse.
    #[must_use]
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Parse a transcript file; `identity` names the resulting document.
    #[instrument(skip(self, identity), fields(path = %path.as_ref().display()))]
    pub fn parse_file(&mut self, path: impl AsRef<Path>, identity: &str) -> Result<ChatDocument> {
        let path = path.as_ref();
        debug!("Opening transcript");

        let file = File::open(path).map_err(|e| ViewerError::from_io_at(path, "open", e))?;

        if self.max_file_size > 0 {
            let size = file
                .metadata()
                .map_err(|e| ViewerError::from_io_at(path, "stat", e))?
                .len();
            if size > self.max_file_size {
                return Err(ViewerError::TranscriptTooLarge {
                    path: path.to_path_buf(),
                    size,
                    limit: self.max_file_size,
                });
            }
        }

        self.parse_reader(identity, BufReader::new(file))
    }

    /// Parse a transcript from a reader.
    #[instrument(skip(self, reader), level = "debug")]
    pub fn parse_reader<R: BufRead>(&mut self, identity: &str, reader: R) -> Result<ChatDocument> {
        self.stats = ParseStats::default();
        let mut turns = Vec::new();
        let mut meta = ChatMeta::default();

        for (index, line_result) in reader.lines().enumerate() {
            let line_num = index + 1;
            self.stats.lines_processed += 1;

            let line = match line_result {
                Ok(l) => l,
                Err(e) => {
                    if !self.lenient {
                        return Err(ViewerError::io(format!("Failed to read line {line_num}"), e));
                    }
                    self.record_malformed(line_num, format!("I/O error: {e}"), "");
                    continue;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                self.stats.blank_lines += 1;
                continue;
            }

            let event = match decode_line(trimmed, line_num) {
                Ok(event) => event,
                Err(e) => {
                    if !self.lenient {
                        return Err(e);
                    }
                    self.record_malformed(line_num, e.to_string(), trimmed);
                    continue;
                }
            };
            self.stats.events_parsed += 1;

            capture_context(&event, &mut meta);
            match classify_event(event, &mut meta) {
                Disposition::Turn(turn) => {
                    if turn.is_prompt && meta.first_prompt.is_none() {
                        let text = collapse_whitespace(&turn.text());
                        if !text.is_empty() {
                            meta.first_prompt = Some(truncate_chars(&text, FIRST_PROMPT_CHARS));
                        }
                    }
                    turns.push(turn);
                }
                Disposition::Metadata => {
                    self.stats.metadata_events += 1;
                    self.stats.filtered_events += 1;
                }
                Disposition::Filtered => self.stats.filtered_events += 1,
            }
        }

        debug!(
            turns = turns.len(),
            lines = self.stats.lines_processed,
            malformed = self.stats.malformed_lines,
            filtered = self.stats.filtered_events,
            "Parsing complete"
        );
        Ok(ChatDocument::new(identity, turns, meta))
    }

    /// Parse a transcript held in memory.
    pub fn parse_str(&mut self, identity: &str, content: &str) -> Result<ChatDocument> {
        self.parse_reader(identity, content.as_bytes())
    }

    fn record_malformed(&mut self, line: usize, message: String, content: &str) {
        trace!(line, %message, "Malformed line, skipping");
        self.stats.malformed_lines += 1;
        self.stats.errors.push(LineError {
            line,
            message,
            content_preview: truncate_chars(content, PREVIEW_CHARS),
        });
    }
}

impl Default for TranscriptParser {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_line(line: &str, line_num: usize) -> Result<RawEvent> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| ViewerError::parse_with_source(line_num, e.to_string(), e))?;
    RawEvent::from_value(value).ok_or_else(|| ViewerError::parse(line_num, "line is not a JSON object"))
}

/// Working directory and branch come from the first event carrying them.
fn capture_context(event: &RawEvent, meta: &mut ChatMeta) {
    if meta.cwd.is_none() {
        meta.cwd.clone_from(&event.cwd);
    }
    if meta.git_branch.is_none() {
        meta.git_branch.clone_from(&event.git_branch);
    }
}

fn classify_event(event: RawEvent, meta: &mut ChatMeta) -> Disposition {
    match &event.kind {
        EventKind::FileHistorySnapshot => Disposition::Filtered,
        EventKind::CustomTitle => {
            // Later renames win.
            if let Some(title) = event.custom_title {
                meta.custom_title = Some(title);
            }
            Disposition::Metadata
        }
        EventKind::Summary => match event.summary.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                let block = ContentBlock::Text { text: text.to_string() };
                Disposition::Turn(
                    ConversationTurn::new(Role::Summary, vec![block], event.timestamp)
                        .with_uuid(event.uuid),
                )
            }
            _ => Disposition::Filtered,
        },
        EventKind::User | EventKind::Assistant | EventKind::System => {
            let blocks = event
                .content
                .as_ref()
                .map(blocks_from_content)
                .unwrap_or_default();
            if blocks.is_empty() {
                return Disposition::Filtered;
            }

            let role = match event.kind {
                EventKind::User => Role::User,
                EventKind::Assistant => Role::Assistant,
                _ => Role::System,
            };
            let mut turn = ConversationTurn::new(role, blocks, event.timestamp)
                .with_uuid(event.uuid)
                .with_model(event.model);
            if event.is_compact_summary {
                turn.is_prompt = false;
            }
            Disposition::Turn(turn)
        }
        EventKind::Other(kind) => {
            let role = event
                .role
                .clone()
                .map_or_else(|| Role::Other(kind.clone()), Role::from);
            let block = ContentBlock::Unknown {
                kind: kind.clone(),
                raw: event.raw,
            };
            Disposition::Turn(
                ConversationTurn::new(role, vec![block], event.timestamp).with_uuid(event.uuid),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    const USER: &str = r#"{"type":"user","uuid":"u1","timestamp":"2025-03-01T10:00:00Z","cwd":"/home/dev/app","gitBranch":"main","message":{"role":"user","content":"Hello there"}}"#;
    const ASSISTANT: &str = r#"{"type":"assistant","uuid":"a1","timestamp":"2025-03-01T10:00:05Z","message":{"role":"assistant","model":"claude-sonnet","content":[{"type":"text","text":"Hi!"}]}}"#;
    const SNAPSHOT: &str = r#"{"type":"file-history-snapshot","messageId":"m1","snapshot":{"trackedFileBackups":{}}}"#;

    #[test]
    fn test_parse_empty() {
        let mut parser = TranscriptParser::new();
        let doc = parser.parse_str("empty", "").unwrap();
        assert!(doc.is_empty());
        assert_eq!(parser.stats().lines_processed, 0);
    }

    #[test]
    fn test_parse_conversation() {
        let content = format!("{USER}\n{ASSISTANT}\n");
        let mut parser = TranscriptParser::new();
        let doc = parser.parse_str("s1", &content).unwrap();

        assert_eq!(doc.identity, "s1");
        assert_eq!(doc.turns.len(), 2);
        assert_eq!(doc.turns[0].role, Role::User);
        assert_eq!(doc.turns[1].model.as_deref(), Some("claude-sonnet"));
        assert_eq!(doc.meta.first_prompt.as_deref(), Some("Hello there"));
        assert_eq!(doc.meta.cwd.as_deref(), Some("/home/dev/app"));
        assert_eq!(doc.meta.git_branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_lenient_parsing_skips_malformed() {
        let content = format!("{USER}\ninvalid json line\n[1,2]\n{ASSISTANT}");
        let mut parser = TranscriptParser::new();
        let doc = parser.parse_str("s1", &content).unwrap();

        assert_eq!(doc.turns.len(), 2);
        assert_eq!(parser.stats().malformed_lines, 2);
        assert_eq!(parser.stats().errors[0].line, 2);
        assert_eq!(parser.stats().errors[0].content_preview, "invalid json line");
    }

    #[test]
    fn test_strict_parsing_fails() {
        let content = format!("{USER}\nnot json\n");
        let mut parser = TranscriptParser::new().with_lenient(false);
        let err = parser.parse_str("s1", &content).unwrap_err();
        assert!(matches!(err, ViewerError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_snapshots_and_placeholders_are_filtered() {
        let empty = r#"{"type":"assistant","message":{"role":"assistant","content":[{"type":"text","text":"(no content)"}]}}"#;
        let no_content = r#"{"type":"user","message":{"role":"user"}}"#;
        let content = format!("{SNAPSHOT}\n{USER}\n{empty}\n{no_content}\n{SNAPSHOT}");

        let mut parser = TranscriptParser::new();
        let doc = parser.parse_str("s1", &content).unwrap();

        assert_eq!(doc.turns.len(), 1);
        assert_eq!(parser.stats().filtered_events, 4);
        assert_eq!(parser.stats().turns(), 1);
    }

    #[test]
    fn test_custom_title_is_metadata() {
        let first = r#"{"type":"custom-title","customTitle":"Old name","sessionId":"s1"}"#;
        let second = r#"{"type":"custom-title","customTitle":"Release prep","sessionId":"s1"}"#;
        let content = format!("{USER}\n{first}\n{second}");

        let mut parser = TranscriptParser::new();
        let doc = parser.parse_str("s1", &content).unwrap();

        assert_eq!(doc.turns.len(), 1);
        assert_eq!(doc.meta.custom_title.as_deref(), Some("Release prep"));
        assert_eq!(parser.stats().metadata_events, 2);
        assert_eq!(parser.stats().filtered_events, 2);
        assert_eq!(parser.stats().turns(), 1);
    }

    #[test]
    fn test_unknown_kind_becomes_unknown_turn() {
        let line = r#"{"type":"queue-operation","operation":"enqueue","timestamp":"2025-03-01T10:00:00Z"}"#;
        let mut parser = TranscriptParser::new();
        let doc = parser.parse_str("s1", line).unwrap();

        assert_eq!(doc.turns.len(), 1);
        assert_eq!(doc.turns[0].role, Role::Other("queue-operation".into()));
        assert!(matches!(
            &doc.turns[0].blocks[0],
            ContentBlock::Unknown { kind, .. } if kind == "queue-operation"
        ));
    }

    #[test]
    fn test_summary_record_renders_as_turn() {
        let line = r#"{"type":"summary","summary":"Refactored the parser","leafUuid":"x"}"#;
        let mut parser = TranscriptParser::new();
        let doc = parser.parse_str("s1", line).unwrap();

        assert_eq!(doc.turns[0].role, Role::Summary);
        assert_eq!(doc.turns[0].text(), "Refactored the parser");
    }

    #[test]
    fn test_first_prompt_skips_tool_results_and_compact_summaries() {
        let tool_result = r#"{"type":"user","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"t1","content":"ok"}]}}"#;
        let compact = r#"{"type":"user","isCompactSummary":true,"message":{"role":"user","content":"This session is being continued"}}"#;
        let content = format!("{tool_result}\n{compact}\n{USER}");

        let mut parser = TranscriptParser::new();
        let doc = parser.parse_str("s1", &content).unwrap();

        assert_eq!(doc.turns.len(), 3);
        assert_eq!(doc.stats.user_prompts, 1);
        assert_eq!(doc.meta.first_prompt.as_deref(), Some("Hello there"));
    }

    #[test]
    fn test_parse_stats_add_up() {
        let content = format!("{USER}\n\n{SNAPSHOT}\nbad\n   \n{ASSISTANT}\n");
        let mut parser = TranscriptParser::new();
        let doc = parser.parse_str("s1", &content).unwrap();
        let stats = parser.stats();

        assert_eq!(stats.lines_processed, 6);
        assert_eq!(stats.blank_lines, 2);
        assert_eq!(stats.malformed_lines, 1);
        assert_eq!(stats.events_parsed, 3);
        assert_eq!(stats.filtered_events, 1);
        assert_eq!(doc.turns.len(), stats.turns());
    }

    #[test]
    fn test_turns_are_lines_minus_filtered_and_malformed() {
        let title = r#"{"type":"custom-title","customTitle":"Renamed"}"#;
        let content = format!("{USER}
{title}
{SNAPSHOT}
bad
{ASSISTANT}");
        let mut parser = TranscriptParser::new();
        let doc = parser.parse_str("s1", &content).unwrap();
        let stats = parser.stats();

        assert_eq!(stats.blank_lines, 0);
        assert_eq!(stats.filtered_events, 2);
        assert_eq!(stats.metadata_events, 1);
        assert_eq!(
            doc.turns.len(),
            stats.lines_processed - stats.filtered_events - stats.malformed_lines
        );
    }

    #[test]
    fn test_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.jsonl");
        std::fs::write(&path, format!("{USER}\n{ASSISTANT}\n")).unwrap();

        let mut parser = TranscriptParser::new().with_max_file_size(16);
        let err = parser.parse_file(&path, "big").unwrap_err();
        assert!(matches!(err, ViewerError::TranscriptTooLarge { limit: 16, .. }));
    }

    #[test]
    fn test_missing_file() {
        let mut parser = TranscriptParser::new();
        let err = parser.parse_file("/nonexistent/x.jsonl", "x").unwrap_err();
        assert!(matches!(err, ViewerError::FileNotFound { .. }));
    }
}
