//! Assembly of a self-contained chat page.
//!
//! A page carries its own styles and scripts, a stats header, one article per
//! turn, and client-side navigation between user prompts. Its filename is
//! derived from the chat identity and the first event time (or, for a chat
//! without timestamps, the caller's fallback date), and its content from the
//! transcript only, so re-rendering an unchanged transcript produces the same
//! bytes under the same name.

use std::io::{self, Write};

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::warn;

use super::blocks::{render_block, render_timestamp};
use super::{encode_segment, escape_html, script_json, write_head};
use crate::error::{Result, ViewerError};
use crate::model::{ChatDocument, ConversationTurn, PageMetadata};

/// Id of the embedded metadata element.
pub const METADATA_ELEMENT_ID: &str = "ccv-chat-meta";

/// Hex characters of the identity hash used in filenames.
pub const HASH_LEN: usize = 8;

static FILENAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Chat (\d{4}-\d{2}-\d{2} \d{2}-\d{2}) ([0-9a-f]{8})\.html$")
        .expect("filename pattern is valid")
});

/// A rendered chat page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Output filename, without directory.
    pub filename: String,
    /// Full HTML document.
    pub html: String,
    /// The metadata embedded in `html`.
    pub metadata: PageMetadata,
}

/// Date and hash recovered from an output filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedFilename<'a> {
    /// Chat start, minute precision, UTC.
    pub started: DateTime<Utc>,
    /// Identity hash.
    pub hash: &'a str,
}

/// First [`HASH_LEN`] hex characters of the SHA-256 of the identity.
#[must_use]
pub fn short_hash(identity: &str) -> String {
    let digest = Sha256::digest(identity.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..HASH_LEN].to_string()
}

/// `Chat YYYY-MM-DD HH-MM <hash>.html` for a chat started at `started`.
#[must_use]
pub fn output_filename(identity: &str, started: DateTime<Utc>) -> String {
    format!(
        "Chat {} {}.html",
        started.format("%Y-%m-%d %H-%M"),
        short_hash(identity)
    )
}

/// Inverse of [`output_filename`]; `None` for anything that is not a page name.
#[must_use]
pub fn parse_output_filename(name: &str) -> Option<ParsedFilename<'_>> {
    let caps = FILENAME_RE.captures(name)?;
    let started = NaiveDateTime::parse_from_str(caps.get(1)?.as_str(), "%Y-%m-%d %H-%M")
        .ok()?
        .and_utc();
    Some(ParsedFilename {
        started,
        hash: caps.get(2)?.as_str(),
    })
}

/// Read the metadata block back out of a rendered page.
#[must_use]
pub fn extract_page_metadata(html: &str) -> Option<PageMetadata> {
    let open = format!("<script type=\"application/json\" id=\"{METADATA_ELEMENT_ID}\">");
    let start = html.find(&open)? + open.len();
    let len = html[start..].find("</script>")?;
    serde_json::from_str(&html[start..start + len]).ok()
}

/// Builds chat pages.
#[derive(Debug, Clone)]
pub struct PageAssembler {
    /// Link from a page back to the dashboard.
    dashboard_href: String,
}

impl PageAssembler {
    /// Create an assembler whose pages link to `dashboard_filename`.
    ///
    /// Pages live two levels below the dashboard (`Chats/<category>/`).
    #[must_use]
    pub fn new(dashboard_filename: &str) -> Self {
        Self {
            dashboard_href: format!("../../{}", encode_segment(dashboard_filename)),
        }
    }

    /// Render a document; `None` when it has no turns.
    ///
    /// A chat without any timestamp is dated at the Unix epoch; use
    /// [`Self::render_dated`] to supply a better date.
    pub fn render(&self, doc: &ChatDocument) -> Result<Option<RenderedPage>> {
        self.render_dated(doc, None)
    }

    /// Render a document, dating it `fallback` when no event has a timestamp.
    pub fn render_dated(&self, doc: &ChatDocument, fallback: Option<DateTime<Utc>>) -> Result<Option<RenderedPage>> {
        if doc.is_empty() {
            return Ok(None);
        }

        let started = match doc.stats.first_timestamp.or(fallback) {
            Some(started) => started,
            None => {
                warn!(identity = %doc.identity, "Chat has no timestamps, dating it at the Unix epoch");
                DateTime::<Utc>::default()
            }
        };
        let hash = short_hash(&doc.identity);
        let filename = output_filename(&doc.identity, started);
        let metadata = PageMetadata::from_document(doc, hash);

        let mut out = Vec::new();
        self.write_page(&mut out, doc, &metadata)?;
        let html = String::from_utf8(out).map_err(|e| {
            ViewerError::io(
                format!("Rendered page for {} is not UTF-8", doc.identity),
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })?;

        Ok(Some(RenderedPage {
            filename,
            html,
            metadata,
        }))
    }

    fn write_page<W: Write>(&self, writer: &mut W, doc: &ChatDocument, metadata: &PageMetadata) -> Result<()> {
        let title = page_title(doc);
        write_head(writer, &title, PAGE_STYLES)?;
        writeln!(
            writer,
            "  <script type=\"application/json\" id=\"{METADATA_ELEMENT_ID}\">{}</script>",
            script_json(metadata)?
        )?;
        writeln!(writer, "</head>")?;
        writeln!(writer, "<body>")?;

        self.write_toolbar(writer, doc)?;
        writeln!(writer, "<main class=\"conversation\">")?;
        write_header(writer, doc, &title)?;

        let prompts = doc.prompt_positions();
        let mut prompt_number = 0;
        for (index, turn) in doc.turns.iter().enumerate() {
            let counter = if turn.is_prompt {
                prompt_number += 1;
                Some((prompt_number, prompts.len()))
            } else {
                None
            };
            write_turn(writer, index, turn, counter)?;
        }

        writeln!(writer, "</main>")?;
        let positions: Vec<String> = prompts.iter().map(ToString::to_string).collect();
        writeln!(writer, "<script>const PROMPT_TURNS = [{}];</script>", positions.join(","))?;
        writeln!(writer, "<script>{PAGE_SCRIPT}</script>")?;
        writeln!(writer, "</body>")?;
        writeln!(writer, "</html>")?;
        Ok(())
    }

    fn write_toolbar<W: Write>(&self, writer: &mut W, doc: &ChatDocument) -> Result<()> {
        let total = doc.stats.user_prompts;
        writeln!(writer, "<nav class=\"toolbar\">")?;
        writeln!(writer, "  <a class=\"back\" href=\"{}\">&larr; Dashboard</a>", self.dashboard_href)?;
        writeln!(writer, "  <button type=\"button\" id=\"prev-prompt\" title=\"Previous prompt (k)\">&uarr;</button>")?;
        writeln!(writer, "  <span id=\"prompt-position\">0/{total}</span>")?;
        writeln!(writer, "  <button type=\"button\" id=\"next-prompt\" title=\"Next prompt (j)\">&darr;</button>")?;
        writeln!(writer, "  <input type=\"search\" id=\"search\" placeholder=\"Search (/)\">")?;
        writeln!(writer, "  <span id=\"search-count\"></span>")?;
        writeln!(writer, "</nav>")?;
        Ok(())
    }
}

fn page_title(doc: &ChatDocument) -> String {
    let base = doc
        .title()
        .map_or_else(|| format!("Chat {}", doc.identity), ToString::to_string);
    if doc.is_agent() {
        format!("[Agent] {base}")
    } else {
        base
    }
}

fn write_header<W: Write>(writer: &mut W, doc: &ChatDocument, title: &str) -> Result<()> {
    let stats = &doc.stats;
    writeln!(writer, "<header class=\"session-header\">")?;
    writeln!(writer, "  <h1>{}</h1>", escape_html(title))?;
    writeln!(writer, "  <div class=\"session-stats\">")?;
    write_stat(writer, "Messages", &stats.message_count.to_string())?;
    write_stat(writer, "Prompts", &stats.user_prompts.to_string())?;
    write_stat(writer, "Responses", &stats.assistant_messages.to_string())?;
    if stats.tool_calls > 0 {
        write_stat(writer, "Tool calls", &stats.tool_calls.to_string())?;
    }
    if stats.first_timestamp.is_some() {
        write_stat_html(writer, "Started", &render_timestamp(stats.first_timestamp))?;
        write_stat_html(writer, "Last activity", &render_timestamp(stats.last_timestamp))?;
    }
    let participants: Vec<String> = stats.participants.iter().map(|r| r.label()).collect();
    write_stat(writer, "Participants", &participants.join(", "))?;
    if let Some(cwd) = &doc.meta.cwd {
        write_stat(writer, "Directory", cwd)?;
    }
    if let Some(branch) = &doc.meta.git_branch {
        write_stat(writer, "Branch", branch)?;
    }
    writeln!(writer, "  </div>")?;
    writeln!(writer, "</header>")?;
    Ok(())
}

fn write_stat<W: Write>(writer: &mut W, label: &str, value: &str) -> Result<()> {
    write_stat_html(writer, label, &escape_html(value))
}

fn write_stat_html<W: Write>(writer: &mut W, label: &str, value_html: &str) -> Result<()> {
    writeln!(
        writer,
        "    <div class=\"stat-item\"><div class=\"stat-label\">{label}</div><div class=\"stat-value\">{value_html}</div></div>"
    )?;
    Ok(())
}

fn write_turn<W: Write>(
    writer: &mut W,
    index: usize,
    turn: &ConversationTurn,
    counter: Option<(usize, usize)>,
) -> Result<()> {
    let prompt_class = if turn.is_prompt { " prompt" } else { "" };
    writeln!(
        writer,
        "<article class=\"message message-{}{prompt_class}\" id=\"turn-{index}\">",
        turn.role.css_class()
    )?;
    writeln!(writer, "  <div class=\"message-header\">")?;
    writeln!(writer, "    <span class=\"message-role\">{}</span>", escape_html(&turn.role.label()))?;
    if let Some((n, total)) = counter {
        writeln!(writer, "    <span class=\"prompt-counter\">{n}/{total}</span>")?;
    }
    if let Some(model) = &turn.model {
        writeln!(writer, "    <span class=\"message-model\">{}</span>", escape_html(model))?;
    }
    writeln!(writer, "    <span class=\"message-timestamp\">{}</span>", render_timestamp(turn.timestamp))?;
    writeln!(writer, "  </div>")?;
    writeln!(writer, "  <div class=\"message-content\">")?;
    for block in &turn.blocks {
        writeln!(writer, "    {}", render_block(block))?;
    }
    writeln!(writer, "  </div>")?;
    writeln!(writer, "</article>")?;
    Ok(())
}

const PAGE_STYLES: &str = r#"
    :root {
      --bg-color: #ffffff;
      --text-color: #1a1a1a;
      --user-bg: #e8f4fd;
      --assistant-bg: #f5f5f5;
      --system-bg: #fff3cd;
      --summary-bg: #ede7f6;
      --tool-bg: #f8f9fa;
      --border-color: #dee2e6;
      --code-bg: #f4f4f4;
      --accent-color: #0066cc;
      --error-color: #b00020;
      --hit-color: #fff59d;
    }
    @media (prefers-color-scheme: dark) {
      :root {
        --bg-color: #1a1a1a;
        --text-color: #e0e0e0;
        --user-bg: #1e3a5f;
        --assistant-bg: #2d2d2d;
        --system-bg: #3d3520;
        --summary-bg: #2e2640;
        --tool-bg: #252525;
        --border-color: #404040;
        --code-bg: #2d2d2d;
        --accent-color: #4da6ff;
        --error-color: #ff6b81;
        --hit-color: #5c5300;
      }
    }
    * { box-sizing: border-box; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
      line-height: 1.6;
      margin: 0;
      background-color: var(--bg-color);
      color: var(--text-color);
    }
    .toolbar {
      position: sticky;
      top: 0;
      z-index: 10;
      display: flex;
      gap: 8px;
      align-items: center;
      padding: 8px 20px;
      background: var(--tool-bg);
      border-bottom: 1px solid var(--border-color);
    }
    .toolbar a.back { color: var(--accent-color); text-decoration: none; margin-right: auto; }
    .toolbar input { padding: 4px 8px; min-width: 200px; }
    .conversation { max-width: 900px; margin: 0 auto; padding: 20px; }
    .session-header { border-bottom: 2px solid var(--border-color); margin-bottom: 30px; padding-bottom: 20px; }
    .session-header h1 { margin: 0 0 15px 0; font-size: 1.6em; overflow-wrap: anywhere; }
    .session-stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); gap: 10px; }
    .stat-item { background: var(--tool-bg); padding: 10px 15px; border-radius: 6px; }
    .stat-label { font-size: 0.8em; opacity: 0.7; }
    .stat-value { font-weight: 600; overflow-wrap: anywhere; }
    .message {
      margin-bottom: 20px;
      padding: 16px 20px;
      border-radius: 8px;
      border: 1px solid var(--border-color);
      scroll-margin-top: 60px;
    }
    .message-user { background-color: var(--user-bg); }
    .message-assistant { background-color: var(--assistant-bg); }
    .message-system, .message-other { background-color: var(--system-bg); }
    .message-summary { background-color: var(--summary-bg); }
    .message.current { outline: 2px solid var(--accent-color); }
    .message.hit { box-shadow: 0 0 0 3px var(--hit-color); }
    .message-header {
      display: flex;
      gap: 12px;
      align-items: center;
      margin-bottom: 12px;
      padding-bottom: 8px;
      border-bottom: 1px solid var(--border-color);
    }
    .message-role { font-weight: 600; text-transform: uppercase; font-size: 0.85em; letter-spacing: 0.05em; }
    .prompt-counter { font-size: 0.8em; color: var(--accent-color); }
    .message-model { font-size: 0.8em; opacity: 0.6; }
    .message-timestamp { font-size: 0.8em; opacity: 0.7; margin-left: auto; }
    .message-content { overflow-wrap: anywhere; }
    p.text { white-space: pre-wrap; margin: 0 0 1em 0; }
    p.text:last-child { margin-bottom: 0; }
    details.block {
      background-color: var(--tool-bg);
      border: 1px solid var(--border-color);
      border-radius: 6px;
      margin: 12px 0;
    }
    details.block summary { padding: 8px 15px; cursor: pointer; white-space: nowrap; overflow: hidden; text-overflow: ellipsis; }
    details.thinking { border-style: dashed; font-style: italic; }
    details.error .block-label { color: var(--error-color); }
    .block-label { font-weight: 600; color: var(--accent-color); }
    .preview { opacity: 0.75; font-family: 'SF Mono', Monaco, Consolas, 'Liberation Mono', monospace; font-size: 0.85em; }
    .block-body { padding: 0 15px 12px; }
    .block-body p { white-space: pre-wrap; }
    .param-key { font-weight: 600; font-size: 0.85em; }
    pre {
      font-family: 'SF Mono', Monaco, Consolas, 'Liberation Mono', monospace;
      font-size: 0.85em;
      background-color: var(--code-bg);
      padding: 10px;
      border-radius: 6px;
      overflow-x: auto;
      white-space: pre-wrap;
      margin: 6px 0;
    }
"#;

const PAGE_SCRIPT: &str = r#"
(function () {
  document.querySelectorAll('time.ts').forEach(function (el) {
    var d = new Date(el.getAttribute('datetime'));
    if (!isNaN(d)) el.textContent = d.toLocaleString();
  });

  var turns = PROMPT_TURNS.map(function (i) { return document.getElementById('turn-' + i); });
  var position = document.getElementById('prompt-position');
  var current = -1;

  function go(index) {
    if (!turns.length) return;
    index = Math.max(0, Math.min(turns.length - 1, index));
    if (current >= 0) turns[current].classList.remove('current');
    current = index;
    turns[current].classList.add('current');
    turns[current].scrollIntoView({ behavior: 'smooth', block: 'start' });
    position.textContent = (current + 1) + '/' + turns.length;
  }

  document.getElementById('prev-prompt').addEventListener('click', function () { go(current - 1); });
  document.getElementById('next-prompt').addEventListener('click', function () { go(current + 1); });

  var search = document.getElementById('search');
  var count = document.getElementById('search-count');
  var messages = Array.prototype.slice.call(document.querySelectorAll('.message'));
  var hits = [];
  var hitIndex = -1;

  function runSearch() {
    var q = search.value.trim().toLowerCase();
    hits = [];
    hitIndex = -1;
    messages.forEach(function (m) {
      var match = q !== '' && m.textContent.toLowerCase().indexOf(q) !== -1;
      m.classList.toggle('hit', match);
      if (match) hits.push(m);
    });
    count.textContent = q === '' ? '' : hits.length + ' found';
  }

  search.addEventListener('input', runSearch);
  search.addEventListener('keydown', function (e) {
    if (e.key === 'Enter' && hits.length) {
      hitIndex = (hitIndex + (e.shiftKey ? hits.length - 1 : 1)) % hits.length;
      hits[hitIndex].scrollIntoView({ behavior: 'smooth', block: 'start' });
      count.textContent = (hitIndex + 1) + '/' + hits.length;
    } else if (e.key === 'Escape') {
      search.value = '';
      runSearch();
      search.blur();
    }
  });

  document.addEventListener('keydown', function (e) {
    if (e.target === search || e.ctrlKey || e.metaKey || e.altKey) return;
    if (e.key === 'j' || e.key === 'n') { go(current + 1); e.preventDefault(); }
    else if (e.key === 'k' || e.key === 'p') { go(current - 1); e.preventDefault(); }
    else if (e.key === '/') { search.focus(); e.preventDefault(); }
  });
})();
"#;
