//! HTML generation for chat pages and the dashboard.
//!
//! - [`blocks`]: one content block to an HTML fragment
//! - [`page`]: a whole chat to a self-contained page
//! - [`dashboard`]: dashboard rows to the index page
//!
//! Every document is self-contained: styles and scripts are inline, and
//! nothing in the output depends on when it was generated.

pub mod blocks;
pub mod dashboard;
pub mod page;

pub use blocks::{render_block, render_timestamp};
pub use dashboard::{render_dashboard, DashboardOptions};
pub use page::{
    extract_page_metadata, output_filename, parse_output_filename, short_hash, PageAssembler,
    ParsedFilename, RenderedPage,
};

use std::io::Write;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;

use crate::error::{Result, ViewerError};

/// Name written into the `generator` meta tag.
const GENERATOR: &str = "code-chat-viewer";

/// Characters escaped in one path segment of a relative link.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encode one path segment for use in an `href`.
#[must_use]
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize a value for embedding inside a `<script>` element.
///
/// `<` is written as `\u003c` so the payload can never close the element.
pub fn script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).map_err(|e| ViewerError::SerializationError {
        context: "Failed to serialize embedded metadata".to_string(),
        source: e,
    })?;
    Ok(json.replace('<', "\\u003c"))
}

/// Write the document preamble up to and including the inline styles.
fn write_head<W: Write>(writer: &mut W, title: &str, styles: &str) -> Result<()> {
    writeln!(writer, "<!DOCTYPE html>")?;
    writeln!(writer, "<html lang=\"en\">")?;
    writeln!(writer, "<head>")?;
    writeln!(writer, "  <meta charset=\"UTF-8\">")?;
    writeln!(writer, "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">")?;
    writeln!(writer, "  <meta name=\"generator\" content=\"{GENERATOR}\">")?;
    writeln!(writer, "  <title>{}</title>", escape_html(title))?;
    writeln!(writer, "  <style>{styles}  </style>")?;
    Ok(())
}
