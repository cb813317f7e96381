//! Rendering of individual content blocks.
//!
//! Text renders inline. Tool calls, tool results, reasoning and unknown
//! records render as collapsed `<details>` elements whose summary line gives a
//! short preview, so long transcripts stay scannable.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::escape_html;
use crate::model::ContentBlock;
use crate::util::truncate_chars;

/// Maximum characters of a collapsed preview.
pub const PREVIEW_CHARS: usize = 80;

/// Maximum characters of one expanded tool parameter.
pub const PARAM_VALUE_CHARS: usize = 2_000;

/// Render one content block as an HTML fragment.
#[must_use]
pub fn render_block(block: &ContentBlock) -> String {
    match block {
        ContentBlock::Text { text } => {
            format!("<p class=\"text\">{}</p>", escape_html(text.trim_end()))
        }
        ContentBlock::ToolUse { id, name, input } => render_tool_use(id, name, input),
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => render_tool_result(tool_use_id, content, *is_error),
        ContentBlock::Thinking { text } => format!(
            "<details class=\"block thinking\"><summary><span class=\"block-label\">Thinking</span> \
             <span class=\"preview\">{}</span></summary><div class=\"block-body\"><p>{}</p></div></details>",
            escape_html(&first_line_preview(text)),
            escape_html(text.trim())
        ),
        ContentBlock::Unknown { kind, raw } => format!(
            "<details class=\"block unknown\"><summary><span class=\"block-label\">{}</span></summary>\
             <div class=\"block-body\"><pre>{}</pre></div></details>",
            escape_html(kind),
            escape_html(&pretty_json(raw))
        ),
    }
}

/// Render a timestamp as a `<time>` element with a UTC fallback text.
///
/// The page script rewrites the text in the viewer's local time zone.
#[must_use]
pub fn render_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => format!(
            "<time class=\"ts\" datetime=\"{}\">{}</time>",
            ts.to_rfc3339_opts(SecondsFormat::Secs, true),
            ts.format("%Y-%m-%d %H:%M UTC")
        ),
        None => String::new(),
    }
}

fn render_tool_use(id: &str, name: &str, input: &Value) -> String {
    let mut html = format!(
        "<details class=\"block tool-use\" data-tool-id=\"{}\"><summary><span class=\"block-label\">{}</span>",
        escape_html(id),
        escape_html(name)
    );
    if let Some(preview) = tool_input_preview(input) {
        html.push_str(&format!(" <span class=\"preview\">{}</span>", escape_html(&preview)));
    }
    html.push_str("</summary><div class=\"block-body\">");

    match input {
        Value::Object(params) if !params.is_empty() => {
            for (key, value) in params {
                html.push_str(&format!(
                    "<div class=\"param\"><span class=\"param-key\">{}</span><pre>{}</pre></div>",
                    escape_html(key),
                    escape_html(&truncate_chars(&param_text(value), PARAM_VALUE_CHARS))
                ));
            }
        }
        Value::Object(_) | Value::Null => {
            html.push_str("<p class=\"empty\">No parameters</p>");
        }
        other => {
            html.push_str(&format!(
                "<pre>{}</pre>",
                escape_html(&truncate_chars(&pretty_json(other), PARAM_VALUE_CHARS))
            ));
        }
    }

    html.push_str("</div></details>");
    html
}

fn render_tool_result(tool_use_id: &str, content: &str, is_error: bool) -> String {
    let (class, label) = if is_error {
        ("tool-result error", "Error")
    } else {
        ("tool-result", "Result")
    };
    format!(
        "<details class=\"block {class}\" data-tool-id=\"{}\"><summary><span class=\"block-label\">{label}</span> \
         <span class=\"preview\">{}</span></summary><div class=\"block-body\"><pre>{}</pre></div></details>",
        escape_html(tool_use_id),
        escape_html(&first_line_preview(content)),
        escape_html(content)
    )
}

/// First parameter value of a tool call, flattened to one short line.
fn tool_input_preview(input: &Value) -> Option<String> {
    let (_, value) = input.as_object()?.iter().next()?;
    let text = param_text(value);
    let line = text.lines().next().unwrap_or_default().trim();
    (!line.is_empty()).then(|| truncate_chars(line, PREVIEW_CHARS))
}

fn first_line_preview(text: &str) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    truncate_chars(line, PREVIEW_CHARS)
}

/// Strings render raw, everything else as pretty JSON.
fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => pretty_json(other),
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_text_is_escaped() {
        let html = render_block(&ContentBlock::Text {
            text: "<b>bold</b> & 'quotes'".into(),
        });
        assert_eq!(
            html,
            "<p class=\"text\">&lt;b&gt;bold&lt;/b&gt; &amp; &#39;quotes&#39;</p>"
        );
    }

    #[test]
    fn test_tool_use_is_collapsed_with_preview() {
        let html = render_block(&ContentBlock::ToolUse {
            id: "toolu_1".into(),
            name: "Bash".into(),
            input: json!({"command": "ls -la\necho done", "timeout": 30}),
        });

        assert!(html.starts_with("<details class=\"block tool-use\""));
        assert!(!html.contains(" open"));
        assert!(html.contains("<span class=\"block-label\">Bash</span>"));
        assert!(html.contains("<span class=\"preview\">ls -la</span>"));
        assert!(html.contains("<span class=\"param-key\">timeout</span><pre>30</pre>"));
    }

    #[test]
    fn test_long_values_are_truncated() {
        let long = "x".repeat(5_000);
        let html = render_block(&ContentBlock::ToolUse {
            id: "t".into(),
            name: "Write".into(),
            input: json!({"content": long}),
        });

        let preview = format!("<span class=\"preview\">{}...</span>", "x".repeat(PREVIEW_CHARS));
        assert!(html.contains(&preview));
        let body = format!("<pre>{}...</pre>", "x".repeat(PARAM_VALUE_CHARS));
        assert!(html.contains(&body));
    }

    #[test]
    fn test_tool_result_error_marker() {
        let html = render_block(&ContentBlock::ToolResult {
            tool_use_id: "t".into(),
            content: "\n  command not found\nmore".into(),
            is_error: true,
        });
        assert!(html.contains("tool-result error"));
        assert!(html.contains("<span class=\"block-label\">Error</span>"));
        assert!(html.contains("<span class=\"preview\">command not found</span>"));
    }

    #[test]
    fn test_unknown_block_shows_raw_json() {
        let html = render_block(&ContentBlock::Unknown {
            kind: "image".into(),
            raw: json!({"type": "image", "alt": "<svg>"}),
        });
        assert!(html.contains("<span class=\"block-label\">image</span>"));
        assert!(html.contains("&quot;alt&quot;: &quot;&lt;svg&gt;&quot;"));
    }

    #[test]
    fn test_thinking_preview_is_first_line() {
        let html = render_block(&ContentBlock::Thinking {
            text: "First thought\nSecond thought".into(),
        });
        assert!(html.contains("<span class=\"preview\">First thought</span>"));
        assert!(html.contains("Second thought"));
    }

    #[test]
    fn test_render_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(
            render_timestamp(Some(ts)),
            "<time class=\"ts\" datetime=\"2025-03-01T09:05:07Z\">2025-03-01 09:05 UTC</time>"
        );
        assert_eq!(render_timestamp(None), "");
    }
}
