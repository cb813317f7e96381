//! Content block types for transcript messages.
//!
//! A message payload is either a plain string or an array of typed blocks.
//! The four block kinds the viewer understands are decoded into
//! [`ContentBlock`] variants; anything else is kept verbatim as
//! [`ContentBlock::Unknown`] so no information is silently dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Literal placeholder Claude Code writes for messages without content.
pub const EMPTY_PLACEHOLDER: &str = "(no content)";

/// One unit of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Natural language text.
    Text {
        /// The text content.
        text: String,
    },

    /// Tool invocation request.
    ToolUse {
        /// Tool use ID, links to the matching result.
        id: String,
        /// Tool name.
        name: String,
        /// Tool input parameters.
        input: Value,
    },

    /// Tool execution outcome, flattened to text.
    ToolResult {
        /// Links to the originating tool use.
        tool_use_id: String,
        /// Result content.
        content: String,
        /// Whether the tool reported an error.
        is_error: bool,
    },

    /// Extended reasoning.
    Thinking {
        /// Reasoning text.
        text: String,
    },

    /// A block or record of a kind the viewer does not model.
    Unknown {
        /// The original type discriminant.
        kind: String,
        /// The original JSON.
        raw: Value,
    },
}

/// Wire shape of the block kinds we decode; everything else falls back to
/// [`ContentBlock::Unknown`].
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: String,
        #[serde(default)]
        content: Value,
        #[serde(default)]
        is_error: Option<bool>,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
}

impl ContentBlock {
    /// Decode a single block from its JSON form.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        if let Value::String(text) = value {
            return Self::Text { text: text.clone() };
        }

        match serde_json::from_value::<WireBlock>(value.clone()) {
            Ok(WireBlock::Text { text }) => Self::Text { text },
            Ok(WireBlock::ToolUse { id, name, input }) => Self::ToolUse { id, name, input },
            Ok(WireBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            }) => Self::ToolResult {
                tool_use_id,
                content: flatten_result_content(&content),
                is_error: is_error.unwrap_or(false),
            },
            Ok(WireBlock::Thinking { thinking }) => Self::Thinking { text: thinking },
            Err(_) => Self::Unknown {
                kind: value
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                raw: value.clone(),
            },
        }
    }

    /// Check if this is a tool result block.
    #[must_use]
    pub const fn is_tool_result(&self) -> bool {
        matches!(self, Self::ToolResult { .. })
    }

    /// Check if this is a tool use block.
    #[must_use]
    pub const fn is_tool_use(&self) -> bool {
        matches!(self, Self::ToolUse { .. })
    }

    /// Text blocks that carry nothing (blank or the literal placeholder).
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        match self {
            Self::Text { text } => {
                let trimmed = text.trim();
                trimmed.is_empty() || trimmed == EMPTY_PLACEHOLDER
            }
            _ => false,
        }
    }

    /// Get the text if this is a text block.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Decode a message `content` payload into blocks.
///
/// Placeholder text blocks are dropped; the caller decides whether an empty
/// result makes the whole message a placeholder.
#[must_use]
pub fn blocks_from_content(content: &Value) -> Vec<ContentBlock> {
    let blocks = match content {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(ContentBlock::from_value).collect(),
        other => vec![ContentBlock::from_value(other)],
    };
    blocks.into_iter().filter(|b| !b.is_placeholder()).collect()
}

/// Flatten a tool result payload (string, array of blocks, or other JSON).
fn flatten_result_content(content: &Value) -> String {
    match content {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                _ => match item.get("type").and_then(Value::as_str) {
                    Some("text") => item
                        .get("text")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    Some(other) => format!("[{other}]"),
                    None => item.to_string(),
                },
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_known_blocks() {
        let text = ContentBlock::from_value(&json!({"type": "text", "text": "hi"}));
        assert_eq!(text, ContentBlock::Text { text: "hi".into() });

        let tool = ContentBlock::from_value(&json!({
            "type": "tool_use", "id": "toolu_1", "name": "Read", "input": {"file_path": "/a"}
        }));
        assert!(tool.is_tool_use());

        let thinking = ContentBlock::from_value(&json!({"type": "thinking", "thinking": "hmm", "signature": "x"}));
        assert_eq!(thinking, ContentBlock::Thinking { text: "hmm".into() });
    }

    #[test]
    fn test_tool_result_array_content_is_flattened() {
        let block = ContentBlock::from_value(&json!({
            "type": "tool_result",
            "tool_use_id": "toolu_1",
            "content": [{"type": "text", "text": "line one"}, {"type": "image"}],
            "is_error": true
        }));

        assert_eq!(
            block,
            ContentBlock::ToolResult {
                tool_use_id: "toolu_1".into(),
                content: "line one\n[image]".into(),
                is_error: true,
            }
        );
    }

    #[test]
    fn test_unknown_block_keeps_raw() {
        let raw = json!({"type": "image", "source": {"type": "base64", "data": "AA=="}});
        match ContentBlock::from_value(&raw) {
            ContentBlock::Unknown { kind, raw: kept } => {
                assert_eq!(kind, "image");
                assert_eq!(kept, raw);
            }
            other => panic!("expected unknown block, got {other:?}"),
        }
    }

    #[test]
    fn test_placeholders_are_dropped() {
        assert!(blocks_from_content(&json!("")).is_empty());
        assert!(blocks_from_content(&json!("(no content)")).is_empty());
        assert!(blocks_from_content(&json!([{"type": "text", "text": "  "}])).is_empty());
        assert!(blocks_from_content(&json!([])).is_empty());
        assert_eq!(blocks_from_content(&json!("hello")).len(), 1);
    }
}
