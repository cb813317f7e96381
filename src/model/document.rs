//! Conversation turns and the parsed chat document.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::ContentBlock;

/// Who a turn is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// The human, or tool results delivered on their behalf.
    User,
    /// The model.
    Assistant,
    /// System notices.
    System,
    /// Compaction summaries.
    Summary,
    /// Roles or record kinds outside the above.
    Other(String),
}

impl Role {
    /// Display label used in page headers.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::User => "User".to_string(),
            Self::Assistant => "Assistant".to_string(),
            Self::System => "System".to_string(),
            Self::Summary => "Summary".to_string(),
            Self::Other(name) => name.clone(),
        }
    }

    /// CSS class suffix.
    #[must_use]
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Summary => "summary",
            Self::Other(_) => "other",
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Self::User,
            "assistant" => Self::Assistant,
            "system" => Self::System,
            "summary" => Self::Summary,
            _ => Self::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
            Self::Summary => write!(f, "summary"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Ordered content blocks attributed to one role.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    /// Who produced the turn.
    pub role: Role,
    /// Content in original order.
    pub blocks: Vec<ContentBlock>,
    /// When the originating event was recorded.
    pub timestamp: Option<DateTime<Utc>>,
    /// Identity of the originating event.
    pub uuid: Option<String>,
    /// Model that produced an assistant turn.
    pub model: Option<String>,
    /// A real user prompt, as opposed to tool results or compaction summaries.
    pub is_prompt: bool,
}

impl ConversationTurn {
    /// Create a turn; `is_prompt` is derived from role and content.
    #[must_use]
    pub fn new(role: Role, blocks: Vec<ContentBlock>, timestamp: Option<DateTime<Utc>>) -> Self {
        let is_prompt = role == Role::User && blocks.iter().any(|b| !b.is_tool_result());
        Self {
            role,
            blocks,
            timestamp,
            uuid: None,
            model: None,
            is_prompt,
        }
    }

    /// Set the originating event identity.
    #[must_use]
    pub fn with_uuid(mut self, uuid: Option<String>) -> Self {
        self.uuid = uuid;
        self
    }

    /// Set the model name.
    #[must_use]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Combined text of all text blocks.
    #[must_use]
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Metadata picked up while parsing, used for titles and the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMeta {
    /// Title set by a rename command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_title: Option<String>,
    /// First user prompt, truncated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_prompt: Option<String>,
    /// Working directory of the first prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Git branch of the first prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
}

/// Statistics derived from the turns of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Number of visible turns.
    pub message_count: usize,
    /// Real user prompts.
    pub user_prompts: usize,
    /// Assistant turns.
    pub assistant_messages: usize,
    /// Tool use blocks.
    pub tool_calls: usize,
    /// Tool result blocks.
    pub tool_results: usize,
    /// Earliest turn timestamp in file order.
    #[serde(default)]
    pub first_timestamp: Option<DateTime<Utc>>,
    /// Latest turn timestamp in file order.
    #[serde(default)]
    pub last_timestamp: Option<DateTime<Utc>>,
    /// Roles in order of first appearance.
    #[serde(default)]
    pub participants: Vec<Role>,
}

impl DocumentStats {
    /// Compute statistics over a sequence of turns.
    #[must_use]
    pub fn from_turns(turns: &[ConversationTurn]) -> Self {
        let mut stats = Self {
            message_count: turns.len(),
            ..Self::default()
        };

        for turn in turns {
            if turn.is_prompt {
                stats.user_prompts += 1;
            }
            if turn.role == Role::Assistant {
                stats.assistant_messages += 1;
            }
            stats.tool_calls += turn.blocks.iter().filter(|b| b.is_tool_use()).count();
            stats.tool_results += turn.blocks.iter().filter(|b| b.is_tool_result()).count();

            if let Some(ts) = turn.timestamp {
                if stats.first_timestamp.is_none() {
                    stats.first_timestamp = Some(ts);
                }
                stats.last_timestamp = Some(ts);
            }
            if !stats.participants.contains(&turn.role) {
                stats.participants.push(turn.role.clone());
            }
        }

        stats
    }
}

/// A parsed, filtered conversation ready for rendering.
#[derive(Debug, Clone)]
pub struct ChatDocument {
    /// Stable chat identity (transcript file stem).
    pub identity: String,
    /// Turns in file order.
    pub turns: Vec<ConversationTurn>,
    /// Derived statistics.
    pub stats: DocumentStats,
    /// Metadata captured while parsing.
    pub meta: ChatMeta,
}

impl ChatDocument {
    /// Build a document and compute its statistics.
    #[must_use]
    pub fn new(identity: impl Into<String>, turns: Vec<ConversationTurn>, meta: ChatMeta) -> Self {
        let stats = DocumentStats::from_turns(&turns);
        Self {
            identity: identity.into(),
            turns,
            stats,
            meta,
        }
    }

    /// Whether no turn survived filtering.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Positions of real user prompts within `turns`.
    #[must_use]
    pub fn prompt_positions(&self) -> Vec<usize> {
        self.turns
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_prompt)
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether this chat is a subagent transcript.
    #[must_use]
    pub fn is_agent(&self) -> bool {
        self.identity.starts_with("agent-")
    }

    /// Human-facing title: custom title, then first prompt.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.meta
            .custom_title
            .as_deref()
            .or(self.meta.first_prompt.as_deref())
    }
}

/// Metadata embedded in every rendered page and read back by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Chat identity.
    pub identity: String,
    /// Short hash used in the filename.
    pub hash: String,
    /// Document statistics.
    pub stats: DocumentStats,
    /// Parsed metadata.
    #[serde(default)]
    pub meta: ChatMeta,
}

impl PageMetadata {
    /// Capture the metadata of a document.
    #[must_use]
    pub fn from_document(doc: &ChatDocument, hash: impl Into<String>) -> Self {
        Self {
            identity: doc.identity.clone(),
            hash: hash.into(),
            stats: doc.stats.clone(),
            meta: doc.meta.clone(),
        }
    }
}
