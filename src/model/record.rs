//! Per-chat records that outlive a single run, and dashboard rows.

use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classification tier of a rendered chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Recently used.
    Active,
    /// Small and inactive.
    Short,
    /// Inactive.
    Archived,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 3] = [Self::Active, Self::Short, Self::Archived];

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Short => "Short",
            Self::Archived => "Archived",
        }
    }

    /// CSS class used in the dashboard.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Short => "short",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Descriptive session metadata from an external index.
///
/// Field names follow Claude Code's `sessions-index.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    /// Session identifier.
    #[serde(default)]
    pub session_id: String,
    /// Title set by the user.
    #[serde(default)]
    pub custom_title: Option<String>,
    /// Generated summary.
    #[serde(default)]
    pub summary: Option<String>,
    /// Project working directory.
    #[serde(default)]
    pub project_path: Option<String>,
    /// Git branch.
    #[serde(default)]
    pub git_branch: Option<String>,
    /// First prompt.
    #[serde(default)]
    pub first_prompt: Option<String>,
    /// Message count as seen by the indexer.
    #[serde(default)]
    pub message_count: Option<u64>,
    /// Creation time as an ISO string.
    #[serde(default)]
    pub created: Option<String>,
    /// Unknown fields for forward compatibility.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A rendered chat on disk.
#[derive(Debug, Clone)]
pub struct ChatRecord {
    /// Source transcript, if it still exists.
    pub source_path: Option<PathBuf>,
    /// Rendered page.
    pub output_path: PathBuf,
    /// Source modification time, the authoritative last activity.
    pub source_modified: Option<SystemTime>,
    /// Size of the rendered page in bytes.
    pub rendered_size: u64,
    /// Where the classifier placed the page.
    pub category: Category,
    /// Optional descriptive metadata.
    pub enrichment: Option<Enrichment>,
}

/// One dashboard table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardEntry {
    /// Chat identity.
    pub identity: String,
    /// Short filename hash.
    pub hash: String,
    /// Display name.
    pub name: String,
    /// Short project name.
    pub project: String,
    /// Full project path.
    pub project_full: String,
    /// Placement.
    pub category: Category,
    /// First activity.
    pub created: Option<DateTime<Utc>>,
    /// Last activity (source modification time).
    pub last_used: Option<DateTime<Utc>>,
    /// Visible turn count.
    pub messages: usize,
    /// Git branch.
    pub branch: String,
    /// First prompt.
    pub first_prompt: String,
    /// Enrichment summary.
    pub summary: String,
    /// Link relative to the dashboard, percent-encoded.
    pub link: String,
    /// Rendered page size in bytes.
    pub size: u64,
}
