//! Configuration for a conversion run.
//!
//! Loaded from TOML; every key is optional and falls back to the defaults
//! below. The configuration is passed explicitly to each component, nothing
//! reads it from global state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};
use crate::model::Category;
use crate::util::atomic_write;

/// Folder name reserved for active chats.
pub const ACTIVE_FOLDER: &str = "Active";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Days without activity after which a chat stops being active.
    #[serde(default = "default_inactive_days")]
    pub inactive_days: u32,
    /// Where transcripts are read from.
    #[serde(default)]
    pub source: SourceConfig,
    /// Where pages and the dashboard are written.
    #[serde(default)]
    pub output: OutputConfig,
    /// Subagent transcript handling.
    #[serde(default)]
    pub agents: AgentsConfig,
    /// Short chat tier.
    #[serde(default)]
    pub shorts: ShortsConfig,
    /// Archive tier.
    #[serde(default)]
    pub archive: ArchiveConfig,
    /// Dashboard presentation.
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inactive_days: default_inactive_days(),
            source: SourceConfig::default(),
            output: OutputConfig::default(),
            agents: AgentsConfig::default(),
            shorts: ShortsConfig::default(),
            archive: ArchiveConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

/// Source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Root holding one directory per project.
    #[serde(default = "default_projects_path")]
    pub projects_path: PathBuf,
    /// Transcripts larger than this many MB are skipped (0 = unlimited).
    #[serde(default)]
    pub max_file_size_mb: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            projects_path: default_projects_path(),
            max_file_size_mb: 0,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output root.
    #[serde(default = "default_output_folder")]
    pub folder: PathBuf,
    /// Dashboard filename inside the output root.
    #[serde(default = "default_index_filename")]
    pub index_filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder: default_output_folder(),
            index_filename: default_index_filename(),
        }
    }
}

/// Subagent transcript configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Convert `agent-*.jsonl` transcripts.
    #[serde(default = "default_true")]
    pub include: bool,
    /// Skip agent transcripts smaller than this many KB.
    #[serde(default = "default_agent_min_kb")]
    pub min_size_kb: u64,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            include: true,
            min_size_kb: default_agent_min_kb(),
        }
    }
}

/// Short chat tier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortsConfig {
    /// Move small inactive chats to their own folder.
    #[serde(default)]
    pub enabled: bool,
    /// Folder name under `Chats/`.
    #[serde(default = "default_shorts_folder")]
    pub folder: String,
    /// Pages below this many KB count as short.
    #[serde(default = "default_short_max_kb")]
    pub max_size_kb: u64,
}

impl Default for ShortsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            folder: default_shorts_folder(),
            max_size_kb: default_short_max_kb(),
        }
    }
}

/// Archive tier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Move inactive chats to their own folder.
    #[serde(default)]
    pub enabled: bool,
    /// Folder name under `Chats/`.
    #[serde(default = "default_archive_folder")]
    pub folder: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            folder: default_archive_folder(),
        }
    }
}

/// Dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Page title.
    #[serde(default = "default_dashboard_title")]
    pub title: String,
    /// Hours a saved sort/filter state stays valid in the browser.
    #[serde(default = "default_state_ttl_hours")]
    pub state_ttl_hours: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: default_dashboard_title(),
            state_ttl_hours: default_state_ttl_hours(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self> {
        let config_path = default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ViewerError::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        toml::from_str(&content).map_err(|e| ViewerError::InvalidConfig {
            message: format!("{}: {e}", path.display()),
        })
    }

    /// Write the configuration to `path`, replacing any existing file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ViewerError::InvalidConfig {
            message: format!("Failed to serialize config: {e}"),
        })?;
        atomic_write(path, content.as_bytes())
    }

    /// Check that folder settings cannot collide.
    pub fn validate(&self) -> Result<()> {
        check_folder("shorts.folder", &self.shorts.folder)?;
        check_folder("archive.folder", &self.archive.folder)?;
        check_folder("output.index_filename", &self.output.index_filename)?;

        if self.shorts.folder == self.archive.folder {
            return Err(invalid("shorts.folder and archive.folder must differ"));
        }
        if self.dashboard.state_ttl_hours == 0 {
            return Err(invalid("dashboard.state_ttl_hours must be at least 1"));
        }
        Ok(())
    }

    /// Source root with `~` expanded.
    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        expand_tilde(&self.source.projects_path)
    }

    /// Output root with `~` expanded.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        expand_tilde(&self.output.folder)
    }

    /// Folder name of a category under `Chats/`.
    #[must_use]
    pub fn category_folder(&self, category: Category) -> &str {
        match category {
            Category::Active => ACTIVE_FOLDER,
            Category::Short => &self.shorts.folder,
            Category::Archived => &self.archive.folder,
        }
    }

    /// Categories the classifier may assign.
    #[must_use]
    pub fn enabled_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| match c {
                Category::Active => true,
                Category::Short => self.shorts.enabled,
                Category::Archived => self.archive.enabled,
            })
            .collect()
    }

    /// Short threshold in bytes.
    #[must_use]
    pub fn short_threshold_bytes(&self) -> u64 {
        self.shorts.max_size_kb.saturating_mul(1024)
    }

    /// Minimum agent transcript size in bytes.
    #[must_use]
    pub fn agent_min_bytes(&self) -> u64 {
        self.agents.min_size_kb.saturating_mul(1024)
    }

    /// Transcript size limit in bytes (0 = unlimited).
    #[must_use]
    pub fn max_file_size_bytes(&self) -> u64 {
        self.source.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

fn check_folder(key: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid(&format!("{key} must not be empty")));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(invalid(&format!("{key} must be a plain name, got {name:?}")));
    }
    if key != "output.index_filename" && name.eq_ignore_ascii_case(ACTIVE_FOLDER) {
        return Err(invalid(&format!("{key} must not be {ACTIVE_FOLDER:?}")));
    }
    Ok(())
}

fn invalid(message: &str) -> ViewerError {
    ViewerError::InvalidConfig {
        message: message.to_string(),
    }
}

/// Replace a leading `~` with the home directory.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest)),
        Err(_) => path.to_path_buf(),
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_inactive_days() -> u32 {
    5
}

fn default_projects_path() -> PathBuf {
    PathBuf::from("~/.claude/projects")
}

fn default_output_folder() -> PathBuf {
    PathBuf::from("~/ClaudeChats")
}

fn default_index_filename() -> String {
    "CCV-Dashboard.html".to_string()
}

fn default_agent_min_kb() -> u64 {
    3
}

fn default_shorts_folder() -> String {
    "Shorts".to_string()
}

fn default_short_max_kb() -> u64 {
    40
}

fn default_archive_folder() -> String {
    "Archived".to_string()
}

fn default_dashboard_title() -> String {
    "Claude Code Chats".to_string()
}

fn default_state_ttl_hours() -> u64 {
    5
}

/// Get the default configuration path.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ViewerError::config("Cannot determine the user configuration directory"))?;

    Ok(config_dir.join("code-chat-viewer").join("config.toml"))
}
