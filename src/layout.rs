//! On-disk layout of the output tree.
//!
//! ```text
//! <output>/
//!   CCV-Dashboard.html
//!   Chats/
//!     Active/<page>.html
//!     Shorts/<page>.html
//!     Archived/<page>.html
//! ```
//!
//! Every category folder sits at the same depth, so a page's relative link
//! back to the dashboard stays valid wherever the classifier puts it.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::Config;
use crate::error::{Result, ViewerError};
use crate::export::{encode_segment, parse_output_filename};
use crate::model::Category;

/// Folder under the output root that holds the category folders.
pub const CHATS_FOLDER: &str = "Chats";

/// A rendered page found in the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFile {
    /// Full path.
    pub path: PathBuf,
    /// Identity hash from the filename.
    pub hash: String,
    /// Chat start from the filename.
    pub started: DateTime<Utc>,
    /// Folder the page currently sits in.
    pub category: Category,
    /// Size in bytes.
    pub size: u64,
    /// Modification time.
    pub modified: SystemTime,
}

impl PageFile {
    /// Filename without directory.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Paths of the output tree for one configuration.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    dashboard_filename: String,
    folders: [(Category, String); 3],
}

impl OutputLayout {
    /// Layout rooted at the configured output folder.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.output_dir(),
            dashboard_filename: config.output.index_filename.clone(),
            folders: Category::ALL.map(|c| (c, config.category_folder(c).to_string())),
        }
    }

    /// Output root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Dashboard filename.
    #[must_use]
    pub fn dashboard_filename(&self) -> &str {
        &self.dashboard_filename
    }

    /// Full path of the dashboard.
    #[must_use]
    pub fn dashboard_path(&self) -> PathBuf {
        self.root.join(&self.dashboard_filename)
    }

    /// Folder holding pages of `category`.
    #[must_use]
    pub fn category_dir(&self, category: Category) -> PathBuf {
        let folder = self
            .folders
            .iter()
            .find(|(c, _)| *c == category)
            .map_or("", |(_, f)| f.as_str());
        self.root.join(CHATS_FOLDER).join(folder)
    }

    /// All pages in all category folders, ordered by category then name.
    ///
    /// Folders of disabled categories are scanned too, so pages left behind
    /// by an earlier configuration are still found. Files whose names are not
    /// page names are ignored.
    pub fn scan_pages(&self) -> Result<Vec<PageFile>> {
        let mut pages = Vec::new();
        for category in Category::ALL {
            let dir = self.category_dir(category);
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(ViewerError::from_io_at(&dir, "read directory", e)),
            };

            let mut found = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|e| ViewerError::from_io_at(&dir, "read directory", e))?;
                let Some(name) = entry.file_name().to_str().map(String::from) else {
                    continue;
                };
                let Some(parsed) = parse_output_filename(&name) else {
                    continue;
                };
                let metadata = match entry.metadata() {
                    Ok(m) if m.is_file() => m,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!(path = %entry.path().display(), error = %e, "Cannot stat page, skipping");
                        continue;
                    }
                };
                found.push(PageFile {
                    path: entry.path(),
                    hash: parsed.hash.to_string(),
                    started: parsed.started,
                    category,
                    size: metadata.len(),
                    modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                });
            }
            found.sort_by(|a, b| a.path.cmp(&b.path));
            pages.extend(found);
        }
        Ok(pages)
    }

    /// Link from the dashboard to `path`, percent-encoded per segment.
    #[must_use]
    pub fn relative_link(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| encode_segment(&c.as_os_str().to_string_lossy()))
            .collect::<Vec<_>>()
            .join("/")
    }
}
