//! Activity classification and placement of rendered pages.
//!
//! A page is Active while its chat was used within the inactivity window.
//! Past that window a small page becomes Short (when enabled), otherwise
//! Archived (when enabled); with neither tier enabled it stays Active.
//! Organizing only moves files, it never rewrites them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::discovery::SourceChat;
use crate::error::{Result, ViewerError};
use crate::layout::{OutputLayout, PageFile};
use crate::model::Category;
use crate::util::{modified_time, remove_file_if_exists, to_utc};

/// Assigns pages to categories.
#[derive(Debug, Clone)]
pub struct Classifier {
    inactive: Duration,
    short_threshold: u64,
    shorts_enabled: bool,
    archive_enabled: bool,
}

/// Counters from one organize pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizeStats {
    /// Pages moved to another category folder.
    pub moved: usize,
    /// Stale copies removed because the destination already held the page.
    pub duplicates_removed: usize,
    /// Pages that could not be moved, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

impl Classifier {
    /// Create a classifier.
    #[must_use]
    pub fn new(inactive_days: u32, short_threshold_bytes: u64, shorts_enabled: bool, archive_enabled: bool) -> Self {
        Self {
            inactive: Duration::days(i64::from(inactive_days)),
            short_threshold: short_threshold_bytes,
            shorts_enabled,
            archive_enabled,
        }
    }

    /// Classifier configured from the tier settings.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.inactive_days,
            config.short_threshold_bytes(),
            config.shorts.enabled,
            config.archive.enabled,
        )
    }

    /// Category for a chat last active at `last_activity`.
    ///
    /// Exactly `inactive_days` old is still Active. Activity in the future
    /// (clock skew) is Active.
    #[must_use]
    pub fn classify(&self, last_activity: DateTime<Utc>, rendered_size: u64, now: DateTime<Utc>) -> Category {
        if now.signed_duration_since(last_activity) <= self.inactive {
            Category::Active
        } else if self.shorts_enabled && rendered_size < self.short_threshold {
            Category::Short
        } else if self.archive_enabled {
            Category::Archived
        } else {
            Category::Active
        }
    }

    /// Move every page into the folder of its category.
    ///
    /// Last activity is the source transcript's modification time, or the
    /// page's own when the source is gone. Running twice with the same `now`
    /// moves nothing the second time.
    #[instrument(skip_all, fields(root = %layout.root().display()))]
    pub fn organize(&self, layout: &OutputLayout, sources: &[SourceChat], now: DateTime<Utc>) -> Result<OrganizeStats> {
        let by_hash: HashMap<&str, &SourceChat> = sources.iter().map(|s| (s.hash.as_str(), s)).collect();
        let mut stats = OrganizeStats::default();

        for page in layout.scan_pages()? {
            // An earlier move in this pass may have replaced or removed it.
            if !page.path.exists() {
                continue;
            }

            let last_activity = by_hash
                .get(page.hash.as_str())
                .map_or(page.modified, |s| s.modified);
            let category = self.classify(to_utc(last_activity), page.size, now);
            if category == page.category {
                continue;
            }

            let dest_dir = layout.category_dir(category);
            match relocate(&page, &dest_dir) {
                Ok(Relocation::Moved(dest)) => {
                    info!(from = %page.path.display(), to = %dest.display(), %category, "Moved page");
                    stats.moved += 1;
                }
                Ok(Relocation::Deduplicated(removed)) => {
                    debug!(removed = %removed.display(), "Removed older duplicate");
                    stats.duplicates_removed += 1;
                }
                Err(e) => {
                    warn!(path = %page.path.display(), error = %e, "Failed to move page");
                    stats.failures.push((page.path.clone(), e.to_string()));
                }
            }
        }

        Ok(stats)
    }
}

enum Relocation {
    Moved(PathBuf),
    Deduplicated(PathBuf),
}

/// Move `page` into `dest_dir`; when a file of the same name is already
/// there, the newer of the two survives at the destination.
fn relocate(page: &PageFile, dest_dir: &Path) -> Result<Relocation> {
    std::fs::create_dir_all(dest_dir).map_err(|e| ViewerError::from_io_at(dest_dir, "create directory", e))?;
    let dest = dest_dir.join(page.file_name());

    if dest.exists() {
        let existing: SystemTime = modified_time(&dest)?;
        if existing >= page.modified {
            remove_file_if_exists(&page.path)?;
            return Ok(Relocation::Deduplicated(page.path.clone()));
        }
        remove_file_if_exists(&dest)?;
        rename(&page.path, &dest)?;
        return Ok(Relocation::Deduplicated(dest));
    }

    rename(&page.path, &dest)?;
    Ok(Relocation::Moved(dest))
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    std::fs::rename(from, to).map_err(|e| ViewerError::from_io_at(from, "move", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs::File;
    use tempfile::tempdir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_classify_boundary() {
        let classifier = Classifier::new(5, 40 * 1024, true, true);
        let at_threshold = now() - Duration::days(5);
        let past = now() - Duration::days(6);

        assert_eq!(classifier.classify(at_threshold, 1, now()), Category::Active);
        assert_eq!(classifier.classify(past, 1, now()), Category::Short);
        assert_eq!(classifier.classify(past, 40 * 1024, now()), Category::Archived);
        assert_eq!(
            classifier.classify(at_threshold - Duration::seconds(1), 100 * 1024, now()),
            Category::Archived
        );
    }

    #[test]
    fn test_classify_future_activity_is_active() {
        let classifier = Classifier::new(5, 0, false, true);
        assert_eq!(classifier.classify(now() + Duration::days(3), 1, now()), Category::Active);
    }

    #[test]
    fn test_classify_disabled_tiers() {
        let past = now() - Duration::days(30);

        let none = Classifier::new(5, 40 * 1024, false, false);
        assert_eq!(none.classify(past, 10, now()), Category::Active);

        let shorts_only = Classifier::new(5, 40 * 1024, true, false);
        assert_eq!(shorts_only.classify(past, 10, now()), Category::Short);
        assert_eq!(shorts_only.classify(past, 100 * 1024, now()), Category::Active);

        let archive_only = Classifier::new(5, 40 * 1024, false, true);
        assert_eq!(archive_only.classify(past, 10, now()), Category::Archived);
    }

    fn setup() -> (tempfile::TempDir, OutputLayout) {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.output.folder = dir.path().to_path_buf();
        config.archive.enabled = true;
        (dir, OutputLayout::from_config(&config))
    }

    fn page(layout: &OutputLayout, category: Category, name: &str, modified: DateTime<Utc>) -> PathBuf {
        let dir = layout.category_dir(category);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, name).unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(modified.into())
            .unwrap();
        path
    }

    #[test]
    fn test_organize_moves_and_is_idempotent() {
        let (_dir, layout) = setup();
        let classifier = Classifier::new(5, 0, false, true);
        let old = page(&layout, Category::Active, "Chat 2025-01-01 10-00 aaaaaaaa.html", now() - Duration::days(60));
        let fresh = page(&layout, Category::Active, "Chat 2025-06-14 10-00 bbbbbbbb.html", now() - Duration::days(1));

        let stats = classifier.organize(&layout, &[], now()).unwrap();
        assert_eq!(stats.moved, 1);
        assert!(!old.exists());
        assert!(layout
            .category_dir(Category::Archived)
            .join("Chat 2025-01-01 10-00 aaaaaaaa.html")
            .exists());
        assert!(fresh.exists());

        let again = classifier.organize(&layout, &[], now()).unwrap();
        assert_eq!(again, OrganizeStats::default());
    }

    #[test]
    fn test_organize_reactivates_with_source_activity() {
        let (_dir, layout) = setup();
        let classifier = Classifier::new(5, 0, false, true);
        let name = "Chat 2025-01-01 10-00 aaaaaaaa.html";
        page(&layout, Category::Archived, name, now() - Duration::days(60));

        let source = SourceChat {
            path: PathBuf::from("/src/p/x.jsonl"),
            identity: "x".into(),
            project_dir: "p".into(),
            is_agent: false,
            size: 10,
            modified: (now() - Duration::hours(2)).into(),
            hash: "aaaaaaaa".into(),
        };

        let stats = classifier.organize(&layout, &[source], now()).unwrap();
        assert_eq!(stats.moved, 1);
        assert!(layout.category_dir(Category::Active).join(name).exists());
    }

    #[test]
    fn test_organize_keeps_newer_duplicate() {
        let (_dir, layout) = setup();
        let classifier = Classifier::new(5, 0, false, true);
        let name = "Chat 2025-01-01 10-00 aaaaaaaa.html";
        let active = page(&layout, Category::Active, name, now() - Duration::days(40));
        let archived = page(&layout, Category::Archived, name, now() - Duration::days(50));
        std::fs::write(&active, "newer").unwrap();
        File::options()
            .write(true)
            .open(&active)
            .unwrap()
            .set_modified((now() - Duration::days(40)).into())
            .unwrap();

        let stats = classifier.organize(&layout, &[], now()).unwrap();
        assert_eq!(stats.duplicates_removed, 1);
        assert!(!active.exists());
        assert_eq!(std::fs::read_to_string(&archived).unwrap(), "newer");
    }
}
