//! Utility functions shared across the crate.
//!
//! - Atomic file writes, so a reader never sees a half-written page
//! - Text truncation and size formatting
//! - Modification time helpers

use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::error::{Result, ViewerError};

/// Atomically write content to a file.
///
/// The content is written to a temporary file in the target's directory,
/// flushed, and renamed over the target. If any step fails the original file
/// (if it exists) remains unchanged. Missing parent directories are created.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, or the
/// temporary file cannot be written or persisted.
///
/// # Example
///
/// ```rust,no_run
/// use code_chat_viewer::util::atomic_write;
///
/// atomic_write("Chats/Active/page.html", b"<!DOCTYPE html>").unwrap();
/// ```
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    let parent = path.parent().ok_or_else(|| ViewerError::IoError {
        context: format!("Cannot determine parent directory for: {}", path.display()),
        source: io::Error::new(io::ErrorKind::InvalidInput, "No parent directory"),
    })?;

    if !parent.exists() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ViewerError::from_io_at(parent, "create directory", e))?;
    }

    // Same directory keeps the rename on one filesystem.
    let mut temp_file = NamedTempFile::new_in(parent)
        .map_err(|e| ViewerError::from_io_at(parent, "create temporary file in", e))?;

    temp_file.write_all(content).map_err(|e| {
        ViewerError::io(format!("Failed to write temporary file for: {}", path.display()), e)
    })?;
    temp_file.flush().map_err(|e| {
        ViewerError::io(format!("Failed to flush temporary file for: {}", path.display()), e)
    })?;

    temp_file
        .persist(path)
        .map_err(|e| ViewerError::from_io_at(path, "atomically write", e.error))?;

    Ok(())
}

/// Remove a file, treating "already gone" as success.
///
/// Returns whether a file was actually removed.
pub fn remove_file_if_exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ViewerError::from_io_at(path, "remove", e)),
    }
}

/// Modification time of a file.
pub fn modified_time(path: impl AsRef<Path>) -> Result<SystemTime> {
    let path = path.as_ref();
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| ViewerError::from_io_at(path, "read modification time of", e))
}

/// Convert a filesystem time to UTC.
#[must_use]
pub fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

/// Truncate to at most `max_chars` characters, appending `...` when cut.
///
/// Character-aware, so multi-byte text never splits mid-codepoint.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((end, _)) => format!("{}...", &s[..end]),
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Format a size in bytes as a human-readable string.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page.html");

        atomic_write(&path, b"<p>one</p>").unwrap();
        atomic_write(&path, b"<p>two</p>").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>two</p>");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Chats").join("Active").join("page.html");

        atomic_write(&path, b"content").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        atomic_write(dir.path().join("a.html"), b"a").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.html")]);
    }

    #[test]
    fn test_remove_file_if_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x");
        std::fs::write(&path, "x").unwrap();

        assert!(remove_file_if_exists(&path).unwrap());
        assert!(!remove_file_if_exists(&path).unwrap());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exactly", 7), "exactly");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("héllo wörld", 4), "héll...");
        assert_eq!(truncate_chars("日本語テキスト", 2), "日本...");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\n\n b\tc  "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
