//! Synthetic transcript generators and filesystem helpers for tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Project directory used by the helpers.
pub const PROJECT_DIR: &str = "-home-dev-projects-app";

/// Builds a transcript line by line; each event is one minute after the last.
#[derive(Debug, Clone)]
pub struct TranscriptBuilder {
    lines: Vec<String>,
    clock: DateTime<Utc>,
    counter: usize,
}

impl Default for TranscriptBuilder {
    fn default() -> Self {
        Self::starting_at(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap())
    }
}

impl TranscriptBuilder {
    /// Builder whose first event is at `start`.
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            lines: Vec::new(),
            clock: start,
            counter: 0,
        }
    }

    fn tick(&mut self) -> (String, String) {
        let ts = self.clock.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        self.clock += Duration::minutes(1);
        self.counter += 1;
        (format!("uuid-{:04}", self.counter), ts)
    }

    fn push(&mut self, value: Value) -> &mut Self {
        self.lines.push(value.to_string());
        self
    }

    /// A user prompt.
    pub fn user(&mut self, text: &str) -> &mut Self {
        let (uuid, ts) = self.tick();
        self.push(json!({
            "type": "user",
            "uuid": uuid,
            "timestamp": ts,
            "cwd": "/home/dev/projects/app",
            "gitBranch": "main",
            "message": {"role": "user", "content": text}
        }))
    }

    /// An assistant text reply.
    pub fn assistant(&mut self, text: &str) -> &mut Self {
        let (uuid, ts) = self.tick();
        self.push(json!({
            "type": "assistant",
            "uuid": uuid,
            "timestamp": ts,
            "message": {
                "role": "assistant",
                "model": "claude-sonnet-4",
                "content": [{"type": "text", "text": text}]
            }
        }))
    }

    /// An assistant message holding a tool call and its result.
    pub fn assistant_with_tool(&mut self, text: &str, command: &str, output: &str) -> &mut Self {
        let (uuid, ts) = self.tick();
        self.push(json!({
            "type": "assistant",
            "uuid": uuid,
            "timestamp": ts,
            "message": {
                "role": "assistant",
                "content": [
                    {"type": "text", "text": text},
                    {"type": "tool_use", "id": "toolu_1", "name": "Bash", "input": {"command": command}},
                    {"type": "tool_result", "tool_use_id": "toolu_1", "content": output}
                ]
            }
        }))
    }

    /// A user message carrying only a tool result.
    pub fn tool_result(&mut self, output: &str) -> &mut Self {
        let (uuid, ts) = self.tick();
        self.push(json!({
            "type": "user",
            "uuid": uuid,
            "timestamp": ts,
            "message": {
                "role": "user",
                "content": [{"type": "tool_result", "tool_use_id": "toolu_9", "content": output}]
            }
        }))
    }

    /// An undo snapshot record.
    pub fn snapshot(&mut self) -> &mut Self {
        self.push(json!({
            "type": "file-history-snapshot",
            "messageId": format!("m{}", self.counter),
            "snapshot": {"trackedFileBackups": {}}
        }))
    }

    /// A rename marker.
    pub fn custom_title(&mut self, title: &str) -> &mut Self {
        self.push(json!({"type": "custom-title", "customTitle": title}))
    }

    /// A user message with the empty-content placeholder.
    pub fn placeholder(&mut self) -> &mut Self {
        let (uuid, ts) = self.tick();
        self.push(json!({
            "type": "user",
            "uuid": uuid,
            "timestamp": ts,
            "message": {"role": "user", "content": "(no content)"}
        }))
    }

    /// A raw line, written verbatim.
    pub fn raw(&mut self, line: &str) -> &mut Self {
        self.lines.push(line.to_string());
        self
    }

    /// The transcript text.
    pub fn build(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// 3 user prompts, 2 assistant replies (one with a tool call and result)
/// and one undo snapshot.
pub fn sample_transcript() -> String {
    TranscriptBuilder::default()
        .user("List the files")
        .assistant_with_tool("Running ls.", "ls", "Cargo.toml\nsrc")
        .snapshot()
        .user("Now count them")
        .assistant("There are 2 entries.")
        .user("Thanks <b>bye</b>")
        .build()
}

/// Write `content` as `<root>/<PROJECT_DIR>/<identity>.jsonl` with the given mtime.
pub fn write_transcript(root: &Path, identity: &str, content: &str, modified: SystemTime) -> PathBuf {
    let path = root.join(PROJECT_DIR).join(format!("{identity}.jsonl"));
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    set_mtime(&path, modified);
    path
}

/// Set a file's modification time.
pub fn set_mtime(path: &Path, modified: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}

/// A point `days` before `now`.
pub fn days_before(now: DateTime<Utc>, days: i64) -> SystemTime {
    (now - Duration::days(days)).into()
}

/// Every file under `root`, relative, sorted.
pub fn list_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}
