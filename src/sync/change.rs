//! Decides whether a transcript needs rendering.

use std::fmt;
use std::path::Path;
use std::time::SystemTime;

use crate::error::Result;
use crate::util::modified_time;

/// Outcome of a change check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDecision {
    /// No output exists yet.
    New,
    /// The source is newer than its output.
    Updated,
    /// The output is current.
    Unchanged,
}

impl ChangeDecision {
    /// Whether the output must be (re)written.
    #[must_use]
    pub const fn needs_render(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl fmt::Display for ChangeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Updated => write!(f, "updated"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Compares source and output modification times.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector;

impl ChangeDetector {
    /// Decide from known modification times.
    ///
    /// Equal times count as unchanged; only a strictly newer source
    /// triggers a render.
    #[must_use]
    pub fn decide(source_modified: SystemTime, output_modified: Option<SystemTime>) -> ChangeDecision {
        match output_modified {
            None => ChangeDecision::New,
            Some(output) if source_modified > output => ChangeDecision::Updated,
            Some(_) => ChangeDecision::Unchanged,
        }
    }

    /// Decide by reading both files' modification times.
    pub fn check(source: &Path, output: Option<&Path>) -> Result<ChangeDecision> {
        let source_modified = modified_time(source)?;
        let output_modified = match output {
            Some(path) if path.exists() => Some(modified_time(path)?),
            _ => None,
        };
        Ok(Self::decide(source_modified, output_modified))
    }
}
