//! Tool-level faults.
//!
//! Anything in here stops the current operation. Problems with the content of a
//! package are never raised as errors; they are collected as
//! [`ValidationResult`](crate::rules::ValidationResult)s instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkillError {
    #[error("template not found: '{id}' (available: {})", available.join(", "))]
    TemplateNotFound { id: String, available: Vec<String> },

    #[error("malformed section marker in {}:{line}: {reason} (marker: `{marker}`)", file.display())]
    MalformedSectionMarker {
        file: PathBuf,
        line: usize,
        marker: String,
        reason: String,
    },

    #[error("cannot parse manifest header in {}: {reason}", file.display())]
    HeaderParseError { file: PathBuf, reason: String },

    #[error("SKILL.md not found in {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("invalid skill name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("write failed after {written} file(s) in {}: {source} ({})", dir.display(), partial_state(*rolled_back))]
    PartialWrite {
        dir: PathBuf,
        written: usize,
        rolled_back: bool,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SkillError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SkillError::Io {
            path: path.into(),
            source,
        }
    }
}

fn partial_state(rolled_back: bool) -> &'static str {
    if rolled_back {
        "directory removed"
    } else {
        "partial package left in place"
    }
}
