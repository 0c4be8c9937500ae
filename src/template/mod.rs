//! Template definitions: an id plus an ordered list of file blueprints.

pub mod builtin;
pub mod store;

use std::path::{Path, PathBuf};

use crate::error::SkillError;
use crate::section::{self, Section};

pub use store::{TemplateInfo, TemplateStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Builtin,
    Directory(PathBuf),
}

/// One file of a template, with its section structure parsed up front.
#[derive(Debug, Clone)]
pub struct FileBlueprint {
    /// Path relative to the package root.
    pub path: PathBuf,
    pub content: String,
    pub sections: Vec<Section>,
    pub executable: bool,
}

impl FileBlueprint {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Result<Self, SkillError> {
        let path = path.into();
        let content = content.into();
        let sections = if is_markdown(&path) {
            section::parse(&path, &content)?
        } else {
            Vec::new()
        };
        let executable = path.starts_with("scripts");
        Ok(Self {
            path,
            content,
            sections,
            executable,
        })
    }

    /// CORE sections, including the implicit top-level section when the file
    /// has unmarked content.
    pub fn core_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.kind.is_core())
    }
}

/// An immutable, loaded template.
#[derive(Debug, Clone)]
pub struct Template {
    pub id: String,
    pub source: TemplateSource,
    pub files: Vec<FileBlueprint>,
}

impl Template {
    pub fn file(&self, path: &Path) -> Option<&FileBlueprint> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// Section markers are only recognised in markdown files.
pub fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("markdown")
    )
}
