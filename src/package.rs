//! In-memory snapshot of a skill package on disk.
//!
//! Packages are edited by their authors between runs, so a snapshot is rebuilt
//! from the directory for every operation and never cached.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;
use tracing::debug;

use crate::error::SkillError;
use crate::metadata::{self, MetadataRecord};
use crate::section::{self, Section};
use crate::template::{is_markdown, Template, TemplateStore};

pub const MANIFEST: &str = "SKILL.md";

/// Resource directories a package may bundle.
pub const RESOURCE_DIRS: [&str; 4] = ["scripts", "references", "assets", "templates"];

#[derive(Debug, Clone)]
pub struct PackageFile {
    /// Relative to the package root.
    pub path: PathBuf,
    /// `None` for files that are not valid UTF-8.
    pub text: Option<String>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone)]
pub struct SkillPackage {
    pub root: PathBuf,
    pub dir_name: String,
    pub metadata: MetadataRecord,
    /// Every non-hidden file, sorted by path. Includes the manifest.
    pub files: Vec<PackageFile>,
    /// Every non-hidden directory below the root.
    pub dirs: BTreeSet<PathBuf>,
    /// Resource directory name → number of files under it, for directories that exist.
    pub resource_dirs: BTreeMap<String, usize>,
    /// Template named by the manifest's `template` key, if any.
    pub origin: Option<Arc<Template>>,
}

impl SkillPackage {
    /// Read a package directory into a snapshot.
    ///
    /// Fails only when the package cannot be interpreted at all: unreadable
    /// files, no manifest, an unparseable header, malformed section markers, or
    /// an unknown originating template.
    pub fn load(root: impl AsRef<Path>, store: &TemplateStore) -> Result<Self, SkillError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(SkillError::io(
                root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }
        let manifest_path = root.join(MANIFEST);
        if !manifest_path.is_file() {
            return Err(SkillError::ManifestNotFound(root.to_path_buf()));
        }

        let dir_name = root
            .canonicalize()
            .ok()
            .as_deref()
            .unwrap_or(root)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let mut files = Vec::new();
        let mut dirs = BTreeSet::new();
        // Only hidden entries are skipped; ignore files never hide package content.
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(true)
            .build();
        for entry in walker {
            let entry = entry.map_err(|e| {
                SkillError::io(root, std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
            })?;
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            if relative.as_os_str().is_empty() {
                continue;
            }
            let relative = relative.to_path_buf();
            match entry.file_type() {
                Some(t) if t.is_dir() => {
                    dirs.insert(relative);
                }
                Some(t) if t.is_file() => {
                    let bytes =
                        fs::read(entry.path()).map_err(|e| SkillError::io(entry.path(), e))?;
                    let text = String::from_utf8(bytes).ok();
                    let sections = match &text {
                        Some(text) if is_markdown(&relative) => section::parse(&relative, text)?,
                        _ => Vec::new(),
                    };
                    files.push(PackageFile {
                        path: relative,
                        text,
                        sections,
                    });
                }
                _ => {}
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let manifest = files
            .iter()
            .find(|f| f.path == Path::new(MANIFEST))
            .and_then(|f| f.text.as_deref())
            .ok_or_else(|| SkillError::HeaderParseError {
                file: PathBuf::from(MANIFEST),
                reason: "manifest is not valid UTF-8".to_string(),
            })?;
        let metadata = metadata::parse(MANIFEST, manifest)?;

        let origin = match metadata.template.as_deref() {
            Some(id) => Some(store.load(id)?),
            None => None,
        };

        let resource_dirs = RESOURCE_DIRS
            .iter()
            .filter(|name| dirs.contains(Path::new(name)))
            .map(|name| {
                let count = files.iter().filter(|f| f.path.starts_with(name)).count();
                (name.to_string(), count)
            })
            .collect();

        debug!(
            "loaded package {} ({} file(s), template: {:?})",
            root.display(),
            files.len(),
            metadata.template
        );

        Ok(Self {
            root: root.to_path_buf(),
            dir_name,
            metadata,
            files,
            dirs,
            resource_dirs,
            origin,
        })
    }

    pub fn file(&self, path: &Path) -> Option<&PackageFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn manifest(&self) -> &PackageFile {
        // Presence is checked in `load`.
        self.file(Path::new(MANIFEST))
            .unwrap_or_else(|| unreachable!("snapshot without manifest"))
    }

    pub fn manifest_text(&self) -> &str {
        self.manifest().text.as_deref().unwrap_or_default()
    }

    pub fn manifest_sections(&self) -> &[Section] {
        &self.manifest().sections
    }

    /// Whether `path` (package-relative, normalized) is a file or directory in the snapshot.
    pub fn contains(&self, path: &Path) -> bool {
        path.as_os_str().is_empty() || self.dirs.contains(path) || self.file(path).is_some()
    }

    /// Text files, in path order.
    pub fn text_files(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files
            .iter()
            .filter_map(|f| f.text.as_deref().map(|t| (f.path.as_path(), t)))
    }
}
