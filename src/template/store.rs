//! Registry of built-in and user-supplied templates.
//!
//! Templates are built lazily and cached for the life of the store. Each id
//! owns a `OnceCell`, so concurrent loads of the same id construct it once and
//! everyone else waits for that result.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ignore::WalkBuilder;
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::SkillError;
use crate::package::MANIFEST;
use crate::template::{builtin, FileBlueprint, Template, TemplateSource};
use crate::util::expand_home;

const TEMPLATE_SUFFIX: &str = ".template";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInfo {
    pub id: String,
    pub source: TemplateSource,
    pub files: usize,
}

pub struct TemplateStore {
    dirs: Vec<PathBuf>,
    cache: Mutex<HashMap<String, Arc<OnceCell<Arc<Template>>>>>,
    constructed: AtomicUsize,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::builtin_only()
    }
}

impl TemplateStore {
    /// Store with user template directories searched in order after the built-ins.
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            dirs: dirs.into_iter().map(|d| expand_home(d.as_ref())).collect(),
            cache: Mutex::new(HashMap::new()),
            constructed: AtomicUsize::new(0),
        }
    }

    pub fn builtin_only() -> Self {
        Self::new(Vec::<PathBuf>::new())
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// How many templates have actually been built (cache misses).
    pub fn constructed(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }

    /// Every available template id: built-ins first, then user templates by id.
    pub fn list(&self) -> Vec<TemplateInfo> {
        let mut infos: Vec<TemplateInfo> = builtin::BUILTIN_IDS
            .iter()
            .map(|id| TemplateInfo {
                id: id.to_string(),
                source: TemplateSource::Builtin,
                files: builtin::file_count(id).unwrap_or(0),
            })
            .collect();

        let mut user: BTreeMap<String, PathBuf> = BTreeMap::new();
        for dir in &self.dirs {
            for (id, path) in template_dirs_in(dir) {
                if builtin::is_builtin(&id) {
                    warn!(
                        "user template {} shadows built-in '{}' and is ignored",
                        path.display(),
                        id
                    );
                    continue;
                }
                user.entry(id).or_insert(path);
            }
        }

        infos.extend(user.into_iter().map(|(id, path)| TemplateInfo {
            files: collect_files(&path).len(),
            id,
            source: TemplateSource::Directory(path),
        }));
        infos
    }

    pub fn ids(&self) -> Vec<String> {
        self.list().into_iter().map(|info| info.id).collect()
    }

    /// Load a template by id, building it on first use.
    pub fn load(&self, id: &str) -> Result<Arc<Template>, SkillError> {
        let cell = {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(cache.entry(id.to_string()).or_default())
        };

        cell.get_or_try_init(|| {
            let template = self.build(id)?;
            self.constructed.fetch_add(1, Ordering::SeqCst);
            debug!(
                "loaded template '{}' ({} file(s))",
                template.id,
                template.files.len()
            );
            Ok(Arc::new(template))
        })
        .map(Arc::clone)
    }

    fn build(&self, id: &str) -> Result<Template, SkillError> {
        if let Some(template) = builtin::load(id) {
            return template;
        }
        if is_plain_id(id) {
            for dir in &self.dirs {
                let candidate = dir.join(id);
                if candidate.is_dir() {
                    return load_dir(id, &candidate);
                }
            }
        }
        Err(SkillError::TemplateNotFound {
            id: id.to_string(),
            available: self.ids(),
        })
    }
}

fn is_plain_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains(['/', '\\'])
        && id != ".."
}

fn template_dirs_in(dir: &Path) -> Vec<(String, PathBuf)> {
    let Ok(entries) = fs::read_dir(dir) else {
        debug!("template dir {} not readable, skipping", dir.display());
        return Vec::new();
    };
    let mut found: Vec<(String, PathBuf)> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter_map(|p| {
            let name = p.file_name()?.to_str()?.to_string();
            is_plain_id(&name).then_some((name, p))
        })
        .collect();
    found.sort();
    found
}

fn collect_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(true)
        .build()
        .flatten()
        .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Materialized path for a template file: `SKILL.md.template` becomes `SKILL.md`.
fn blueprint_path(relative: &Path) -> PathBuf {
    match relative.to_str().and_then(|s| s.strip_suffix(TEMPLATE_SUFFIX)) {
        Some(stripped) if !stripped.is_empty() => PathBuf::from(stripped),
        _ => relative.to_path_buf(),
    }
}

fn load_dir(id: &str, dir: &Path) -> Result<Template, SkillError> {
    let mut files = Vec::new();
    for path in collect_files(dir) {
        let relative = path.strip_prefix(dir).unwrap_or(path.as_path());
        let content = fs::read_to_string(&path).map_err(|e| SkillError::io(&path, e))?;
        files.push(FileBlueprint::new(blueprint_path(relative), content)?);
    }

    if !files.iter().any(|f| f.path == Path::new(MANIFEST)) {
        return Err(SkillError::ManifestNotFound(dir.to_path_buf()));
    }
    // Manifest first, the rest in path order.
    files.sort_by(|a, b| {
        (a.path != Path::new(MANIFEST), &a.path).cmp(&(b.path != Path::new(MANIFEST), &b.path))
    });

    Ok(Template {
        id: id.to_string(),
        source: TemplateSource::Directory(dir.to_path_buf()),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn user_template(root: &Path, id: &str) {
        let dir = root.join(id);
        fs::create_dir_all(dir.join("scripts")).unwrap();
        fs::write(
            dir.join("SKILL.md.template"),
            "---\nname: \"[TODO(skill-name): name]\"\n---\n<!-- BEGIN CORE: body -->\nx\n<!-- END: body -->\n",
        )
        .unwrap();
        fs::write(dir.join("scripts/run.sh"), "#!/bin/sh\necho hi\n").unwrap();
    }

    #[test]
    fn test_load_builtin_is_cached() {
        let store = TemplateStore::builtin_only();
        let a = store.load("skill-skeleton").unwrap();
        let b = store.load("skill-skeleton").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.constructed(), 1);
    }

    #[test]
    fn test_load_unknown_template() {
        let store = TemplateStore::builtin_only();
        let err = store.load("does-not-exist").unwrap_err();
        match err {
            SkillError::TemplateNotFound { id, available } => {
                assert_eq!(id, "does-not-exist");
                assert!(available.contains(&"skill-skeleton".to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_path_like_ids_are_not_resolved() {
        let dir = TempDir::new().unwrap();
        user_template(dir.path(), "mine");
        let store = TemplateStore::new([dir.path()]);
        assert!(store.load("../mine").is_err());
        assert!(store.load("mine/scripts").is_err());
    }

    #[test]
    fn test_user_template_dir() {
        let dir = TempDir::new().unwrap();
        user_template(dir.path(), "team-skill");
        let store = TemplateStore::new([dir.path()]);

        let template = store.load("team-skill").unwrap();
        assert_eq!(template.files[0].path, PathBuf::from("SKILL.md"));
        let script = template.file(Path::new("scripts/run.sh")).unwrap();
        assert!(script.executable);
        assert_eq!(template.files[0].core_sections().count(), 2);
    }

    #[test]
    fn test_list_orders_builtins_then_user() {
        let dir = TempDir::new().unwrap();
        user_template(dir.path(), "zeta");
        user_template(dir.path(), "alpha");
        user_template(dir.path(), "skill-skeleton");
        let store = TemplateStore::new([dir.path()]);

        let ids = store.ids();
        assert_eq!(ids, vec!["skill-skeleton", "minimal-skeleton", "alpha", "zeta"]);
        let alpha = &store.list()[2];
        assert_eq!(alpha.files, 2);
        assert_eq!(alpha.source, TemplateSource::Directory(dir.path().join("alpha")));
    }

    #[test]
    fn test_user_template_without_manifest() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("empty/README.md"), "# readme\n").unwrap();
        let store = TemplateStore::new([dir.path()]);
        assert!(matches!(
            store.load("empty"),
            Err(SkillError::ManifestNotFound(_))
        ));
    }

    #[test]
    fn test_concurrent_loads_build_once() {
        let store = Arc::new(TemplateStore::builtin_only());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.load("minimal-skeleton").unwrap())
            })
            .collect();
        let loaded: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(loaded.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(store.constructed(), 1);
    }
}
