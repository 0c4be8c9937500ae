//! Instantiate a template into a new skill package directory.
//!
//! Every file is rendered in memory first, so a bad template or a missing
//! binding is known before anything touches the disk. Only then is the
//! directory created and written.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::SkillError;
use crate::placeholder::{self, Bindings};
use crate::template::{Template, TemplateStore};
use crate::util::{title_case, validate_skill_name};

/// Placeholder names filled by `--auto-fill`.
pub const SKILL_NAME: &str = "skill-name";
pub const DISPLAY_NAME: &str = "display-name";
pub const STATUS: &str = "status";
pub const LAST_UPDATED: &str = "last-updated";
pub const QUICK_START_MINUTES: &str = "quick-start-minutes";
pub const TEMPLATE_ID: &str = "template-id";

#[derive(Debug, Clone, PartialEq)]
pub struct InitOptions {
    pub name: String,
    /// Directory the skill directory is created in.
    pub parent: PathBuf,
    pub template: String,
    pub auto_fill: bool,
    pub display_name: Option<String>,
    pub status: String,
    pub quick_start_minutes: u32,
    pub create_research_log: bool,
    /// Relative paths are taken from `parent`.
    pub research_log_dir: PathBuf,
    pub rollback_on_failure: bool,
    /// Literal bindings from `[autofill.extra]`.
    pub extra: BTreeMap<String, String>,
}

impl InitOptions {
    /// Options with every default taken from configuration.
    pub fn from_config(name: impl Into<String>, config: &Config) -> Self {
        Self {
            name: name.into(),
            parent: config.init.registry_path.clone(),
            template: config.init.default_template.clone(),
            auto_fill: false,
            display_name: None,
            status: config.init.status.clone(),
            quick_start_minutes: config.init.quick_start_minutes,
            create_research_log: false,
            research_log_dir: config.init.research_log_dir.clone(),
            rollback_on_failure: config.init.rollback_on_failure,
            extra: config.autofill.extra.clone(),
        }
    }

    pub fn skill_dir(&self) -> PathBuf {
        self.parent.join(&self.name)
    }

    pub fn display_name(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => title_case(&self.name),
        }
    }

    pub fn research_log_path(&self) -> PathBuf {
        self.parent
            .join(&self.research_log_dir)
            .join(format!("{}.md", self.name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitOutcome {
    pub skill_dir: PathBuf,
    pub template_id: String,
    /// Package-relative paths, in write order.
    pub files_written: Vec<PathBuf>,
    /// Placeholder names left for the author.
    pub unresolved: BTreeSet<String>,
    /// Placeholder tokens left across all files.
    pub remaining_todos: usize,
    pub research_log: Option<PathBuf>,
}

/// Deterministic bindings for `--auto-fill`. Nothing is guessed beyond this list.
pub fn auto_fill_bindings(options: &InitOptions, template_id: &str, today: NaiveDate) -> Bindings {
    let mut bindings: Bindings = options.extra.clone();
    let enumerated = [
        (SKILL_NAME, options.name.clone()),
        (DISPLAY_NAME, options.display_name()),
        (STATUS, options.status.clone()),
        (LAST_UPDATED, today.format("%Y-%m-%d").to_string()),
        (QUICK_START_MINUTES, options.quick_start_minutes.to_string()),
        (TEMPLATE_ID, template_id.to_string()),
    ];
    for (name, value) in enumerated {
        if let Some(shadowed) = bindings.insert(name.to_string(), value) {
            debug!("auto-fill value for '{}' replaces configured '{}'", name, shadowed);
        }
    }
    bindings
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub content: String,
    pub executable: bool,
}

/// Resolve placeholders in every template file. Returns the files plus every unbound name.
pub fn render(template: &Template, bindings: &Bindings) -> (Vec<RenderedFile>, BTreeSet<String>) {
    let mut unresolved = BTreeSet::new();
    let files = template
        .files
        .iter()
        .map(|blueprint| {
            let resolution = placeholder::resolve(&blueprint.content, bindings);
            unresolved.extend(resolution.unresolved);
            RenderedFile {
                path: blueprint.path.clone(),
                content: resolution.content,
                executable: blueprint.executable,
            }
        })
        .collect();
    (files, unresolved)
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn write_file(dir: &Path, file: &RenderedFile) -> io::Result<()> {
    let target = dir.join(&file.path);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, &file.content)?;
    if file.executable {
        mark_executable(&target)?;
    }
    Ok(())
}

/// Create `dir` and write `files` into it.
///
/// On failure the directory is removed when `rollback` is set; either way the
/// error names it and says how many files made it to disk.
pub fn write_package(
    dir: &Path,
    files: &[RenderedFile],
    rollback: bool,
) -> Result<Vec<PathBuf>, SkillError> {
    if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SkillError::io(parent, e))?;
    }
    fs::create_dir(dir).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => SkillError::DestinationExists(dir.to_path_buf()),
        _ => SkillError::io(dir, e),
    })?;

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        if let Err(source) = write_file(dir, file) {
            warn!("failed writing {}: {}", dir.join(&file.path).display(), source);
            let rolled_back = rollback && fs::remove_dir_all(dir).is_ok();
            if rollback && !rolled_back {
                warn!("could not remove partial package {}", dir.display());
            }
            return Err(SkillError::PartialWrite {
                dir: dir.to_path_buf(),
                written: written.len(),
                rolled_back,
                source,
            });
        }
        debug!("wrote {}", file.path.display());
        written.push(file.path.clone());
    }
    Ok(written)
}

fn research_log_content(name: &str, display_name: &str, today: NaiveDate) -> String {
    format!(
        "# {display} Research Log\n\
         \n\
         - Created: {today}\n\
         - Skill slug: {name}\n\
         \n\
         ## Summary\n\
         \n\
         Capture the user problem this skill solves and the value proposition.\n\
         \n\
         ## Key Sources\n\
         \n\
         - Link to official docs, blog posts, and working examples.\n\
         \n\
         ## Experiments\n\
         \n\
         Document any test projects, command transcripts, or reproduction steps.\n\
         \n\
         ## Follow-Ups\n\
         \n\
         - Confirm latest package versions\n\
         - Note open questions or risks to resolve before shipping\n",
        display = display_name,
        today = today.format("%Y-%m-%d"),
        name = name,
    )
}

/// Write the research log unless one already exists. Returns its path either way.
pub fn create_research_log(options: &InitOptions, today: NaiveDate) -> Result<PathBuf, SkillError> {
    let path = options.research_log_path();
    if path.exists() {
        warn!("research log already exists, keeping it: {}", path.display());
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SkillError::io(parent, e))?;
    }
    let content = research_log_content(&options.name, &options.display_name(), today);
    fs::write(&path, content).map_err(|e| SkillError::io(&path, e))?;
    info!("created research log {}", path.display());
    Ok(path)
}

/// Instantiate `options.template` as `<parent>/<name>`, dated today.
pub fn init(options: &InitOptions, store: &TemplateStore) -> Result<InitOutcome, SkillError> {
    init_on(options, store, Local::now().date_naive())
}

/// [`init`] with an explicit date for `last-updated` and the research log.
pub fn init_on(
    options: &InitOptions,
    store: &TemplateStore,
    today: NaiveDate,
) -> Result<InitOutcome, SkillError> {
    validate_skill_name(&options.name).map_err(|reason| SkillError::InvalidName {
        name: options.name.clone(),
        reason,
    })?;

    let skill_dir = options.skill_dir();
    if skill_dir.exists() {
        return Err(SkillError::DestinationExists(skill_dir));
    }

    let template = store.load(&options.template)?;
    let bindings = if options.auto_fill {
        auto_fill_bindings(options, &template.id, today)
    } else {
        Bindings::new()
    };

    let (files, unresolved) = render(&template, &bindings);
    let remaining_todos = files
        .iter()
        .map(|f| placeholder::scan(&f.content).len())
        .sum();

    let files_written = write_package(&skill_dir, &files, options.rollback_on_failure)?;
    info!(
        "initialized {} from template '{}' ({} file(s))",
        skill_dir.display(),
        template.id,
        files_written.len()
    );
    if remaining_todos > 0 {
        info!("{} placeholder(s) left to fill", remaining_todos);
    }

    let research_log = if options.create_research_log {
        Some(create_research_log(options, today)?)
    } else {
        None
    };

    Ok(InitOutcome {
        skill_dir,
        template_id: template.id.clone(),
        files_written,
        unresolved,
        remaining_todos,
        research_log,
    })
}
