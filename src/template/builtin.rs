//! Templates compiled into the binary.

use crate::error::SkillError;
use crate::template::{FileBlueprint, Template, TemplateSource};

pub const SKILL_SKELETON: &str = "skill-skeleton";
pub const MINIMAL_SKELETON: &str = "minimal-skeleton";

/// Built-in ids in listing order.
pub const BUILTIN_IDS: [&str; 2] = [SKILL_SKELETON, MINIMAL_SKELETON];

const SKILL_SKELETON_FILES: &[(&str, &str)] = &[
    (
        "SKILL.md",
        include_str!("../../templates/skill-skeleton/SKILL.md.template"),
    ),
    (
        "README.md",
        include_str!("../../templates/skill-skeleton/README.md"),
    ),
    (
        "scripts/example.py",
        include_str!("../../templates/skill-skeleton/scripts/example.py"),
    ),
    (
        "references/api_reference.md",
        include_str!("../../templates/skill-skeleton/references/api_reference.md"),
    ),
    (
        "assets/example_asset.txt",
        include_str!("../../templates/skill-skeleton/assets/example_asset.txt"),
    ),
];

const MINIMAL_SKELETON_FILES: &[(&str, &str)] = &[
    (
        "SKILL.md",
        include_str!("../../templates/minimal-skeleton/SKILL.md.template"),
    ),
    (
        "README.md",
        include_str!("../../templates/minimal-skeleton/README.md"),
    ),
];

pub fn is_builtin(id: &str) -> bool {
    BUILTIN_IDS.contains(&id)
}

pub fn file_count(id: &str) -> Option<usize> {
    files_for(id).map(|files| files.len())
}

fn files_for(id: &str) -> Option<&'static [(&'static str, &'static str)]> {
    match id {
        SKILL_SKELETON => Some(SKILL_SKELETON_FILES),
        MINIMAL_SKELETON => Some(MINIMAL_SKELETON_FILES),
        _ => None,
    }
}

/// Build a built-in template, or `None` if `id` is not built in.
pub fn load(id: &str) -> Option<Result<Template, SkillError>> {
    let files = files_for(id)?;
    let blueprints = files
        .iter()
        .map(|(path, content)| FileBlueprint::new(*path, *content))
        .collect::<Result<Vec<_>, _>>();
    Some(blueprints.map(|files| Template {
        id: id.to_string(),
        source: TemplateSource::Builtin,
        files,
    }))
}
