//! Shared utilities for the skillforge codebase

use std::path::{Component, Path, PathBuf};

/// Longest skill name accepted by the initializer.
pub const MAX_SKILL_NAME_LEN: usize = 64;

/// Validate a skill name is a filesystem-safe hyphen-case identifier.
/// Valid: lowercase ASCII letters, digits, and single hyphens between words
/// (`pdf-form-filling`, `react-hook-form-zod`).
/// Leading/trailing hyphens and `--` are rejected so the name doubles as a
/// directory name and a `name:` value without quoting.
pub fn validate_skill_name(name: &str) -> Result<&str, String> {
    if name.is_empty() {
        return Err("Empty skill name".to_string());
    }
    if name.len() > MAX_SKILL_NAME_LEN {
        return Err(format!(
            "Skill name exceeds {} characters ({})",
            MAX_SKILL_NAME_LEN,
            name.len()
        ));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(format!("Skill name cannot start or end with '-': {}", name));
    }
    if name.contains("--") {
        return Err(format!("Skill name cannot contain '--': {}", name));
    }
    for ch in name.chars() {
        match ch {
            'a'..='z' | '0'..='9' | '-' => {}
            _ => {
                return Err(format!(
                    "Invalid character '{}' in skill name: {} (use lowercase letters, digits, hyphens)",
                    ch, name
                ));
            }
        }
    }
    Ok(name)
}

/// `pdf-form-filling` -> `Pdf Form Filling`
pub fn title_case(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Lexically normalize a package-relative path.
/// Returns `None` when the path is absolute or climbs out of the package root.
pub fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}
