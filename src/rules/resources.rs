use crate::package::{SkillPackage, MANIFEST};
use crate::rules::{Location, Severity, ValidationResult, ValidationRule};

pub const RULE_ID: &str = "resource-declaration";

/// Directories whose presence must be explained in the manifest.
const DECLARED_DIRS: [&str; 3] = ["scripts", "references", "assets"];

struct Heading {
    level: usize,
    title: String,
    line: usize,
}

/// Markdown ATX headings outside code fences, as (level, title, body index).
fn headings(body: &str) -> Vec<Heading> {
    let mut found = Vec::new();
    let mut in_fence = false;
    for (idx, line) in body.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || !trimmed.starts_with('#') {
            continue;
        }
        let level = trimmed.chars().take_while(|c| *c == '#').count();
        let rest = &trimmed[level..];
        if level <= 6 && (rest.is_empty() || rest.starts_with(' ')) {
            found.push(Heading {
                level,
                title: rest.trim().to_string(),
                line: idx,
            });
        }
    }
    found
}

/// Text of the first "Resources" heading up to the next heading at the same or higher level.
fn resources_block(body: &str) -> Option<(usize, String)> {
    let all = headings(body);
    let (pos, start) = all
        .iter()
        .enumerate()
        .find(|(_, h)| h.title.to_lowercase().contains("resources"))?;
    let end = all[pos + 1..]
        .iter()
        .find(|h| h.level <= start.level)
        .map(|h| h.line)
        .unwrap_or(usize::MAX);
    let text = body
        .lines()
        .enumerate()
        .filter(|(i, _)| *i >= start.line && *i < end)
        .map(|(_, l)| l)
        .collect::<Vec<_>>()
        .join("\n");
    Some((start.line, text))
}

/// Bundled resource directories must be described under a Resources heading.
pub struct ResourceDeclarationRule;

impl ValidationRule for ResourceDeclarationRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, package: &SkillPackage) -> Vec<ValidationResult> {
        let present: Vec<&str> = DECLARED_DIRS
            .iter()
            .copied()
            .filter(|d| package.resource_dirs.contains_key(*d))
            .collect();
        if present.is_empty() {
            return Vec::new();
        }

        let record = &package.metadata;
        let Some((line, block)) = resources_block(&record.body) else {
            let listed = present
                .iter()
                .map(|d| format!("{}/", d))
                .collect::<Vec<_>>()
                .join(", ");
            return vec![ValidationResult::new(
                RULE_ID,
                Severity::Warning,
                Location::File {
                    path: MANIFEST.into(),
                    line: None,
                },
                format!(
                    "Package bundles {} but {} has no Resources section",
                    listed, MANIFEST
                ),
            )
            .with_suggestion("Add a '## Bundled Resources' section describing each directory")];
        };

        present
            .into_iter()
            .filter(|dir| !block.contains(dir))
            .map(|dir| {
                ValidationResult::new(
                    RULE_ID,
                    Severity::Warning,
                    Location::file(MANIFEST, record.body_start_line + line),
                    format!("Resources section does not mention {}/", dir),
                )
                .with_suggestion(format!(
                    "Describe what {}/ contains, or delete the directory",
                    dir
                ))
            })
            .collect()
    }
}
