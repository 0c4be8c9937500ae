//! Section markers embedded in template and package files.
//!
//! Markers are HTML comments so they stay invisible when the manifest is
//! rendered:
//!
//! ```text
//! <!-- BEGIN CORE: overview -->
//! ...
//! <!-- END: overview -->
//!
//! <!-- BEGIN OPTIONAL: advanced-usage | delete if the skill has one workflow -->
//! ...
//! <!-- END: advanced-usage -->
//! ```
//!
//! Everything outside a block belongs to the implicit top-level section, which
//! is always CORE (title and frontmatter live there). Parsing is purely
//! structural; deletion conditions are carried verbatim for the author and never
//! evaluated.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SkillError;

/// Name given to the implicit section holding unmarked content.
pub const TOP_LEVEL: &str = "top-level";

static BEGIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*<!--\s*BEGIN\s+([A-Za-z]+)\s*:\s*(.*?)\s*-->\s*$").expect("valid regex")
});
static END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*<!--\s*END\s*:\s*(.*?)\s*-->\s*$").expect("valid regex"));
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 _.-]*$").expect("valid regex"));
// Loose prefixes: anything that looks like a marker must parse as one.
static BEGIN_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<!--\s*BEGIN\b").expect("valid regex"));
static END_HINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<!--\s*END\b").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKind {
    /// Required in every instance of the template.
    Core,
    /// May be deleted by the author when `condition` holds.
    Optional { condition: Option<String> },
    /// Unmarked top-level content. Always required.
    Implicit,
}

impl SectionKind {
    pub fn is_core(&self) -> bool {
        matches!(self, SectionKind::Core | SectionKind::Implicit)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SectionKind::Core | SectionKind::Implicit => "CORE",
            SectionKind::Optional { .. } => "OPTIONAL",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub kind: SectionKind,
    pub file: PathBuf,
    /// 1-based line of the opening marker (first content line for the implicit section).
    pub start_line: usize,
    /// 1-based line of the closing marker (last content line for the implicit section).
    pub end_line: usize,
    pub content: String,
}

impl Section {
    pub fn is_implicit(&self) -> bool {
        self.kind == SectionKind::Implicit
    }
}

struct OpenBlock {
    name: String,
    kind: SectionKind,
    line: usize,
    marker: String,
    lines: Vec<String>,
}

fn malformed(file: &Path, line: usize, marker: &str, reason: impl Into<String>) -> SkillError {
    SkillError::MalformedSectionMarker {
        file: file.to_path_buf(),
        line,
        marker: marker.trim().to_string(),
        reason: reason.into(),
    }
}

fn parse_begin(file: &Path, line_no: usize, line: &str) -> Result<(String, SectionKind), SkillError> {
    let caps = BEGIN_RE
        .captures(line)
        .ok_or_else(|| malformed(file, line_no, line, "expected `<!-- BEGIN <KIND>: <name> -->`"))?;
    let kind_word = caps[1].to_ascii_uppercase();
    let spec = caps[2].trim();

    let (name, condition) = match spec.split_once('|') {
        Some((name, rest)) => {
            let rest = rest.trim();
            let lowered = rest.to_ascii_lowercase();
            let condition = if let Some(stripped) = lowered.strip_prefix("delete if") {
                // Keep the author's casing; only the prefix is matched case-insensitively.
                let offset = rest.len() - stripped.len();
                rest[offset..].trim_start_matches(':').trim().to_string()
            } else {
                rest.to_string()
            };
            (name.trim(), Some(condition).filter(|c| !c.is_empty()))
        }
        None => (spec, None),
    };

    if name.is_empty() {
        return Err(malformed(file, line_no, line, "section name is empty"));
    }
    if !NAME_RE.is_match(name) {
        return Err(malformed(
            file,
            line_no,
            line,
            format!("invalid section name '{}'", name),
        ));
    }

    let kind = match kind_word.as_str() {
        "CORE" => {
            if condition.is_some() {
                return Err(malformed(
                    file,
                    line_no,
                    line,
                    "CORE sections cannot carry a deletion condition",
                ));
            }
            SectionKind::Core
        }
        "OPTIONAL" => SectionKind::Optional { condition },
        other => {
            return Err(malformed(
                file,
                line_no,
                line,
                format!("unknown section kind '{}' (expected CORE or OPTIONAL)", other),
            ))
        }
    };

    Ok((name.to_string(), kind))
}

/// Parse the section structure of one file.
///
/// Markers inside fenced code blocks are treated as plain content, so documents
/// can show the marker syntax without declaring sections.
pub fn parse(file: impl AsRef<Path>, content: &str) -> Result<Vec<Section>, SkillError> {
    let file = file.as_ref();
    let mut sections = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut open: Option<OpenBlock> = None;
    let mut in_fence = false;

    let mut top_lines: Vec<String> = Vec::new();
    let mut top_first = 0usize;
    let mut top_last = 0usize;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim_start();

        if trimmed.starts_with("```") {
            in_fence = !in_fence;
        }

        let is_begin = !in_fence && trimmed.starts_with("<!--") && BEGIN_HINT.is_match(trimmed);
        let is_end = !in_fence && trimmed.starts_with("<!--") && END_HINT.is_match(trimmed);

        if is_begin {
            if let Some(block) = &open {
                return Err(malformed(
                    file,
                    block.line,
                    &block.marker,
                    format!(
                        "section '{}' is not closed before the next BEGIN marker on line {}",
                        block.name, line_no
                    ),
                ));
            }
            let (name, kind) = parse_begin(file, line_no, line)?;
            if !seen.insert(name.clone()) {
                return Err(malformed(
                    file,
                    line_no,
                    line,
                    format!("duplicate section name '{}'", name),
                ));
            }
            open = Some(OpenBlock {
                name,
                kind,
                line: line_no,
                marker: line.to_string(),
                lines: Vec::new(),
            });
            continue;
        }

        if is_end {
            let caps = END_RE
                .captures(line)
                .ok_or_else(|| malformed(file, line_no, line, "expected `<!-- END: <name> -->`"))?;
            let end_name = caps[1].trim();
            let block = open
                .take()
                .ok_or_else(|| malformed(file, line_no, line, "END marker without a matching BEGIN"))?;
            if block.name != end_name {
                return Err(malformed(
                    file,
                    block.line,
                    &block.marker,
                    format!(
                        "section '{}' is closed by END '{}' on line {}",
                        block.name, end_name, line_no
                    ),
                ));
            }
            sections.push(Section {
                name: block.name,
                kind: block.kind,
                file: file.to_path_buf(),
                start_line: block.line,
                end_line: line_no,
                content: block.lines.join("\n"),
            });
            continue;
        }

        match open.as_mut() {
            Some(block) => block.lines.push(line.to_string()),
            None => {
                if !line.trim().is_empty() {
                    if top_first == 0 {
                        top_first = line_no;
                    }
                    top_last = line_no;
                }
                top_lines.push(line.to_string());
            }
        }
    }

    if let Some(block) = open {
        return Err(malformed(
            file,
            block.line,
            &block.marker,
            format!("section '{}' is never closed", block.name),
        ));
    }

    if top_first > 0 {
        let implicit = Section {
            name: TOP_LEVEL.to_string(),
            kind: SectionKind::Implicit,
            file: file.to_path_buf(),
            start_line: top_first,
            end_line: top_last,
            content: top_lines.join("\n").trim().to_string(),
        };
        sections.insert(0, implicit);
    }

    Ok(sections)
}

/// Find a section by name.
pub fn find<'a>(sections: &'a [Section], name: &str) -> Option<&'a Section> {
    sections.iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"---
name: demo
---

# Demo

<!-- BEGIN CORE: overview -->
## Overview
Does things.
<!-- END: overview -->

<!-- BEGIN OPTIONAL: advanced | delete if the skill has a single workflow -->
## Advanced
<!-- END: advanced -->
"#;

    #[test]
    fn test_parse_core_optional_and_implicit() {
        let sections = parse("SKILL.md", DOC).unwrap();
        assert_eq!(sections.len(), 3);

        assert_eq!(sections[0].name, TOP_LEVEL);
        assert_eq!(sections[0].kind, SectionKind::Implicit);
        assert!(sections[0].content.contains("# Demo"));
        assert!(sections[0].content.starts_with("---"));
        assert_eq!(sections[0].start_line, 1);

        assert_eq!(sections[1].name, "overview");
        assert_eq!(sections[1].kind, SectionKind::Core);
        assert_eq!(sections[1].start_line, 7);
        assert_eq!(sections[1].end_line, 10);
        assert_eq!(sections[1].content, "## Overview\nDoes things.");

        assert_eq!(
            sections[2].kind,
            SectionKind::Optional {
                condition: Some("the skill has a single workflow".to_string())
            }
        );
    }

    #[test]
    fn test_optional_without_condition() {
        let doc = "<!-- BEGIN OPTIONAL: extras -->\nx\n<!-- END: extras -->\n";
        let sections = parse("f.md", doc).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, SectionKind::Optional { condition: None });
    }

    #[test]
    fn test_condition_keeps_author_casing() {
        let doc = "<!-- BEGIN OPTIONAL: x | Delete if: No Scripts Exist -->\n<!-- END: x -->\n";
        let sections = parse("f.md", doc).unwrap();
        assert_eq!(
            sections[0].kind,
            SectionKind::Optional {
                condition: Some("No Scripts Exist".to_string())
            }
        );
    }

    #[test]
    fn test_unterminated_marker_reports_opening_line() {
        let doc = "intro\n\n<!-- BEGIN CORE: usage -->\nbody\n";
        let err = parse("SKILL.md", doc).unwrap_err();
        match err {
            SkillError::MalformedSectionMarker { file, line, marker, .. } => {
                assert_eq!(file, PathBuf::from("SKILL.md"));
                assert_eq!(line, 3);
                assert_eq!(marker, "<!-- BEGIN CORE: usage -->");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_end_without_begin() {
        let err = parse("f.md", "text\n<!-- END: usage -->\n").unwrap_err();
        assert!(err.to_string().contains("without a matching BEGIN"));
    }

    #[test]
    fn test_mismatched_end_name() {
        let doc = "<!-- BEGIN CORE: a -->\n<!-- END: b -->\n";
        let err = parse("f.md", doc).unwrap_err();
        assert!(err.to_string().contains("closed by END 'b'"));
    }

    #[test]
    fn test_nested_begin_is_malformed() {
        let doc = "<!-- BEGIN CORE: a -->\n<!-- BEGIN CORE: b -->\n<!-- END: b -->\n<!-- END: a -->\n";
        let err = parse("f.md", doc).unwrap_err();
        match err {
            SkillError::MalformedSectionMarker { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kind_and_bad_syntax() {
        assert!(parse("f.md", "<!-- BEGIN REQUIRED: a -->\n<!-- END: a -->\n").is_err());
        assert!(parse("f.md", "<!-- BEGIN CORE a -->\n<!-- END: a -->\n").is_err());
        assert!(parse("f.md", "<!-- BEGIN CORE: -->\n<!-- END: -->\n").is_err());
    }

    #[test]
    fn test_core_with_condition_rejected() {
        let doc = "<!-- BEGIN CORE: a | delete if never -->\n<!-- END: a -->\n";
        assert!(parse("f.md", doc).is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let doc = "<!-- BEGIN CORE: a -->\n<!-- END: a -->\n<!-- BEGIN CORE: a -->\n<!-- END: a -->\n";
        let err = parse("f.md", doc).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_markers_inside_code_fence_are_content() {
        let doc = "# Title\n```markdown\n<!-- BEGIN CORE: shown -->\n```\n";
        let sections = parse("f.md", doc).unwrap();
        assert_eq!(sections.len(), 1);
        assert!(sections[0].is_implicit());
        assert!(sections[0].content.contains("BEGIN CORE: shown"));
    }

    #[test]
    fn test_plain_comments_are_content() {
        let doc = "<!-- just a note -->\ntext\n";
        let sections = parse("f.md", doc).unwrap();
        assert_eq!(sections.len(), 1);
        assert!(sections[0].content.contains("just a note"));
    }

    #[test]
    fn test_blank_file_has_no_sections() {
        assert!(parse("f.md", "\n\n").unwrap().is_empty());
    }
}
