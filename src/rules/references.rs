//! Relative links and resource paths in the manifest body must resolve inside the package.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::package::{SkillPackage, MANIFEST};
use crate::rules::{Location, Severity, ValidationResult, ValidationRule};
use crate::util::normalize_relative;

pub const RULE_ID: &str = "reference-integrity";

static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"!?\[[^\]]*\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#).expect("valid regex")
});
static CODE_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"`((?:scripts|references|assets|templates)/[^`\s]*)`").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
struct Reference {
    target: String,
    line: usize,
}

fn is_external(target: &str) -> bool {
    target.contains("://") || target.starts_with("mailto:") || target.starts_with('#')
}

/// Link and inline-code targets outside fenced code blocks, with manifest line numbers.
fn collect(body: &str, first_line: usize) -> Vec<Reference> {
    let mut refs = Vec::new();
    let mut in_fence = false;
    for (idx, line) in body.lines().enumerate() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        let line_no = first_line + idx;
        for caps in LINK_RE.captures_iter(line) {
            refs.push(Reference {
                target: caps[1].to_string(),
                line: line_no,
            });
        }
        for caps in CODE_PATH_RE.captures_iter(line) {
            refs.push(Reference {
                target: caps[1].to_string(),
                line: line_no,
            });
        }
    }
    refs
}

pub struct ReferenceIntegrityRule;

impl ValidationRule for ReferenceIntegrityRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, package: &SkillPackage) -> Vec<ValidationResult> {
        let record = &package.metadata;
        let mut findings = Vec::new();

        for reference in collect(&record.body, record.body_start_line) {
            if is_external(&reference.target) {
                continue;
            }
            let path = reference
                .target
                .split(['#', '?'])
                .next()
                .unwrap_or_default();
            if path.is_empty() {
                continue;
            }
            let location = Location::file(MANIFEST, reference.line);

            match normalize_relative(Path::new(path)) {
                None => findings.push(
                    ValidationResult::new(
                        RULE_ID,
                        Severity::Error,
                        location,
                        format!("Reference '{}' points outside the package", reference.target),
                    )
                    .with_suggestion("Bundle the file inside the package and link it relatively"),
                ),
                Some(normalized) if !package.contains(&normalized) => findings.push(
                    ValidationResult::new(
                        RULE_ID,
                        Severity::Error,
                        location,
                        format!("Broken reference: '{}' does not exist", path),
                    )
                    .with_suggestion(format!("Create {} or remove the reference", path)),
                ),
                Some(_) => {}
            }
        }
        findings
    }
}
