use crate::package::{SkillPackage, MANIFEST};
use crate::rules::{Location, Severity, ValidationResult, ValidationRule};

pub const RULE_ID: &str = "size-budget";

/// Keeps the manifest body small enough to load into context cheaply.
pub struct SizeBudgetRule {
    max_lines: usize,
    max_chars: usize,
}

impl SizeBudgetRule {
    pub fn new(max_lines: usize, max_chars: usize) -> Self {
        Self {
            max_lines,
            max_chars,
        }
    }
}

impl ValidationRule for SizeBudgetRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, package: &SkillPackage) -> Vec<ValidationResult> {
        let body = &package.metadata.body;
        let lines = body.lines().count();
        let chars = body.chars().count();
        let location = Location::File {
            path: MANIFEST.into(),
            line: None,
        };

        let mut findings = Vec::new();
        if lines > self.max_lines {
            findings.push(
                ValidationResult::new(
                    RULE_ID,
                    Severity::Warning,
                    location.clone(),
                    format!(
                        "{} body is {} lines (budget {})",
                        MANIFEST, lines, self.max_lines
                    ),
                )
                .with_suggestion("Move detailed material into references/ and link to it"),
            );
        }
        if chars > self.max_chars {
            findings.push(
                ValidationResult::new(
                    RULE_ID,
                    Severity::Warning,
                    location,
                    format!(
                        "{} body is {} characters (budget {})",
                        MANIFEST, chars, self.max_chars
                    ),
                )
                .with_suggestion("Move detailed material into references/ and link to it"),
            );
        }
        findings
    }
}
