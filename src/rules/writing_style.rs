use once_cell::sync::Lazy;
use regex::Regex;

use crate::package::{SkillPackage, MANIFEST};
use crate::rules::{Location, Severity, ValidationResult, ValidationRule};

pub const RULE_ID: &str = "writing-style";

static SECOND_PERSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\byou\s+(should|can|must|need|will|may)\b").expect("valid regex")
});

/// Manifest instructions should be imperative ("Run the script"), not "you should run".
pub struct WritingStyleRule;

impl ValidationRule for WritingStyleRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, package: &SkillPackage) -> Vec<ValidationResult> {
        let record = &package.metadata;
        let mut count = 0;
        let mut first_line = None;
        let mut in_fence = false;

        for (idx, line) in record.body.lines().enumerate() {
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }
            let hits = SECOND_PERSON_RE.find_iter(line).count();
            if hits > 0 {
                count += hits;
                first_line.get_or_insert(record.body_start_line + idx);
            }
        }

        match first_line {
            Some(line) => vec![ValidationResult::new(
                RULE_ID,
                Severity::Warning,
                Location::file(MANIFEST, line),
                format!(
                    "Found {} second-person instruction(s) such as 'you should'",
                    count
                ),
            )
            .with_suggestion("Use imperative form: 'Run the script' instead of 'You should run the script'")],
            None => Vec::new(),
        }
    }
}
