use crate::package::SkillPackage;
use crate::placeholder;
use crate::rules::{Location, Severity, ValidationResult, ValidationRule};

pub const RULE_ID: &str = "unresolved-placeholder";

/// No `[TODO...]` token may survive in any text file of the package.
pub struct UnresolvedPlaceholderRule;

impl ValidationRule for UnresolvedPlaceholderRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, package: &SkillPackage) -> Vec<ValidationResult> {
        let mut findings = Vec::new();
        for (path, text) in package.text_files() {
            for token in placeholder::scan(text) {
                let message = if token.name == token.hint {
                    format!("Unresolved placeholder: {}", token.hint)
                } else {
                    format!("Unresolved placeholder '{}': {}", token.name, token.hint)
                };
                findings.push(
                    ValidationResult::new(
                        RULE_ID,
                        Severity::Error,
                        Location::file(path, token.line),
                        message,
                    )
                    .with_suggestion(format!("Replace `{}` with real content", token.token)),
                );
            }
        }
        findings
    }
}
