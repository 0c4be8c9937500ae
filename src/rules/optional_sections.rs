use crate::package::SkillPackage;
use crate::rules::{Location, Severity, ValidationResult, ValidationRule};
use crate::section::SectionKind;

pub const RULE_ID: &str = "optional-section-audit";

/// Lists OPTIONAL sections still present so the author can decide whether to drop them.
/// Never removes anything.
pub struct OptionalSectionAuditRule;

impl ValidationRule for OptionalSectionAuditRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn check(&self, package: &SkillPackage) -> Vec<ValidationResult> {
        let mut findings = Vec::new();
        for file in &package.files {
            for section in &file.sections {
                let SectionKind::Optional { condition } = &section.kind else {
                    continue;
                };
                let message = match condition {
                    Some(condition) => format!(
                        "Optional section '{}' is still present (delete if {})",
                        section.name, condition
                    ),
                    None => format!(
                        "Optional section '{}' is still present (no deletion condition)",
                        section.name
                    ),
                };
                findings.push(ValidationResult::new(
                    RULE_ID,
                    Severity::Info,
                    Location::Section {
                        file: file.path.clone(),
                        name: section.name.clone(),
                    },
                    message,
                ));
            }
        }
        findings
    }
}
