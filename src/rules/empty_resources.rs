use crate::package::SkillPackage;
use crate::rules::{Location, Severity, ValidationResult, ValidationRule};

pub const RULE_ID: &str = "empty-resource-dir";

/// Resource directories left behind with nothing in them.
pub struct EmptyResourceDirRule;

impl ValidationRule for EmptyResourceDirRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, package: &SkillPackage) -> Vec<ValidationResult> {
        package
            .resource_dirs
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(dir, _)| {
                ValidationResult::new(
                    RULE_ID,
                    Severity::Warning,
                    Location::File {
                        path: dir.into(),
                        line: None,
                    },
                    format!("Resource directory {}/ is empty", dir),
                )
                .with_suggestion(format!("Add files to {}/ or delete it", dir))
            })
            .collect()
    }
}
