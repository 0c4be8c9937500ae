use crate::config::ValidationConfig;
use crate::metadata;
use crate::package::SkillPackage;
use crate::rules::{Severity, ValidationResult, ValidationRule};

/// Manifest header checks, see [`metadata::validate`].
pub struct MetadataSchemaRule {
    limits: ValidationConfig,
}

impl MetadataSchemaRule {
    pub fn new(limits: ValidationConfig) -> Self {
        Self { limits }
    }
}

impl ValidationRule for MetadataSchemaRule {
    fn id(&self) -> &'static str {
        metadata::RULE_ID
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, package: &SkillPackage) -> Vec<ValidationResult> {
        metadata::validate(&package.metadata, &package.dir_name, &self.limits)
    }
}
