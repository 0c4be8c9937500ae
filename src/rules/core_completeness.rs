//! Every CORE section declared by the originating template must survive.

use tracing::debug;

use crate::package::SkillPackage;
use crate::rules::{Location, Severity, ValidationResult, ValidationRule};
use crate::section;

pub const RULE_ID: &str = "core-completeness";

pub struct CoreCompletenessRule;

impl ValidationRule for CoreCompletenessRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, package: &SkillPackage) -> Vec<ValidationResult> {
        let Some(template) = &package.origin else {
            debug!("{}: no originating template recorded, skipping", RULE_ID);
            return Vec::new();
        };

        let mut findings = Vec::new();
        for blueprint in &template.files {
            let present = package.file(&blueprint.path).map(|f| f.sections.as_slice());
            for core in blueprint.core_sections() {
                let location = Location::Section {
                    file: blueprint.path.clone(),
                    name: core.name.clone(),
                };
                let found = present.and_then(|sections| section::find(sections, &core.name));
                match found {
                    Some(s) if s.kind.is_core() => {}
                    Some(_) => findings.push(
                        ValidationResult::new(
                            RULE_ID,
                            Severity::Error,
                            location,
                            format!(
                                "CORE section '{}' from template '{}' was downgraded to OPTIONAL",
                                core.name, template.id
                            ),
                        )
                        .with_suggestion(format!(
                            "Restore the marker to `<!-- BEGIN CORE: {} -->`",
                            core.name
                        )),
                    ),
                    None => {
                        let why = if present.is_none() {
                            format!(" ({} is missing)", blueprint.path.display())
                        } else {
                            String::new()
                        };
                        let suggestion = if core.is_implicit() {
                            format!("Restore the unmarked content of {}", blueprint.path.display())
                        } else {
                            format!(
                                "Restore the '{}' block between its BEGIN CORE and END markers",
                                core.name
                            )
                        };
                        findings.push(
                            ValidationResult::new(
                                RULE_ID,
                                Severity::Error,
                                location,
                                format!(
                                    "Missing CORE section '{}' required by template '{}'{}",
                                    core.name, template.id, why
                                ),
                            )
                            .with_suggestion(suggestion),
                        )
                    }
                }
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::package;
    use std::path::Path;

    const MANIFEST: &str = "---\nname: demo\ntemplate: minimal-skeleton\n---\n# Demo\n\n<!-- BEGIN CORE: overview -->\nx\n<!-- END: overview -->\n\n<!-- BEGIN CORE: instructions -->\ny\n<!-- END: instructions -->\n";
    const README: &str = "# Demo\n\nNotes for maintainers.\n";

    #[test]
    fn test_complete_package_passes() {
        let (_tmp, pkg) = package("demo", &[("SKILL.md", MANIFEST), ("README.md", README)]);
        assert!(CoreCompletenessRule.check(&pkg).is_empty());
    }

    #[test]
    fn test_removed_section_reported_by_name() {
        let trimmed = MANIFEST.replace(
            "<!-- BEGIN CORE: instructions -->\ny\n<!-- END: instructions -->\n",
            "",
        );
        let (_tmp, pkg) = package("demo", &[("SKILL.md", &trimmed), ("README.md", README)]);
        let findings = CoreCompletenessRule.check(&pkg);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("'instructions'"));
        assert_eq!(findings[0].location.to_string(), "SKILL.md#instructions");
    }

    #[test]
    fn test_downgraded_section_reported() {
        let downgraded = MANIFEST.replace("BEGIN CORE: overview", "BEGIN OPTIONAL: overview");
        let (_tmp, pkg) = package("demo", &[("SKILL.md", &downgraded), ("README.md", README)]);
        let findings = CoreCompletenessRule.check(&pkg);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("downgraded"));
    }

    #[test]
    fn test_deleted_template_file_reported_as_top_level() {
        let (_tmp, pkg) = package("demo", &[("SKILL.md", MANIFEST)]);
        let template = pkg.origin.clone().unwrap();
        assert!(template.file(Path::new("README.md")).is_some());
        assert!(!pkg.contains(Path::new("README.md")));

        let findings = CoreCompletenessRule.check(&pkg);
        assert_eq!(findings.len(), 1, "{:#?}", findings);
        assert_eq!(findings[0].location.to_string(), "README.md#top-level");
        assert!(findings[0].message.contains("README.md is missing"));
    }

    #[test]
    fn test_emptied_file_loses_top_level() {
        let (_tmp, pkg) = package(
            "demo",
            &[
                ("SKILL.md", MANIFEST),
                ("README.md", "<!-- BEGIN OPTIONAL: notes -->\n<!-- END: notes -->\n"),
            ],
        );
        let findings = CoreCompletenessRule.check(&pkg);
        assert_eq!(findings.len(), 1, "{:#?}", findings);
        assert_eq!(findings[0].location.to_string(), "README.md#top-level");
        assert!(findings[0].suggestion.as_deref().unwrap().contains("unmarked content"));
    }

    #[test]
    fn test_hand_authored_package_is_skipped() {
        let (_tmp, pkg) = package("demo", &[("SKILL.md", "---\nname: demo\n---\n# Demo\n")]);
        assert!(CoreCompletenessRule.check(&pkg).is_empty());
    }
}
