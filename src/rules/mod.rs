//! Validation rules and the engine that runs them.
//!
//! Each rule is an independent check over an immutable [`SkillPackage`]
//! snapshot. The engine runs every rule of a [`Ruleset`] concurrently and merges
//! the results in registration order, so one failing rule never hides another.

pub mod core_completeness;
pub mod empty_resources;
pub mod metadata_schema;
pub mod optional_sections;
pub mod placeholders;
pub mod references;
pub mod resources;
pub mod size_budget;
pub mod writing_style;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::ValidationConfig;
use crate::package::SkillPackage;

pub use core_completeness::CoreCompletenessRule;
pub use empty_resources::EmptyResourceDirRule;
pub use metadata_schema::MetadataSchemaRule;
pub use optional_sections::OptionalSectionAuditRule;
pub use placeholders::UnresolvedPlaceholderRule;
pub use references::ReferenceIntegrityRule;
pub use resources::ResourceDeclarationRule;
pub use size_budget::SizeBudgetRule;
pub use writing_style::WritingStyleRule;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error, // Must fix
    Warning, // Should fix
    Info,    // Audit only
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(()),
        }
    }
}

/// Where a finding points. Ordered so findings within a rule sort by position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Location {
    Package,
    File { path: PathBuf, line: Option<usize> },
    Section { file: PathBuf, name: String },
}

impl Location {
    pub fn file(path: impl Into<PathBuf>, line: usize) -> Self {
        Location::File {
            path: path.into(),
            line: Some(line),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Package => write!(f, "<package>"),
            Location::File { path, line: Some(line) } => write!(f, "{}:{}", path.display(), line),
            Location::File { path, line: None } => write!(f, "{}", path.display()),
            Location::Section { file, name } => write!(f, "{}#{}", file.display(), name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub rule_id: String,
    pub severity: Severity,
    pub location: Location,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationResult {
    pub fn new(
        rule_id: &str,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            location,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// A single check over a package snapshot.
pub trait ValidationRule: Send + Sync {
    fn id(&self) -> &'static str;

    /// Declared severity; decides whether the rule runs outside `--full-check`.
    fn severity(&self) -> Severity;

    fn check(&self, package: &SkillPackage) -> Vec<ValidationResult>;
}

/// Ordered collection of rules, assembled once at startup.
#[derive(Clone, Default)]
pub struct Ruleset {
    rules: Vec<Arc<dyn ValidationRule>>,
}

impl Ruleset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: impl ValidationRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Every rule, in reporting order.
    pub fn standard(config: &ValidationConfig) -> Self {
        Self::new()
            .with_rule(CoreCompletenessRule)
            .with_rule(UnresolvedPlaceholderRule)
            .with_rule(MetadataSchemaRule::new(config.clone()))
            .with_rule(ReferenceIntegrityRule)
            .with_rule(ResourceDeclarationRule)
            .with_rule(SizeBudgetRule::new(config.max_body_lines, config.max_body_chars))
            .with_rule(EmptyResourceDirRule)
            .with_rule(OptionalSectionAuditRule)
            .with_rule(WritingStyleRule)
    }

    /// Only the rules that can fail a package.
    pub fn errors_only(config: &ValidationConfig) -> Self {
        Self::standard(config).filter(|rule| rule.severity() == Severity::Error)
    }

    pub fn for_mode(config: &ValidationConfig, full_check: bool) -> Self {
        if full_check {
            Self::standard(config)
        } else {
            Self::errors_only(config)
        }
    }

    pub fn filter(self, keep: impl Fn(&dyn ValidationRule) -> bool) -> Self {
        Self {
            rules: self
                .rules
                .into_iter()
                .filter(|rule| keep(rule.as_ref()))
                .collect(),
        }
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Runs a ruleset over package snapshots.
pub struct RuleEngine {
    ruleset: Ruleset,
}

impl RuleEngine {
    pub fn new(ruleset: Ruleset) -> Self {
        Self { ruleset }
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    /// Run every rule concurrently; results come back in registration order,
    /// then by location within a rule.
    pub async fn run(&self, package: Arc<SkillPackage>) -> Vec<ValidationResult> {
        let mut tasks = JoinSet::new();
        for (index, rule) in self.ruleset.rules.iter().enumerate() {
            let rule = Arc::clone(rule);
            let package = Arc::clone(&package);
            tasks.spawn_blocking(move || (index, rule.check(&package)));
        }

        let mut slots: Vec<Option<Vec<ValidationResult>>> = vec![None; self.ruleset.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, mut results)) => {
                    results.sort_by(|a, b| a.location.cmp(&b.location));
                    slots[index] = Some(results);
                }
                Err(e) => warn!("validation rule task failed: {}", e),
            }
        }

        let mut merged = Vec::new();
        for (index, slot) in slots.into_iter().enumerate() {
            let rule = &self.ruleset.rules[index];
            match slot {
                Some(results) => {
                    debug!("rule {} produced {} finding(s)", rule.id(), results.len());
                    merged.extend(results);
                }
                None => merged.push(
                    ValidationResult::new(
                        rule.id(),
                        Severity::Error,
                        Location::Package,
                        format!("rule '{}' crashed and produced no result", rule.id()),
                    )
                    .with_suggestion("This is a bug in the validator; please report it"),
                ),
            }
        }
        merged
    }
}
