use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::ValueEnum;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::SkillError;
use crate::package::{SkillPackage, MANIFEST};
use crate::report::{self, JsonReport, EXIT_PASS, EXIT_TOOL_ERROR, EXIT_VALIDATION_FAILED};
use crate::rules::{RuleEngine, Ruleset, ValidationResult};
use crate::template::TemplateStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// What happened to one package of a batch.
#[derive(Debug)]
pub enum PackageOutcome {
    Checked {
        path: PathBuf,
        results: Vec<ValidationResult>,
    },
    /// The package could not be interpreted at all.
    Failed { path: PathBuf, error: SkillError },
}

impl PackageOutcome {
    pub fn path(&self) -> &Path {
        match self {
            PackageOutcome::Checked { path, .. } | PackageOutcome::Failed { path, .. } => path,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            PackageOutcome::Checked { results, .. } => report::verdict(results).exit_code(),
            PackageOutcome::Failed { .. } => EXIT_TOOL_ERROR,
        }
    }
}

/// Expand each argument to package directories.
///
/// A directory without a manifest stands for every `*/SKILL.md` child, sorted.
/// Arguments that match nothing are kept so the failure is reported against them.
pub fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut expanded = Vec::new();
    for path in paths {
        if path.join(MANIFEST).is_file() || !path.is_dir() {
            expanded.push(path.clone());
            continue;
        }
        let pattern = Path::new(&glob::Pattern::escape(&path.to_string_lossy()))
            .join("*")
            .join(MANIFEST);
        let mut children: Vec<PathBuf> = match glob::glob(&pattern.to_string_lossy()) {
            Ok(entries) => entries
                .flatten()
                .filter_map(|m| m.parent().map(Path::to_path_buf))
                .collect(),
            Err(e) => {
                warn!("bad glob pattern {}: {}", pattern.display(), e);
                Vec::new()
            }
        };
        children.sort();
        if children.is_empty() {
            expanded.push(path.clone());
        } else {
            debug!("{} expands to {} package(s)", path.display(), children.len());
            expanded.extend(children);
        }
    }
    expanded
}

/// Load and check one package. Tool-level failures come back as errors.
pub async fn validate_package(
    path: PathBuf,
    store: Arc<TemplateStore>,
    engine: Arc<RuleEngine>,
) -> PackageOutcome {
    let load_path = path.clone();
    let loaded = tokio::task::spawn_blocking(move || SkillPackage::load(&load_path, &store)).await;
    let package = match loaded {
        Ok(Ok(package)) => package,
        Ok(Err(error)) => return PackageOutcome::Failed { path, error },
        Err(join) => {
            return PackageOutcome::Failed {
                error: SkillError::io(
                    &path,
                    std::io::Error::new(std::io::ErrorKind::Other, join.to_string()),
                ),
                path,
            }
        }
    };
    let results = engine.run(Arc::new(package)).await;
    PackageOutcome::Checked { path, results }
}

/// Validate every package concurrently; outcomes come back in argument order.
pub async fn validate_paths(
    paths: &[PathBuf],
    config: &Config,
    full_check: bool,
) -> Vec<PackageOutcome> {
    let store = Arc::new(config.template_store());
    let engine = Arc::new(RuleEngine::new(Ruleset::for_mode(
        &config.validation,
        full_check,
    )));
    info!(
        "validating {} package(s) with {} rule(s)",
        paths.len(),
        engine.ruleset().len()
    );

    let handles: Vec<_> = paths
        .iter()
        .cloned()
        .map(|path| {
            tokio::spawn(validate_package(
                path,
                Arc::clone(&store),
                Arc::clone(&engine),
            ))
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (handle, path) in handles.into_iter().zip(paths) {
        let outcome = handle.await.unwrap_or_else(|e| PackageOutcome::Failed {
            path: path.clone(),
            error: SkillError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            ),
        });
        outcomes.push(outcome);
    }
    outcomes
}

/// Tool errors outrank validation failures.
pub fn batch_exit_code(outcomes: &[PackageOutcome]) -> i32 {
    let codes = outcomes.iter().map(PackageOutcome::exit_code);
    if codes.clone().any(|c| c == EXIT_TOOL_ERROR) {
        EXIT_TOOL_ERROR
    } else if codes.clone().any(|c| c == EXIT_VALIDATION_FAILED) {
        EXIT_VALIDATION_FAILED
    } else {
        EXIT_PASS
    }
}

fn print_text(outcomes: &[PackageOutcome]) {
    for outcome in outcomes {
        match outcome {
            PackageOutcome::Checked { path, results } => {
                let summary = report::summarize(results);
                print!("{}", report::render_package(path, &summary));
            }
            PackageOutcome::Failed { path, error } => {
                println!("\n📋 {} [ERROR]\n\n❌ {}", path.display(), error);
            }
        }
    }

    if outcomes.len() > 1 {
        let passed = outcomes.iter().filter(|o| o.exit_code() == EXIT_PASS).count();
        let failed = outcomes
            .iter()
            .filter(|o| o.exit_code() == EXIT_VALIDATION_FAILED)
            .count();
        let broken = outcomes.len() - passed - failed;
        println!(
            "\nValidated {} package(s): {} passed, {} failed, {} could not be validated",
            outcomes.len(),
            passed,
            failed,
            broken
        );
    }
}

fn print_json(outcomes: &[PackageOutcome]) -> Result<()> {
    let reports = outcomes
        .iter()
        .map(|outcome| match outcome {
            PackageOutcome::Checked { path, results } => serde_json::to_value(JsonReport {
                package: path,
                verdict: report::verdict(results),
                results,
            }),
            PackageOutcome::Failed { path, error } => Ok(json!({
                "package": path,
                "verdict": "error",
                "error": error.to_string(),
            })),
        })
        .collect::<serde_json::Result<Vec<_>>>()?;
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

/// Returns the process exit code: 0 pass, 1 validation failure, 2 tool error.
pub async fn run(
    paths: Vec<String>,
    full_check: bool,
    format: OutputFormat,
    config_path: Option<String>,
) -> Result<i32> {
    let config = Config::load_with_path(config_path)?;
    let paths: Vec<PathBuf> = paths.into_iter().map(PathBuf::from).collect();
    let packages = expand_paths(&paths);

    let outcomes = validate_paths(&packages, &config, full_check).await;
    match format {
        OutputFormat::Text => print_text(&outcomes),
        OutputFormat::Json => print_json(&outcomes)?,
    }

    Ok(batch_exit_code(&outcomes))
}
