use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::init::{self, InitOptions};

#[allow(clippy::too_many_arguments)]
pub fn run(
    name: String,
    path: Option<String>,
    template: Option<String>,
    auto_fill: bool,
    create_research_log: bool,
    display_name: Option<String>,
    status: Option<String>,
    quick_start_minutes: Option<u32>,
    keep_partial: bool,
    config_path: Option<String>,
) -> Result<()> {
    let config = Config::load_with_path(config_path)?;

    let mut options = InitOptions::from_config(name, &config);
    if let Some(path) = path {
        info!("CLI override: path = {}", path);
        options.parent = PathBuf::from(path);
    }
    if let Some(template) = template {
        info!("CLI override: template = {}", template);
        options.template = template;
    }
    if let Some(status) = status {
        info!("CLI override: status = {}", status);
        options.status = status;
    }
    if let Some(minutes) = quick_start_minutes {
        info!("CLI override: quick_start_minutes = {}", minutes);
        options.quick_start_minutes = minutes;
    }
    if keep_partial {
        info!("CLI override: keep partial output on failure");
        options.rollback_on_failure = false;
    }
    options.display_name = display_name;
    options.auto_fill = auto_fill;
    options.create_research_log = create_research_log;

    let store = config.template_store();
    let outcome = init::init(&options, &store)
        .with_context(|| format!("Failed to initialize skill '{}'", options.name))?;

    println!("✅ Created skill directory: {}", outcome.skill_dir.display());
    for file in &outcome.files_written {
        println!("   • {}", file.display());
    }
    if options.auto_fill {
        println!("📝 Remaining [TODO:] markers: {}", outcome.remaining_todos);
    }
    if let Some(log) = &outcome.research_log {
        println!("✅ Research log: {}", log.display());
    }

    println!(
        "\n✅ Skill '{}' initialized from '{}' template",
        options.name, outcome.template_id
    );
    println!("\nNext steps:");
    println!("1. Edit SKILL.md to replace all [TODO: ...] placeholders");
    println!("2. Delete OPTIONAL sections that don't apply to this skill");
    println!("3. Customize or delete the bundled scripts, references and assets");
    println!(
        "4. Run: skillforge validate --full-check {}",
        outcome.skill_dir.display()
    );

    Ok(())
}
