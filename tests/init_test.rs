//! Initializer behaviour through the public API

use anyhow::Result;
use chrono::NaiveDate;
use skillforge::config::Config;
use skillforge::error::SkillError;
use skillforge::init::{init_on, InitOptions};
use skillforge::placeholder;
use skillforge::template::TemplateStore;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn options(parent: &Path, name: &str, template: &str) -> InitOptions {
    InitOptions {
        parent: parent.to_path_buf(),
        template: template.to_string(),
        ..InitOptions::from_config(name, &Config::default())
    }
}

#[test]
fn test_skill_skeleton_layout() -> Result<()> {
    let tmp = TempDir::new()?;
    let outcome = init_on(
        &options(tmp.path(), "report-formatting", "skill-skeleton"),
        &TemplateStore::builtin_only(),
        today(),
    )?;

    let dir = tmp.path().join("report-formatting");
    assert_eq!(outcome.skill_dir, dir);
    for rel in [
        "SKILL.md",
        "README.md",
        "scripts/example.py",
        "references/api_reference.md",
        "assets/example_asset.txt",
    ] {
        assert!(dir.join(rel).is_file(), "missing {}", rel);
    }
    Ok(())
}

#[test]
fn test_auto_fill_leaves_only_authoring_placeholders() -> Result<()> {
    let tmp = TempDir::new()?;
    let mut opts = options(tmp.path(), "report-formatting", "minimal-skeleton");
    opts.auto_fill = true;
    opts.display_name = Some("Report Formatting".to_string());
    let outcome = init_on(&opts, &TemplateStore::builtin_only(), today())?;

    let manifest = fs::read_to_string(outcome.skill_dir.join("SKILL.md"))?;
    let left = placeholder::names(&manifest);
    assert!(!left.contains("skill-name"));
    assert!(!left.contains("display-name"));
    assert!(left.contains("description"));
    assert_eq!(outcome.unresolved, {
        let mut all = left.clone();
        all.extend(placeholder::names(&fs::read_to_string(
            outcome.skill_dir.join("README.md"),
        )?));
        all
    });
    Ok(())
}

#[test]
fn test_complete_bindings_resolve_everything() -> Result<()> {
    let store = TemplateStore::builtin_only();
    for id in ["skill-skeleton", "minimal-skeleton"] {
        let template = store.load(id)?;
        let tmp = TempDir::new()?;
        let mut opts = options(tmp.path(), "complete-skill", id);
        opts.auto_fill = true;
        for file in &template.files {
            for name in placeholder::names(&file.content) {
                opts.extra.entry(name).or_insert_with(|| "filled".to_string());
            }
        }

        let outcome = init_on(&opts, &store, today())?;
        assert!(outcome.unresolved.is_empty(), "{}: {:?}", id, outcome.unresolved);
        assert_eq!(outcome.remaining_todos, 0);
    }
    Ok(())
}

#[test]
fn test_user_template_from_config_dir() -> Result<()> {
    let templates = TempDir::new()?;
    let dir = templates.path().join("team-skill");
    fs::create_dir_all(dir.join("references"))?;
    fs::write(
        dir.join("SKILL.md.template"),
        "---\nname: \"[TODO(skill-name): name]\"\ntemplate: team-skill\n---\n# [TODO(display-name): title]\n\n<!-- BEGIN CORE: usage -->\n## Usage\n<!-- END: usage -->\n",
    )?;
    fs::write(dir.join("references/guide.md"), "# Guide\n")?;

    let mut config = Config::default();
    config.templates.dirs = vec![templates.path().to_path_buf()];
    let out = TempDir::new()?;
    let mut opts = InitOptions::from_config("team-demo", &config);
    opts.parent = out.path().to_path_buf();
    opts.template = "team-skill".to_string();
    opts.auto_fill = true;

    let outcome = init_on(&opts, &config.template_store(), today())?;
    let manifest = fs::read_to_string(outcome.skill_dir.join("SKILL.md"))?;
    assert!(manifest.starts_with("---\nname: \"team-demo\""));
    assert!(manifest.contains("# Team Demo"));
    assert!(outcome.skill_dir.join("references/guide.md").is_file());
    assert!(!outcome.skill_dir.join("SKILL.md.template").exists());
    Ok(())
}

#[test]
fn test_tool_errors() -> Result<()> {
    let tmp = TempDir::new()?;
    let store = TemplateStore::builtin_only();

    let err = init_on(&options(tmp.path(), "Not Valid", "skill-skeleton"), &store, today())
        .unwrap_err();
    assert!(matches!(err, SkillError::InvalidName { .. }));

    let err = init_on(&options(tmp.path(), "fine", "nope"), &store, today()).unwrap_err();
    match err {
        SkillError::TemplateNotFound { available, .. } => {
            assert_eq!(available, vec!["skill-skeleton", "minimal-skeleton"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    init_on(&options(tmp.path(), "fine", "minimal-skeleton"), &store, today())?;
    let err = init_on(&options(tmp.path(), "fine", "minimal-skeleton"), &store, today())
        .unwrap_err();
    assert!(matches!(err, SkillError::DestinationExists(_)));
    Ok(())
}
