use anyhow::Result;

use crate::config::Config;
use crate::template::builtin;

struct CheckResult {
    passed: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl CheckResult {
    fn new() -> Self {
        Self {
            passed: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn pass(&mut self, msg: impl Into<String>) {
        self.passed.push(msg.into());
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }
}

pub fn run(config_path: Option<String>) -> Result<()> {
    let mut results = CheckResult::new();

    // 1. Load config
    let config = match Config::load_with_path(config_path.clone()) {
        Ok(config) => {
            let source = config_path.as_deref().unwrap_or("default search path");
            results.pass(format!("Config loaded from {}", source));
            config
        }
        Err(e) => {
            // Reported through print_results, not propagated, so it prints once.
            results.error(format!("Failed to load config: {:#}", e));
            print_results(&results);
            return Ok(());
        }
    };

    check_config(&config, &mut results);
    print_results(&results);

    if !results.errors.is_empty() {
        anyhow::bail!("{} config error(s) found", results.errors.len());
    }
    Ok(())
}

fn check_config(config: &Config, results: &mut CheckResult) {
    let v = &config.validation;

    // 2. Metadata limits
    let floor = match v.min_description_len {
        0 => "<= ".to_string(),
        min => format!("{}..", min),
    };
    results.pass(format!(
        "Metadata: name <= {} chars, description {}{} chars (warn at {:.0}%)",
        v.max_name_len,
        floor,
        v.max_description_len,
        v.description_warn_ratio * 100.0
    ));
    if !(0.0..=1.0).contains(&v.description_warn_ratio) {
        results.error(format!(
            "description_warn_ratio must be between 0 and 1 (got {})",
            v.description_warn_ratio
        ));
    }
    if v.min_description_len > v.max_description_len {
        results.error(format!(
            "min_description_len ({}) exceeds max_description_len ({})",
            v.min_description_len, v.max_description_len
        ));
    }
    if v.required_keys.is_empty() {
        results.warn("required_keys is empty; manifests without metadata will pass");
    } else {
        results.pass(format!("Required keys: {}", v.required_keys.join(", ")));
    }

    // 3. Size budget
    results.pass(format!(
        "Body budget: {} lines, {} chars",
        v.max_body_lines, v.max_body_chars
    ));

    // 4. Template directories
    let store = config.template_store();
    for dir in store.dirs() {
        if dir.is_dir() {
            results.pass(format!("Template dir: {} (exists)", dir.display()));
        } else {
            results.warn(format!("Template dir: {} (not found)", dir.display()));
        }
    }

    // 5. Default template must resolve
    let default = &config.init.default_template;
    match store.load(default) {
        Ok(_) => results.pass(format!("Default template: {}", default)),
        Err(e) => results.error(format!("Default template: {}", e)),
    }
    for info in store.list() {
        if builtin::is_builtin(&info.id) {
            continue;
        }
        if let Err(e) = store.load(&info.id) {
            results.error(format!("User template '{}': {}", info.id, e));
        }
    }

    // 6. Init settings
    results.pass(format!(
        "Init: registry_path={}, status={}, research logs in {}",
        config.init.registry_path.display(),
        config.init.status,
        config.init.research_log_dir.display()
    ));
    if !config.autofill.extra.is_empty() {
        let keys: Vec<_> = config.autofill.extra.keys().cloned().collect();
        results.pass(format!("Auto-fill extras: {}", keys.join(", ")));
    }
}

fn print_results(results: &CheckResult) {
    println!();
    for msg in &results.passed {
        println!("  \u{2713} {}", msg);
    }
    for msg in &results.warnings {
        println!("  ! {}", msg);
    }
    for msg in &results.errors {
        println!("  \u{2717} {}", msg);
    }
    println!();
    println!(
        "{} passed, {} warnings, {} errors",
        results.passed.len(),
        results.warnings.len(),
        results.errors.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_check_result_new() {
        let r = CheckResult::new();
        assert!(r.passed.is_empty());
        assert!(r.warnings.is_empty());
        assert!(r.errors.is_empty());
    }

    #[test]
    fn test_default_config_has_no_errors() {
        let mut r = CheckResult::new();
        check_config(&Config::default(), &mut r);
        assert!(r.errors.is_empty(), "{:?}", r.errors);
        assert!(r.passed.iter().any(|m| m.contains("Default template: skill-skeleton")));
    }

    #[test]
    fn test_missing_template_dir_warns() {
        let mut config = Config::default();
        config.templates.dirs = vec![PathBuf::from("/nonexistent/skill-templates")];
        let mut r = CheckResult::new();
        check_config(&config, &mut r);
        assert_eq!(r.warnings.len(), 1);
        assert!(r.warnings[0].contains("not found"));
    }

    #[test]
    fn test_unknown_default_template_is_error() {
        let mut config = Config::default();
        config.init.default_template = "ghost".to_string();
        let mut r = CheckResult::new();
        check_config(&config, &mut r);
        assert!(r.errors.iter().any(|e| e.contains("ghost")));
    }

    #[test]
    fn test_bad_ratio_is_error() {
        let mut config = Config::default();
        config.validation.description_warn_ratio = 1.5;
        let mut r = CheckResult::new();
        check_config(&config, &mut r);
        assert_eq!(r.errors.len(), 1);
    }

    #[test]
    fn test_run_with_missing_file_reports_without_failing() {
        assert!(run(Some("/nonexistent/skillforge.toml".to_string())).is_ok());
    }
}
