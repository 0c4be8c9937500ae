//! Verdicts, exit codes and rendering of validation results.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::rules::{Severity, ValidationResult};

pub const EXIT_PASS: i32 = 0;
pub const EXIT_VALIDATION_FAILED: i32 = 1;
pub const EXIT_TOOL_ERROR: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Pass => EXIT_PASS,
            Verdict::Fail => EXIT_VALIDATION_FAILED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub verdict: Verdict,
    pub exit_code: i32,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub rendered: String,
}

fn count(results: &[ValidationResult], severity: Severity) -> usize {
    results.iter().filter(|r| r.severity == severity).count()
}

/// Pass iff there is no error-severity result.
pub fn verdict(results: &[ValidationResult]) -> Verdict {
    if results.iter().any(|r| r.severity == Severity::Error) {
        Verdict::Fail
    } else {
        Verdict::Pass
    }
}

pub fn summarize(results: &[ValidationResult]) -> Summary {
    let verdict = verdict(results);
    Summary {
        verdict,
        exit_code: verdict.exit_code(),
        errors: count(results, Severity::Error),
        warnings: count(results, Severity::Warning),
        infos: count(results, Severity::Info),
        rendered: render_text(results),
    }
}

/// Human-readable listing grouped by severity, followed by a summary line.
pub fn render_text(results: &[ValidationResult]) -> String {
    let mut out = String::new();
    if results.is_empty() {
        out.push_str("✅ No validation issues found!\n");
        return out;
    }

    let groups = [
        (Severity::Error, "❌ Errors"),
        (Severity::Warning, "⚠️  Warnings"),
        (Severity::Info, "ℹ️  Info"),
    ];
    for (severity, header) in groups {
        let group: Vec<_> = results.iter().filter(|r| r.severity == severity).collect();
        if group.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{} ({}):", header, group.len());
        for result in group {
            let _ = writeln!(
                out,
                "   • {} [{}] {}: {}",
                result.severity, result.rule_id, result.location, result.message
            );
            if let Some(suggestion) = &result.suggestion {
                let _ = writeln!(out, "     💡 {}", suggestion);
            }
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "Summary: {} errors, {} warnings, {} info",
        count(results, Severity::Error),
        count(results, Severity::Warning),
        count(results, Severity::Info)
    );
    out
}

/// One package's report with a header naming the package.
pub fn render_package(path: &Path, summary: &Summary) -> String {
    let status = match summary.verdict {
        Verdict::Pass => "PASS",
        Verdict::Fail => "FAIL",
    };
    format!(
        "\n📋 {} [{}]\n\n{}",
        path.display(),
        status,
        summary.rendered
    )
}

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub package: &'a Path,
    pub verdict: Verdict,
    pub results: &'a [ValidationResult],
}

/// Machine-readable report for one package.
pub fn render_json(path: &Path, results: &[ValidationResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        package: path,
        verdict: verdict(results),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Location;

    fn result(severity: Severity, message: &str) -> ValidationResult {
        ValidationResult::new("test-rule", severity, Location::file("SKILL.md", 4), message)
    }

    #[test]
    fn test_empty_results_pass() {
        let summary = summarize(&[]);
        assert_eq!(summary.verdict, Verdict::Pass);
        assert_eq!(summary.exit_code, EXIT_PASS);
        assert!(summary.rendered.contains("No validation issues"));
    }

    #[test]
    fn test_warnings_and_info_still_pass() {
        let results = vec![
            result(Severity::Warning, "long"),
            result(Severity::Info, "optional"),
        ];
        let summary = summarize(&results);
        assert_eq!(summary.verdict, Verdict::Pass);
        assert_eq!(summary.exit_code, 0);
        assert_eq!((summary.warnings, summary.infos), (1, 1));
    }

    #[test]
    fn test_any_error_fails() {
        let results = vec![
            result(Severity::Info, "optional"),
            result(Severity::Error, "broken").with_suggestion("fix it"),
        ];
        let summary = summarize(&results);
        assert_eq!(summary.verdict, Verdict::Fail);
        assert_eq!(summary.exit_code, EXIT_VALIDATION_FAILED);
        assert!(summary
            .rendered
            .contains("error [test-rule] SKILL.md:4: broken"));
        assert!(summary.rendered.contains("💡 fix it"));
        assert!(summary
            .rendered
            .contains("Summary: 1 errors, 0 warnings, 1 info"));
        // Errors group comes first regardless of input order.
        let errors_at = summary.rendered.find("Errors").unwrap();
        let info_at = summary.rendered.find("Info").unwrap();
        assert!(errors_at < info_at);
    }

    #[test]
    fn test_json_report() {
        let results = vec![result(Severity::Error, "broken")];
        let json = render_json(Path::new("skills/demo"), &results).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["verdict"], "fail");
        assert_eq!(value["package"], "skills/demo");
        assert_eq!(value["results"][0]["rule_id"], "test-rule");
        assert_eq!(value["results"][0]["severity"], "error");
        assert_eq!(value["results"][0]["location"]["kind"], "file");
        assert_eq!(value["results"][0]["location"]["line"], 4);
        assert!(value["results"][0].get("suggestion").is_none());
    }
}
