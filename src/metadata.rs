//! Manifest header (frontmatter) parsing and schema checks.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;

use crate::config::ValidationConfig;
use crate::error::SkillError;
use crate::rules::{Location, Severity, ValidationResult};

pub const RULE_ID: &str = "metadata-schema";

static NAME_FORMAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex"));
static ACTIVATION_HINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(use when|use this when|should be used when|when the user|triggers?)\b")
        .expect("valid regex")
});
static SECOND_PERSON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(you|your|you're)\b").expect("valid regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub file: PathBuf,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Originating template id, written by templates that support conformance checks.
    pub template: Option<String>,
    pub fields: BTreeMap<String, Value>,
    /// 1-based manifest line on which each top-level key appears.
    pub key_lines: BTreeMap<String, usize>,
    pub body: String,
    /// 1-based manifest line where the body starts.
    pub body_start_line: usize,
}

impl MetadataRecord {
    pub fn line_of(&self, key: &str) -> Option<usize> {
        self.key_lines.get(key).copied()
    }

    fn location(&self, key: &str) -> Location {
        Location::File {
            path: self.file.clone(),
            line: self.line_of(key).or(Some(1)),
        }
    }
}

fn header_error(file: &Path, reason: impl Into<String>) -> SkillError {
    SkillError::HeaderParseError {
        file: file.to_path_buf(),
        reason: reason.into(),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Split a manifest into its header and body and parse the header as YAML.
pub fn parse(file: impl AsRef<Path>, content: &str) -> Result<MetadataRecord, SkillError> {
    let file = file.as_ref();
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let lines: Vec<&str> = content.lines().collect();

    match lines.first() {
        Some(first) if first.trim_end() == "---" => {}
        _ => {
            return Err(header_error(
                file,
                "manifest must start with a `---` metadata block",
            ))
        }
    }

    let close = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, l)| l.trim_end() == "---")
        .map(|(i, _)| i)
        .ok_or_else(|| header_error(file, "metadata block is not closed with `---`"))?;

    let header = lines[1..close].join("\n");
    let parsed: Value = if header.trim().is_empty() {
        Value::Mapping(Default::default())
    } else {
        serde_yaml::from_str(&header).map_err(|e| header_error(file, e.to_string()))?
    };
    let mapping = match parsed {
        Value::Mapping(m) => m,
        Value::Null => Default::default(),
        _ => return Err(header_error(file, "metadata block must be a key/value mapping")),
    };

    let mut fields = BTreeMap::new();
    for (key, value) in mapping {
        let key = scalar_string(&key)
            .ok_or_else(|| header_error(file, "metadata keys must be plain strings"))?;
        fields.insert(key, value);
    }

    let mut key_lines = BTreeMap::new();
    for (idx, line) in lines[1..close].iter().enumerate() {
        if line.starts_with(|c: char| c.is_whitespace() || c == '#' || c == '-') {
            continue;
        }
        if let Some((key, _)) = line.split_once(':') {
            key_lines
                .entry(key.trim().to_string())
                .or_insert(idx + 2);
        }
    }

    let field = |key: &str| fields.get(key).and_then(scalar_string);
    let body = if close + 1 < lines.len() {
        lines[close + 1..].join("\n")
    } else {
        String::new()
    };

    Ok(MetadataRecord {
        file: file.to_path_buf(),
        name: field("name"),
        description: field("description"),
        template: field("template"),
        key_lines,
        body,
        body_start_line: close + 2,
        fields,
    })
}

fn finding(
    severity: Severity,
    location: Location,
    message: String,
    suggestion: Option<String>,
) -> ValidationResult {
    ValidationResult {
        rule_id: RULE_ID.to_string(),
        severity,
        location,
        message,
        suggestion,
    }
}

/// Check a parsed header against the schema. Every check runs; all findings are returned.
pub fn validate(
    record: &MetadataRecord,
    package_dir_name: &str,
    limits: &ValidationConfig,
) -> Vec<ValidationResult> {
    let mut findings = Vec::new();

    for key in &limits.required_keys {
        if !record.fields.contains_key(key) {
            findings.push(finding(
                Severity::Error,
                Location::File {
                    path: record.file.clone(),
                    line: Some(1),
                },
                format!("Missing required metadata key: {}", key),
                Some(format!("Add '{}: <value>' to the metadata block", key)),
            ));
        }
    }

    findings.extend(check_name(record, package_dir_name, limits));
    findings.extend(check_description(record, limits));
    findings
}

fn check_name(
    record: &MetadataRecord,
    package_dir_name: &str,
    limits: &ValidationConfig,
) -> Vec<ValidationResult> {
    let mut findings = Vec::new();
    let location = record.location("name");

    let name = match (&record.name, record.fields.get("name")) {
        (Some(name), _) => name.trim(),
        (None, Some(_)) => {
            findings.push(finding(
                Severity::Error,
                location,
                "'name' must be a plain string".to_string(),
                Some("Quote the value or write it as a single word".to_string()),
            ));
            return findings;
        }
        // Absence is reported by the required-key check.
        (None, None) => return findings,
    };

    if name.is_empty() {
        findings.push(finding(
            Severity::Error,
            location,
            "'name' is empty".to_string(),
            Some(format!("Set 'name: {}'", package_dir_name)),
        ));
        return findings;
    }

    if name != package_dir_name {
        findings.push(finding(
            Severity::Error,
            location.clone(),
            format!(
                "'name' is '{}' but the package directory is '{}'",
                name, package_dir_name
            ),
            Some("Rename the directory or change 'name' so they match".to_string()),
        ));
    }

    if name.chars().count() > limits.max_name_len {
        findings.push(finding(
            Severity::Error,
            location.clone(),
            format!(
                "'name' exceeds {} characters ({})",
                limits.max_name_len,
                name.chars().count()
            ),
            None,
        ));
    }

    if !NAME_FORMAT_RE.is_match(name) {
        findings.push(finding(
            Severity::Error,
            location,
            format!(
                "'name' '{}' must be hyphen-case (lowercase letters, digits, single hyphens)",
                name
            ),
            Some("Example: pdf-form-filling".to_string()),
        ));
    }

    findings
}

fn check_description(record: &MetadataRecord, limits: &ValidationConfig) -> Vec<ValidationResult> {
    let mut findings = Vec::new();
    let location = record.location("description");

    let description = match (&record.description, record.fields.get("description")) {
        (Some(d), _) => d.trim(),
        (None, Some(_)) => {
            findings.push(finding(
                Severity::Error,
                location,
                "'description' must be a plain string".to_string(),
                Some("Quote the value; unquoted [brackets] are read as a list".to_string()),
            ));
            return findings;
        }
        (None, None) => return findings,
    };

    if description.is_empty() {
        findings.push(finding(
            Severity::Error,
            location,
            "'description' is empty".to_string(),
            Some("Describe what the skill does and when to use it".to_string()),
        ));
        return findings;
    }

    let len = description.chars().count();
    let warn_at = (limits.max_description_len as f64 * limits.description_warn_ratio) as usize;
    if len > limits.max_description_len {
        findings.push(finding(
            Severity::Error,
            location.clone(),
            format!(
                "'description' exceeds {} characters ({})",
                limits.max_description_len, len
            ),
            Some("Move detail into the body; keep the description a dispatch hint".to_string()),
        ));
    } else if len >= warn_at {
        findings.push(finding(
            Severity::Warning,
            location.clone(),
            format!(
                "'description' is near the {} character limit ({})",
                limits.max_description_len, len
            ),
            None,
        ));
    } else if limits.min_description_len > 0 && len < limits.min_description_len {
        findings.push(finding(
            Severity::Warning,
            location.clone(),
            format!(
                "'description' is very short ({} chars, recommend at least {})",
                len, limits.min_description_len
            ),
            None,
        ));
    }

    if description.contains('<') || description.contains('>') {
        findings.push(finding(
            Severity::Error,
            location.clone(),
            "'description' cannot contain angle brackets (< or >)".to_string(),
            None,
        ));
    }

    if !ACTIVATION_HINT_RE.is_match(description) {
        findings.push(finding(
            Severity::Warning,
            location.clone(),
            "'description' does not say when the skill should be used".to_string(),
            Some("Add a trigger phrase such as 'Use when ...'".to_string()),
        ));
    }

    if SECOND_PERSON_RE.is_match(description) {
        findings.push(finding(
            Severity::Warning,
            location,
            "'description' should use third-person voice, not 'you/your'".to_string(),
            None,
        ));
    }

    findings
}
