//! `[TODO: ...]` placeholder tokens.
//!
//! Two forms are recognised:
//!
//! - `[TODO: <hint>]`: anonymous, its name is the trimmed hint.
//! - `[TODO(<name>): <hint>]`: named, bindings match on `<name>`.
//!
//! Resolution is literal substitution of the whole token. Tokens without a
//! binding stay verbatim and are reported back so nothing silently turns into
//! empty text.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::section::Section;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[TODO(?:\(([a-z0-9_-]+)\))?:\s*([^\[\]]*)\]").expect("valid regex")
});

/// Name → replacement text.
pub type Bindings = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub hint: String,
    /// 1-based line the token starts on, relative to the scanned text.
    pub line: usize,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub content: String,
    pub unresolved: BTreeSet<String>,
}

fn hint_of(caps: &Captures<'_>) -> String {
    // Hints may wrap across lines in templates; collapse for messages.
    caps[2].split_whitespace().collect::<Vec<_>>().join(" ")
}

fn name_of(caps: &Captures<'_>) -> String {
    match caps.get(1) {
        Some(name) => name.as_str().to_string(),
        None => hint_of(caps),
    }
}

/// All placeholder tokens in `text`, in document order.
pub fn scan(text: &str) -> Vec<Placeholder> {
    TOKEN_RE
        .captures_iter(text)
        .map(|caps| {
            let whole = caps.get(0).map(|m| (m.start(), m.as_str())).unwrap_or((0, ""));
            Placeholder {
                name: name_of(&caps),
                hint: hint_of(&caps),
                line: text[..whole.0].matches('\n').count() + 1,
                token: whole.1.to_string(),
            }
        })
        .collect()
}

/// Distinct placeholder names in `text`.
pub fn names(text: &str) -> BTreeSet<String> {
    scan(text).into_iter().map(|p| p.name).collect()
}

pub fn contains_placeholder(text: &str) -> bool {
    TOKEN_RE.is_match(text)
}

/// Substitute bound placeholders in a single pass.
///
/// Bound values are inserted literally and are not rescanned.
pub fn resolve(text: &str, bindings: &Bindings) -> Resolution {
    let mut unresolved = BTreeSet::new();
    let content = TOKEN_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let name = name_of(caps);
            match bindings.get(&name) {
                Some(value) => value.clone(),
                None => {
                    unresolved.insert(name);
                    caps[0].to_string()
                }
            }
        })
        .into_owned();
    Resolution {
        content,
        unresolved,
    }
}

pub fn scan_section(section: &Section) -> BTreeSet<String> {
    names(&section.content)
}

pub fn resolve_section(section: &Section, bindings: &Bindings) -> Resolution {
    resolve(&section.content, bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, &str)]) -> Bindings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_scan_named_and_anonymous() {
        let text = "name: [TODO(skill-name): lowercase-hyphen-case-name]\n\n[TODO: 1-2 sentences]\n";
        let found = scan(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "skill-name");
        assert_eq!(found[0].hint, "lowercase-hyphen-case-name");
        assert_eq!(found[0].line, 1);
        assert_eq!(found[1].name, "1-2 sentences");
        assert_eq!(found[1].line, 3);
    }

    #[test]
    fn test_multiline_hint_is_collapsed() {
        let found = scan("[TODO: pick a\n   structure]");
        assert_eq!(found[0].hint, "pick a structure");
        assert_eq!(found[0].name, "pick a structure");
    }

    #[test]
    fn test_unclosed_token_does_not_swallow_links() {
        let text = "[TODO: describe the inputs\n\nSee [the guide](references/guide.md).\n[TODO(b): later]\n";
        let found = scan(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "b");
        assert_eq!(found[0].line, 4);

        let res = resolve(text, &bindings(&[("b", "B")]));
        assert!(res.content.contains("See [the guide](references/guide.md)."));
        assert!(res.content.ends_with("B\n"));
    }

    #[test]
    fn test_resolve_replaces_whole_token() {
        let text = "**Status**: [TODO(status): Production Ready / Beta]";
        let res = resolve(text, &bindings(&[("status", "Beta")]));
        assert_eq!(res.content, "**Status**: Beta");
        assert!(res.unresolved.is_empty());
    }

    #[test]
    fn test_unbound_tokens_stay_verbatim() {
        let text = "[TODO(a): x] and [TODO: free text]";
        let res = resolve(text, &bindings(&[("a", "A")]));
        assert_eq!(res.content, "A and [TODO: free text]");
        assert_eq!(
            res.unresolved.into_iter().collect::<Vec<_>>(),
            vec!["free text".to_string()]
        );
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let once = resolve("# [TODO(display-name): Name]", &bindings(&[("display-name", "Demo")]));
        let twice = resolve(&once.content, &Bindings::new());
        assert_eq!(twice.content, once.content);
        assert!(twice.unresolved.is_empty());
    }

    #[test]
    fn test_bound_values_are_not_rescanned() {
        let res = resolve("[TODO(a): x]", &bindings(&[("a", "[TODO(b): y]")]));
        assert_eq!(res.content, "[TODO(b): y]");
        assert!(res.unresolved.is_empty());
    }

    #[test]
    fn test_lowercase_todo_is_not_a_token() {
        assert!(scan("[todo: nope] and TODO: nope").is_empty());
        assert!(!contains_placeholder("- [ ] checklist"));
    }
}
