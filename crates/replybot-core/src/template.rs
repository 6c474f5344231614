//! Placeholder substitution over JSON message templates.
//!
//! Templates are parsed `serde_json::Value` trees. Rendering walks the tree
//! and rewrites `{{name}}` tokens inside string leaves only, so structural
//! JSON (keys, numbers, booleans) is never touched.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// A rich-card message template with `{{name}}` tokens in its string leaves.
pub type TemplateDocument = Value;

/// Placeholder name → substitution value for one rendered card.
pub type Substitutions = BTreeMap<String, String>;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Render a filled copy of `template`. The input is never modified.
///
/// Recognized placeholders without a substitution render as an empty string.
pub fn render(template: &TemplateDocument, subs: &Substitutions) -> TemplateDocument {
    match template {
        Value::String(s) => Value::String(fill(s, subs)),
        Value::Array(items) => Value::Array(items.iter().map(|v| render(v, subs)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render(v, subs)))
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}

/// Every placeholder name referenced anywhere in `template`.
pub fn placeholders(template: &TemplateDocument) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect(template, &mut names);
    names
}

fn collect(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => scan(s, |token| match token {
            Token::Literal(_) => {}
            Token::Placeholder(name) => {
                names.insert(name.to_string());
            }
        }),
        Value::Array(items) => items.iter().for_each(|v| collect(v, names)),
        Value::Object(map) => map.values().for_each(|v| collect(v, names)),
        _ => {}
    }
}

fn fill(s: &str, subs: &Substitutions) -> String {
    if !s.contains(OPEN) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    scan(s, |token| match token {
        Token::Literal(text) => out.push_str(text),
        Token::Placeholder(name) => {
            if let Some(value) = subs.get(name) {
                out.push_str(value);
            }
        }
    });
    out
}

enum Token<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Split `s` into literal runs and placeholder names.
///
/// `{{` without a matching `}}` is emitted as a literal. When the text
/// between `{{` and `}}` is not a valid name, only the first `{` is literal
/// and scanning resumes right after it, so `{{ {{title}}` and `{{{title}}}`
/// still substitute `title`.
fn scan<'a>(s: &'a str, mut emit: impl FnMut(Token<'a>)) {
    let mut rest = s;
    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        let Some(end) = after.find(CLOSE) else {
            break;
        };
        let name = after[..end].trim();
        if is_placeholder_name(name) {
            emit(Token::Literal(&rest[..start]));
            emit(Token::Placeholder(name));
            rest = &rest[start + OPEN.len() + end + CLOSE.len()..];
        } else {
            emit(Token::Literal(&rest[..=start]));
            rest = &rest[start + 1..];
        }
    }
    emit(Token::Literal(rest));
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
