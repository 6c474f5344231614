//! Upgrades older rule shapes to the canonical tagged form.
//!
//! Shapes seen in deployed settings files:
//! - `{keywords, images}` with no `type`
//! - `{keywords, type: "image" | "flex1" | "flex2" | ..., text, images}`
//! - `{keywords, type: <name in flex_templates>, responses: [{data}]}`
//! - `{keywords, template, responses}` with no `type`

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use super::SettingsError;
use crate::layouts::FlexLayout;
use crate::template::TemplateDocument;

const CANONICAL_TAGS: [&str; 4] = ["text", "image", "flex", "template"];

/// Rewrite one raw rule into the canonical shape, or reject it.
pub(super) fn upgrade_rule(
    index: usize,
    entry: Value,
    templates: &BTreeMap<String, TemplateDocument>,
) -> Result<Value, SettingsError> {
    let Value::Object(mut obj) = entry else {
        return Err(SettingsError::UnknownShape {
            index,
            reason: "rule is not an object".to_string(),
        });
    };
    upgrade_triggers(&mut obj);

    let kind = obj.get("type").and_then(Value::as_str).map(str::to_string);
    match kind.as_deref() {
        Some("template") => normalize_responses(&mut obj),
        Some(tag) if CANONICAL_TAGS.contains(&tag) => {}
        Some(name) if templates.contains_key(name) => into_template(&mut obj, name),
        Some(name) if name.starts_with("flex") => {
            obj.insert("type".into(), json!("flex"));
            obj.insert("layout".into(), json!(FlexLayout::from_legacy_type(name)));
        }
        Some(other) => {
            return Err(SettingsError::UnknownShape {
                index,
                reason: format!("unknown type '{other}'"),
            })
        }
        None if obj.contains_key("template") => {
            obj.insert("type".into(), json!("template"));
            normalize_responses(&mut obj);
        }
        None if obj.contains_key("images") => {
            obj.insert("type".into(), json!("image"));
        }
        None if obj.contains_key("text") => {
            obj.insert("type".into(), json!("text"));
        }
        None => {
            return Err(SettingsError::UnknownShape {
                index,
                reason: "no type, images, text, or template".to_string(),
            })
        }
    }
    Ok(Value::Object(obj))
}

/// Accept a comma-separated trigger string in place of an array.
fn upgrade_triggers(obj: &mut Map<String, Value>) {
    if let Some(Value::String(joined)) = obj.get("keywords") {
        let list: Vec<Value> = joined
            .split(',')
            .map(str::trim)
            .filter(|kw| !kw.is_empty())
            .map(|kw| Value::String(kw.to_string()))
            .collect();
        obj.insert("keywords".into(), Value::Array(list));
    }
}

/// A legacy rule whose `type` names a stored template.
fn into_template(obj: &mut Map<String, Value>, name: &str) {
    obj.insert("type".into(), json!("template"));
    obj.insert("template".into(), json!(name));

    let has_responses = matches!(obj.get("responses"), Some(Value::Array(items)) if !items.is_empty());
    if !has_responses {
        let data = synthesize_data(obj);
        obj.insert("responses".into(), json!([{ "data": data }]));
    }
    if !obj.contains_key("alt_text") {
        if let Some(Value::String(text)) = obj.get("text") {
            if !text.trim().is_empty() {
                let text = text.clone();
                obj.insert("alt_text".into(), Value::String(text));
            }
        }
    }
    normalize_responses(obj);
}

/// Build a single card's data from the legacy `text` and `images` fields.
fn synthesize_data(obj: &Map<String, Value>) -> Map<String, Value> {
    let mut data = Map::new();
    if let Some(Value::String(text)) = obj.get("text") {
        data.insert("title".into(), json!(text));
        data.insert("text".into(), json!(text));
    }
    if let Some(Value::Array(images)) = obj.get("images") {
        let urls = images.iter().filter_map(Value::as_str);
        for (i, url) in urls.enumerate() {
            if i == 0 {
                data.insert("image".into(), json!(url));
            }
            data.insert(format!("image_{}", i + 1), json!(url));
        }
    }
    data
}

/// Wrap bare response maps in `{data}` and stringify scalar values.
fn normalize_responses(obj: &mut Map<String, Value>) {
    let Some(Value::Array(items)) = obj.get_mut("responses") else {
        return;
    };
    for item in items.iter_mut() {
        let Value::Object(entry) = item else {
            continue;
        };
        if !matches!(entry.get("data"), Some(Value::Object(_))) {
            let bare = std::mem::take(entry);
            entry.insert("data".into(), Value::Object(bare));
        }
        if let Some(Value::Object(data)) = entry.get_mut("data") {
            for value in data.values_mut() {
                let text = match value {
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null => String::new(),
                    _ => continue,
                };
                *value = Value::String(text);
            }
        }
    }
}
