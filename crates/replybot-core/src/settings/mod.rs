//! Operator-editable reply settings: the keyword rule table, named flex
//! templates, and the fallback prompt.
//!
//! Raw JSON is upgraded from older shapes (`migrate`), checked
//! (`validate`), and only then exposed as typed [`Settings`].

mod migrate;
mod store;
mod validate;

#[cfg(test)]
mod tests;

pub use store::SettingsStore;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::layouts::FlexLayout;
use crate::template::{Substitutions, TemplateDocument};

/// Prompt used when the settings file does not provide one.
pub const DEFAULT_PROMPT: &str = "สวัสดีค่ะ มีอะไรให้ช่วยไหมคะ";

/// LINE carousels hold at most this many bubbles.
pub const MAX_CAROUSEL_CARDS: usize = 12;

/// LINE accepts at most this many messages per reply.
pub const MAX_REPLY_MESSAGES: usize = 5;

/// Why a settings document was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("settings document must be a JSON object")]
    NotAnObject,

    #[error("rule #{index}: unrecognized shape ({reason})")]
    UnknownShape { index: usize, reason: String },

    #[error("rule #{index}: no trigger keywords")]
    EmptyTriggers { index: usize },

    #[error("rule #{index}: empty trigger keyword would match every message")]
    EmptyTrigger { index: usize },

    #[error("rule #{index}: unknown template '{name}'")]
    UnknownTemplate { index: usize, name: String },

    #[error("rule #{index}: {count} responses (expected 1..={max})", max = MAX_CAROUSEL_CARDS)]
    ResponseCount { index: usize, count: usize },

    #[error("rule #{index}: {count} images (expected 1..={max})", max = MAX_REPLY_MESSAGES)]
    ImageCount { index: usize, count: usize },

    #[error("malformed settings: {0}")]
    Malformed(String),
}

/// The complete reply configuration. Immutable once built; replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Fallback prompt: system context for the completion call, or the
    /// plain reply when no provider is configured.
    pub prompt: String,
    /// Rules in match order.
    pub keywords: Vec<KeywordRule>,
    /// Named flex templates referenced by `template` rules.
    #[serde(default)]
    pub flex_templates: BTreeMap<String, TemplateDocument>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            keywords: Vec::new(),
            flex_templates: BTreeMap::new(),
        }
    }
}

/// Trigger substrings mapped to a canned or templated reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Lower-cased trigger substrings.
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub reply: ReplyKind,
}

impl KeywordRule {
    /// Whether any trigger occurs in the already lower-cased text.
    pub fn matches(&self, text_lower: &str) -> bool {
        self.keywords.iter().any(|kw| text_lower.contains(kw.as_str()))
    }
}

/// What a matched rule replies with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplyKind {
    /// Plain text.
    Text { text: String },
    /// One image message per URL.
    Image { images: Vec<String> },
    /// A built-in bubble layout.
    Flex {
        #[serde(default)]
        layout: FlexLayout,
        #[serde(default)]
        text: String,
        #[serde(default)]
        images: Vec<String>,
    },
    /// A named template filled once per response entry.
    Template {
        template: String,
        responses: Vec<ResponseData>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt_text: Option<String>,
        /// Substitution keys an entry must carry (non-blank) to be rendered.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        required: Vec<String>,
    },
}

impl ReplyKind {
    /// Tag name as it appears in the settings file.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Flex { .. } => "flex",
            Self::Template { .. } => "template",
        }
    }
}

/// Substitutions for one generated card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    #[serde(default)]
    pub data: Substitutions,
}

impl ResponseData {
    /// Names from `required` that are absent or blank in this entry.
    pub fn missing<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|key| {
                self.data
                    .get(key.as_str())
                    .is_none_or(|v| v.trim().is_empty())
            })
            .map(String::as_str)
            .collect()
    }
}

impl Settings {
    /// Build settings from a raw JSON document of any supported shape.
    pub fn from_value(raw: Value) -> Result<Self, SettingsError> {
        let Value::Object(mut obj) = raw else {
            return Err(SettingsError::NotAnObject);
        };

        let prompt = match obj.remove("prompt") {
            Some(Value::String(p)) if !p.trim().is_empty() => p,
            _ => DEFAULT_PROMPT.to_string(),
        };

        let flex_templates: BTreeMap<String, TemplateDocument> = match obj.remove("flex_templates")
        {
            Some(Value::Object(map)) => map.into_iter().collect(),
            Some(Value::Null) | None => BTreeMap::new(),
            Some(_) => {
                return Err(SettingsError::Malformed(
                    "flex_templates must be an object".to_string(),
                ))
            }
        };

        let entries = match obj.remove("keywords") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(SettingsError::Malformed(
                    "keywords must be an array".to_string(),
                ))
            }
        };

        let mut keywords = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let canonical = migrate::upgrade_rule(index, entry, &flex_templates)?;
            let mut rule: KeywordRule = serde_json::from_value(canonical).map_err(|e| {
                SettingsError::UnknownShape {
                    index,
                    reason: e.to_string(),
                }
            })?;
            rule.keywords = rule
                .keywords
                .iter()
                .map(|kw| kw.trim().to_lowercase())
                .collect();
            keywords.push(rule);
        }

        let settings = Self {
            prompt,
            keywords,
            flex_templates,
        };
        validate::validate(&settings)?;
        Ok(settings)
    }

    /// Apply a partial admin document on top of these settings.
    ///
    /// A non-empty `prompt`, and any present `keywords` or `flex_templates`,
    /// replace the current values. The result is migrated and validated.
    pub fn merged(&self, patch: Value) -> Result<Self, SettingsError> {
        let Value::Object(patch) = patch else {
            return Err(SettingsError::NotAnObject);
        };
        let mut base = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => return Err(SettingsError::Malformed(e.to_string())),
        };

        if let Some(Value::String(prompt)) = patch.get("prompt") {
            if !prompt.trim().is_empty() {
                base.insert("prompt".into(), Value::String(prompt.clone()));
            }
        }
        for key in ["keywords", "flex_templates"] {
            if let Some(value) = patch.get(key) {
                if !value.is_null() {
                    base.insert(key.into(), value.clone());
                }
            }
        }

        Self::from_value(Value::Object(base))
    }
}
