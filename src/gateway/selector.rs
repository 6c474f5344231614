//! Keyword matching and reply rendering for one inbound text.
//!
//! Rules are tried in configured order and the first match wins. Nothing
//! here touches the network or mutates the settings snapshot.

use replybot_core::{
    error::ReplybotError,
    layouts::FlexLayout,
    message::ReplyMessage,
    settings::{KeywordRule, ReplyKind, ResponseData, Settings, MAX_REPLY_MESSAGES},
    template::{self, TemplateDocument},
};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::warn;

/// Outcome of matching one inbound text against the rule table.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A rule matched; these messages are the reply.
    Reply {
        rule_index: usize,
        messages: Vec<ReplyMessage>,
    },
    /// No rule matched; the completion path answers.
    Fallback,
}

/// Index and rule of the first rule whose triggers occur in the text.
pub fn first_match<'a>(settings: &'a Settings, text_lower: &str) -> Option<(usize, &'a KeywordRule)> {
    settings
        .keywords
        .iter()
        .enumerate()
        .find(|(_, rule)| rule.matches(text_lower))
}

/// Decide how to answer `text_lower` (already lower-cased).
pub fn select(
    settings: &Settings,
    text_lower: &str,
    default_alt_text: &str,
) -> Result<Selection, ReplybotError> {
    let Some((rule_index, rule)) = first_match(settings, text_lower) else {
        return Ok(Selection::Fallback);
    };
    let messages = render_rule(settings, rule_index, &rule.reply, default_alt_text)?;
    Ok(Selection::Reply {
        rule_index,
        messages,
    })
}

fn render_rule(
    settings: &Settings,
    index: usize,
    reply: &ReplyKind,
    default_alt_text: &str,
) -> Result<Vec<ReplyMessage>, ReplybotError> {
    match reply {
        ReplyKind::Text { text } => Ok(vec![ReplyMessage::text(text.as_str())]),
        ReplyKind::Image { images } => Ok(images
            .iter()
            .take(MAX_REPLY_MESSAGES)
            .map(|url| ReplyMessage::image(url.as_str()))
            .collect()),
        ReplyKind::Flex {
            layout,
            text,
            images,
        } => Ok(vec![flex_message(*layout, text, images, default_alt_text)]),
        ReplyKind::Template {
            template,
            responses,
            alt_text,
            required,
        } => {
            let document = settings.flex_templates.get(template).ok_or_else(|| {
                ReplybotError::Template(format!("rule #{index}: unknown template '{template}'"))
            })?;
            let message = template_message(
                index,
                document,
                responses,
                required,
                alt_text.as_deref(),
                default_alt_text,
            )?;
            Ok(vec![message])
        }
    }
}

fn flex_message(
    layout: FlexLayout,
    text: &str,
    images: &[String],
    default_alt_text: &str,
) -> ReplyMessage {
    let alt = if text.trim().is_empty() {
        default_alt_text
    } else {
        text
    };
    ReplyMessage::flex(alt, layout.bubble(text, images))
}

/// Fill `document` once per usable entry: one entry gives a bubble, more
/// give a carousel.
///
/// An entry is unusable when it lacks a `required` field, or, with no
/// `required` list, when it fills none of the template's placeholders.
fn template_message(
    index: usize,
    document: &TemplateDocument,
    responses: &[ResponseData],
    required: &[String],
    alt_text: Option<&str>,
    default_alt_text: &str,
) -> Result<ReplyMessage, ReplybotError> {
    let names = template::placeholders(document);
    let usable: Vec<&ResponseData> = responses
        .iter()
        .enumerate()
        .filter_map(|(n, entry)| {
            let missing = entry.missing(required);
            if !missing.is_empty() {
                warn!("rule #{index}: skipping response #{n}, missing {missing:?}");
                return None;
            }
            if required.is_empty() && !names.is_empty() && !fills_any(entry, &names) {
                warn!("rule #{index}: skipping response #{n}, it fills none of {names:?}");
                return None;
            }
            Some(entry)
        })
        .collect();

    let Some(first) = usable.first() else {
        return Err(ReplybotError::Template(format!(
            "rule #{index}: no response entry has the required fields"
        )));
    };

    let alt = alt_text
        .filter(|a| !a.trim().is_empty())
        .or_else(|| card_label(first))
        .unwrap_or(default_alt_text);

    let mut cards: Vec<Value> = usable
        .iter()
        .map(|entry| template::render(document, &entry.data))
        .collect();

    let contents = if cards.len() == 1 {
        cards.remove(0)
    } else {
        json!({"type": "carousel", "contents": cards})
    };
    Ok(ReplyMessage::flex(alt, contents))
}

fn fills_any(entry: &ResponseData, names: &BTreeSet<String>) -> bool {
    names.iter().any(|name| {
        entry
            .data
            .get(name)
            .is_some_and(|v| !v.trim().is_empty())
    })
}

fn card_label(entry: &ResponseData) -> Option<&str> {
    ["title", "text"]
        .iter()
        .filter_map(|key| entry.data.get(*key))
        .map(String::as_str)
        .find(|v| !v.trim().is_empty())
}
