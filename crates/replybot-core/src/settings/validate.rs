use super::{ReplyKind, Settings, SettingsError, MAX_CAROUSEL_CARDS, MAX_REPLY_MESSAGES};

/// Reject rule tables that would match ambiguously or fail at reply time.
pub(super) fn validate(settings: &Settings) -> Result<(), SettingsError> {
    for (index, rule) in settings.keywords.iter().enumerate() {
        if rule.keywords.is_empty() {
            return Err(SettingsError::EmptyTriggers { index });
        }
        if rule.keywords.iter().any(|kw| kw.trim().is_empty()) {
            return Err(SettingsError::EmptyTrigger { index });
        }

        match &rule.reply {
            ReplyKind::Image { images } => {
                if images.is_empty() || images.len() > MAX_REPLY_MESSAGES {
                    return Err(SettingsError::ImageCount {
                        index,
                        count: images.len(),
                    });
                }
            }
            ReplyKind::Template {
                template,
                responses,
                ..
            } => {
                if !settings.flex_templates.contains_key(template) {
                    return Err(SettingsError::UnknownTemplate {
                        index,
                        name: template.clone(),
                    });
                }
                if responses.is_empty() || responses.len() > MAX_CAROUSEL_CARDS {
                    return Err(SettingsError::ResponseCount {
                        index,
                        count: responses.len(),
                    });
                }
            }
            ReplyKind::Text { .. } | ReplyKind::Flex { .. } => {}
        }
    }
    Ok(())
}
