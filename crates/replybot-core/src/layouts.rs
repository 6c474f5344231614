//! Built-in flex bubble layouts driven by a title and an image list.
//!
//! The first image becomes the hero; the rest are stacked under the title.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Title shown when a rule has no text.
pub const EMPTY_TITLE: &str = "ไม่มีข้อความ";

/// Header banner of the promotion layout.
const PROMOTION_HEADER: &str = "🎉 โปรโมชั่นใหม่!";

/// Fixed bubble designs selectable from a keyword rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlexLayout {
    /// Bold title, medium size.
    #[default]
    Standard,
    /// Large red title, small thumbnails (legacy `flex1`).
    Highlight,
    /// Green promotion header with a 16:9 hero (legacy `flex2`).
    Promotion,
}

impl FlexLayout {
    /// Map a legacy `type` value such as `flex1` onto a layout.
    pub fn from_legacy_type(kind: &str) -> Self {
        match kind {
            "flex1" => Self::Highlight,
            "flex2" => Self::Promotion,
            _ => Self::Standard,
        }
    }

    /// Build the bubble container for this layout.
    pub fn bubble(self, title: &str, images: &[String]) -> Value {
        let title = if title.trim().is_empty() {
            EMPTY_TITLE
        } else {
            title
        };
        let (hero_ratio, thumb_size, thumb_margin) = match self {
            Self::Standard => ("20:13", "sm", "md"),
            Self::Highlight => ("20:13", "xs", "sm"),
            Self::Promotion => ("16:9", "sm", "md"),
        };

        let title_block = match self {
            Self::Standard => json!({
                "type": "text", "text": title, "weight": "bold", "size": "md", "wrap": true
            }),
            Self::Highlight => json!({
                "type": "text", "text": title, "weight": "bold", "size": "lg",
                "color": "#ff5555", "wrap": true
            }),
            Self::Promotion => json!({"type": "text", "text": title, "wrap": true}),
        };

        let mut contents = vec![title_block];
        contents.extend(images.iter().skip(1).map(|url| {
            json!({
                "type": "image", "url": url, "size": thumb_size,
                "aspectMode": "cover", "margin": thumb_margin
            })
        }));

        let mut body = Map::new();
        body.insert("type".into(), json!("box"));
        body.insert("layout".into(), json!("vertical"));
        if self == Self::Promotion {
            body.insert("spacing".into(), json!("md"));
        }
        body.insert("contents".into(), Value::Array(contents));

        let mut bubble = Map::new();
        bubble.insert("type".into(), json!("bubble"));
        if self == Self::Promotion {
            bubble.insert(
                "header".into(),
                json!({
                    "type": "box",
                    "layout": "vertical",
                    "contents": [{
                        "type": "text", "text": PROMOTION_HEADER, "weight": "bold",
                        "size": "lg", "color": "#00b14f"
                    }]
                }),
            );
        }
        if let Some(hero) = images.first() {
            bubble.insert(
                "hero".into(),
                json!({
                    "type": "image", "url": hero, "size": "full",
                    "aspectRatio": hero_ratio, "aspectMode": "cover"
                }),
            );
        }
        bubble.insert("body".into(), Value::Object(body));
        Value::Object(bubble)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://img/{i}.jpg")).collect()
    }

    #[test]
    fn test_legacy_type_mapping() {
        assert_eq!(FlexLayout::from_legacy_type("flex1"), FlexLayout::Highlight);
        assert_eq!(FlexLayout::from_legacy_type("flex2"), FlexLayout::Promotion);
        assert_eq!(FlexLayout::from_legacy_type("flex_game"), FlexLayout::Standard);
    }

    #[test]
    fn test_standard_bubble_hero_and_thumbnails() {
        let b = FlexLayout::Standard.bubble("Hello", &urls(3));
        assert_eq!(b["type"], "bubble");
        assert_eq!(b["hero"]["url"], "https://img/0.jpg");
        assert_eq!(b["hero"]["aspectRatio"], "20:13");
        let contents = b["body"]["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["text"], "Hello");
        assert_eq!(contents[1]["url"], "https://img/1.jpg");
        assert_eq!(contents[2]["size"], "sm");
        assert!(b.get("header").is_none());
    }

    #[test]
    fn test_no_images_omits_hero() {
        let b = FlexLayout::Highlight.bubble("", &[]);
        assert!(b.get("hero").is_none());
        assert_eq!(b["body"]["contents"][0]["text"], EMPTY_TITLE);
        assert_eq!(b["body"]["contents"][0]["color"], "#ff5555");
    }

    #[test]
    fn test_promotion_has_header_and_spacing() {
        let b = FlexLayout::Promotion.bubble("Sale", &urls(1));
        assert_eq!(b["header"]["contents"][0]["text"], PROMOTION_HEADER);
        assert_eq!(b["hero"]["aspectRatio"], "16:9");
        assert_eq!(b["body"]["spacing"], "md");
    }
}
