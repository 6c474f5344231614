use super::*;
use serde_json::json;

fn promo_template() -> Value {
    json!({
        "type": "bubble",
        "hero": {"type": "image", "url": "{{image}}"},
        "body": {"type": "box", "layout": "vertical",
                 "contents": [{"type": "text", "text": "{{title}}"}]}
    })
}

// ---------------------------------------------------------------------------
// Shape migration
// ---------------------------------------------------------------------------

#[test]
fn test_canonical_document_parses() {
    let raw = json!({
        "prompt": "ตอบเป็นภาษาไทย",
        "keywords": [
            {"keywords": ["Hours"], "type": "text", "text": "9-18"},
            {"keywords": ["menu"], "type": "image", "images": ["https://x/m.jpg"]},
            {"keywords": ["โปร"], "type": "template", "template": "promo",
             "responses": [{"data": {"title": "50% off"}}]}
        ],
        "flex_templates": {"promo": promo_template()}
    });
    let s = Settings::from_value(raw).unwrap();
    assert_eq!(s.prompt, "ตอบเป็นภาษาไทย");
    assert_eq!(s.keywords.len(), 3);
    assert_eq!(s.keywords[0].keywords, vec!["hours"]);
    assert!(matches!(s.keywords[1].reply, ReplyKind::Image { .. }));
    assert!(matches!(s.keywords[2].reply, ReplyKind::Template { .. }));
}

#[test]
fn test_legacy_images_without_type_become_image_rule() {
    let raw = json!({"keywords": [{"keywords": ["cat"], "images": ["https://x/c.jpg"]}]});
    let s = Settings::from_value(raw).unwrap();
    assert_eq!(
        s.keywords[0].reply,
        ReplyKind::Image {
            images: vec!["https://x/c.jpg".into()]
        }
    );
    assert_eq!(s.prompt, DEFAULT_PROMPT);
}

#[test]
fn test_legacy_flex_types_become_builtin_layouts() {
    let raw = json!({"keywords": [
        {"keywords": ["a"], "type": "flex1", "text": "A", "images": ["https://x/1.jpg"]},
        {"keywords": ["b"], "type": "flex2", "text": "B"},
        {"keywords": ["c"], "type": "flex_promo", "images": []}
    ]});
    let s = Settings::from_value(raw).unwrap();
    let layouts: Vec<FlexLayout> = s
        .keywords
        .iter()
        .map(|r| match &r.reply {
            ReplyKind::Flex { layout, .. } => *layout,
            other => panic!("expected flex, got {other:?}"),
        })
        .collect();
    assert_eq!(
        layouts,
        vec![FlexLayout::Highlight, FlexLayout::Promotion, FlexLayout::Standard]
    );
}

#[test]
fn test_legacy_type_naming_template_with_responses() {
    let raw = json!({
        "keywords": [{"keywords": ["โปร"], "type": "promo",
                      "responses": [{"data": {"title": "A", "price": 99}}, {"title": "B"}]}],
        "flex_templates": {"promo": promo_template()}
    });
    let s = Settings::from_value(raw).unwrap();
    match &s.keywords[0].reply {
        ReplyKind::Template {
            template,
            responses,
            ..
        } => {
            assert_eq!(template, "promo");
            assert_eq!(responses.len(), 2);
            assert_eq!(responses[0].data["price"], "99");
            assert_eq!(responses[1].data["title"], "B");
        }
        other => panic!("expected template, got {other:?}"),
    }
}

#[test]
fn test_legacy_type_naming_template_synthesizes_data_from_text_and_images() {
    let raw = json!({
        "keywords": [{"keywords": ["x"], "type": "flex1", "text": "Hello",
                      "images": ["https://x/0.jpg", "https://x/1.jpg"]}],
        "flex_templates": {"flex1": promo_template()}
    });
    let s = Settings::from_value(raw).unwrap();
    match &s.keywords[0].reply {
        ReplyKind::Template {
            responses,
            alt_text,
            ..
        } => {
            let data = &responses[0].data;
            assert_eq!(data["title"], "Hello");
            assert_eq!(data["image"], "https://x/0.jpg");
            assert_eq!(data["image_2"], "https://x/1.jpg");
            assert_eq!(alt_text.as_deref(), Some("Hello"));
        }
        other => panic!("expected template, got {other:?}"),
    }
}

#[test]
fn test_comma_separated_triggers_are_split_and_folded() {
    let raw = json!({"keywords": [{"keywords": "Promo, โปร ,", "text": "hi"}]});
    let s = Settings::from_value(raw).unwrap();
    assert_eq!(s.keywords[0].keywords, vec!["promo", "โปร"]);
}

#[test]
fn test_unknown_type_is_rejected() {
    let raw = json!({"keywords": [{"keywords": ["x"], "type": "video"}]});
    let err = Settings::from_value(raw).unwrap_err();
    assert!(matches!(err, SettingsError::UnknownShape { index: 0, .. }));
}

#[test]
fn test_shapeless_rule_is_rejected() {
    let raw = json!({"keywords": [{"keywords": ["x"]}]});
    assert!(matches!(
        Settings::from_value(raw).unwrap_err(),
        SettingsError::UnknownShape { index: 0, .. }
    ));
}

#[test]
fn test_non_object_document_is_rejected() {
    assert_eq!(
        Settings::from_value(json!([1, 2])).unwrap_err(),
        SettingsError::NotAnObject
    );
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn test_empty_trigger_list_is_rejected() {
    let raw = json!({"keywords": [
        {"keywords": ["ok"], "text": "fine"},
        {"keywords": [], "text": "matches nothing?"}
    ]});
    assert_eq!(
        Settings::from_value(raw).unwrap_err(),
        SettingsError::EmptyTriggers { index: 1 }
    );
}

#[test]
fn test_blank_trigger_is_rejected() {
    let raw = json!({"keywords": [{"keywords": ["ok", "  "], "text": "x"}]});
    assert_eq!(
        Settings::from_value(raw).unwrap_err(),
        SettingsError::EmptyTrigger { index: 0 }
    );
}

#[test]
fn test_unknown_template_reference_is_rejected() {
    let raw = json!({"keywords": [{"keywords": ["x"], "type": "template",
                                   "template": "missing", "responses": [{"data": {}}]}]});
    assert_eq!(
        Settings::from_value(raw).unwrap_err(),
        SettingsError::UnknownTemplate {
            index: 0,
            name: "missing".into()
        }
    );
}

#[test]
fn test_response_and_image_counts_are_bounded() {
    let too_many: Vec<Value> = (0..MAX_CAROUSEL_CARDS + 1)
        .map(|i| json!({"data": {"title": i.to_string()}}))
        .collect();
    let raw = json!({
        "keywords": [{"keywords": ["x"], "type": "template", "template": "promo",
                      "responses": too_many}],
        "flex_templates": {"promo": promo_template()}
    });
    assert!(matches!(
        Settings::from_value(raw).unwrap_err(),
        SettingsError::ResponseCount { index: 0, count } if count == MAX_CAROUSEL_CARDS + 1
    ));

    let raw = json!({"keywords": [{"keywords": ["x"], "type": "image", "images": []}]});
    assert_eq!(
        Settings::from_value(raw).unwrap_err(),
        SettingsError::ImageCount { index: 0, count: 0 }
    );
}

#[test]
fn test_missing_required_fields() {
    let entry = ResponseData {
        data: [("title".to_string(), " ".to_string())].into_iter().collect(),
    };
    let required = vec!["title".to_string(), "image".to_string()];
    assert_eq!(entry.missing(&required), vec!["title", "image"]);
    assert!(entry.missing(&[]).is_empty());
}

#[test]
fn test_rule_matching_is_substring_containment() {
    let rule = KeywordRule {
        keywords: vec!["โปร".into(), "promotion".into()],
        reply: ReplyKind::Text { text: "x".into() },
    };
    assert!(rule.matches("มีโปรอะไรบ้าง"));
    assert!(rule.matches("any promotions today?"));
    assert!(!rule.matches("สวัสดี"));
}

// ---------------------------------------------------------------------------
// Admin merge
// ---------------------------------------------------------------------------

#[test]
fn test_merge_replaces_only_present_fields() {
    let base = Settings::from_value(json!({
        "prompt": "old",
        "keywords": [{"keywords": ["a"], "text": "A"}]
    }))
    .unwrap();

    let merged = base.merged(json!({"prompt": "new"})).unwrap();
    assert_eq!(merged.prompt, "new");
    assert_eq!(merged.keywords, base.keywords);

    let merged = base
        .merged(json!({"prompt": "", "keywords": [{"keywords": ["b"], "images": ["https://x/b.jpg"]}]}))
        .unwrap();
    assert_eq!(merged.prompt, "old");
    assert_eq!(merged.keywords.len(), 1);
    assert_eq!(merged.keywords[0].keywords, vec!["b"]);
}

#[test]
fn test_merge_rejects_invalid_patch() {
    let base = Settings::default();
    let err = base
        .merged(json!({"keywords": [{"keywords": [""], "text": "x"}]}))
        .unwrap_err();
    assert_eq!(err, SettingsError::EmptyTrigger { index: 0 });
}

#[test]
fn test_canonical_serialization_reparses_to_same_settings() {
    let s = Settings::from_value(json!({
        "keywords": [
            {"keywords": ["a"], "type": "flex2", "text": "A"},
            {"keywords": ["b"], "template": "promo", "responses": [{"title": "B"}],
             "required": ["title"]}
        ],
        "flex_templates": {"promo": promo_template()}
    }))
    .unwrap();
    let reparsed = Settings::from_value(serde_json::to_value(&s).unwrap()).unwrap();
    assert_eq!(reparsed, s);
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[test]
fn test_store_open_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::open(dir.path().join("setting.json")).unwrap();
    assert_eq!(*store.snapshot(), Settings::default());
}

#[test]
fn test_store_open_invalid_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("setting.json");
    std::fs::write(&path, r#"{"keywords": [{"keywords": []}]}"#).unwrap();
    assert!(SettingsStore::open(&path).is_err());
}

#[tokio::test]
async fn test_store_save_persists_then_swaps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("setting.json");
    let store = SettingsStore::open(&path).unwrap();
    let before = store.snapshot();

    let saved = store
        .save(json!({"prompt": "ใหม่", "keywords": [{"keywords": ["a"], "text": "A"}]}))
        .await
        .unwrap();

    assert_eq!(saved.prompt, "ใหม่");
    assert_eq!(store.snapshot().keywords.len(), 1);
    // Earlier snapshot is untouched.
    assert_eq!(*before, Settings::default());

    let reopened = SettingsStore::open(&path).unwrap();
    assert_eq!(*reopened.snapshot(), *saved);
}

#[tokio::test]
async fn test_store_save_invalid_keeps_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("setting.json");
    let store = SettingsStore::open(&path).unwrap();

    let err = store
        .save(json!({"keywords": [{"keywords": ["a"], "type": "nope"}]}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unknown type"));
    assert_eq!(*store.snapshot(), Settings::default());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_store_save_write_failure_keeps_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("setting.json");
    let store = SettingsStore::with_settings(&path, Settings::default());

    let result = store.save(json!({"prompt": "changed"})).await;
    assert!(matches!(result, Err(crate::error::ReplybotError::Io(_))));
    assert_eq!(store.snapshot().prompt, DEFAULT_PROMPT);
}
