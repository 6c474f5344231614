//! Tests for the LINE channel module.

use super::send::reply_body;
use super::signature::{sign, verify};
use super::types::*;
use super::LineChannel;
use replybot_core::config::LineConfig;
use replybot_core::message::ReplyMessage;
use replybot_core::traits::Channel;

const BODY: &[u8] = br#"{"destination":"U123","events":[]}"#;
const BODY_SIGNATURE: &str = "2aUANWxC8gZBRUAdqfc7Xya5IgJ2mim/rjSWKhyi9Gk=";

#[test]
fn test_sign_matches_known_vector() {
    assert_eq!(sign("channel-secret", BODY), BODY_SIGNATURE);
}

#[test]
fn test_verify_accepts_valid_signature() {
    assert!(verify("channel-secret", BODY, BODY_SIGNATURE));
}

#[test]
fn test_verify_rejects_tampering_and_bad_input() {
    assert!(!verify("other-secret", BODY, BODY_SIGNATURE));
    assert!(!verify("channel-secret", b"{\"events\":[]}", BODY_SIGNATURE));
    assert!(!verify("channel-secret", BODY, ""));
    assert!(!verify("channel-secret", BODY, "not base64 !!"));
    assert!(!verify("", BODY, &sign("", BODY)));
}

#[test]
fn test_channel_verify_uses_configured_secret() {
    let ch = LineChannel::new(LineConfig {
        channel_secret: "channel-secret".into(),
        ..Default::default()
    });
    assert_eq!(ch.name(), "line");
    assert!(ch.verify_signature(BODY, BODY_SIGNATURE));
    assert_eq!(
        ch.endpoint("v2/bot/message/reply"),
        "https://api.line.me/v2/bot/message/reply"
    );
}

#[test]
fn test_parse_text_message_event() {
    let body = r#"{
        "destination": "U0",
        "events": [{
            "type": "message",
            "replyToken": "rt-1",
            "timestamp": 1700000000000,
            "source": {"type": "user", "userId": "U42"},
            "message": {"type": "text", "id": "1", "text": "มีโปรอะไรบ้าง"}
        }]
    }"#;
    let payload = WebhookPayload::parse(body.as_bytes()).unwrap();
    assert_eq!(payload.events.len(), 1);
    let msg = payload.events[0].to_incoming().unwrap();
    assert_eq!(msg.text, "มีโปรอะไรบ้าง");
    assert_eq!(msg.reply_target, "rt-1");
    assert_eq!(msg.sender_id.as_deref(), Some("U42"));
}

#[test]
fn test_non_text_events_are_not_incoming() {
    let body = r#"{"events": [
        {"type": "follow", "replyToken": "rt"},
        {"type": "message", "replyToken": "rt", "message": {"type": "sticker", "id": "2"}},
        {"type": "message", "message": {"type": "text", "text": "no token"}},
        {"type": "unfollow"}
    ]}"#;
    let payload = WebhookPayload::parse(body.as_bytes()).unwrap();
    assert!(payload.events.iter().all(|e| e.to_incoming().is_none()));
}

#[test]
fn test_payload_without_events_is_rejected() {
    assert!(WebhookPayload::parse(br#"{"destination": "U0"}"#).is_err());
    assert!(WebhookPayload::parse(b"not json").is_err());
}

#[test]
fn test_reply_body_shape_and_cap() {
    let messages: Vec<ReplyMessage> = (0..7)
        .map(|i| ReplyMessage::image(format!("https://x/{i}.jpg")))
        .collect();
    let body = reply_body("rt-9", &messages);
    assert_eq!(body["replyToken"], "rt-9");
    let sent = body["messages"].as_array().unwrap();
    assert_eq!(sent.len(), 5);
    assert_eq!(sent[0]["type"], "image");
    assert_eq!(sent[0]["originalContentUrl"], "https://x/0.jpg");
}
