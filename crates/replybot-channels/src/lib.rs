//! # replybot-channels
//!
//! Messaging platform integrations for replybot.

pub mod line;
