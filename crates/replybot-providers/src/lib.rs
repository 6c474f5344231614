//! # replybot-providers
//!
//! Language-model completion clients used on the fallback path.

pub mod anthropic;
pub mod openai;
