//! # replybot-core
//!
//! Core types, traits, configuration, settings, and templating for replybot.

pub mod config;
pub mod context;
pub mod error;
pub mod layouts;
pub mod message;
pub mod settings;
pub mod template;
pub mod traits;
