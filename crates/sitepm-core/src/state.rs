//! UI-agnostic conversation state types
//!
//! These are shared between the session lifecycle, the transport clients, and
//! whatever front end displays the conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::render::RenderableMessage;

/// A chat message in the AI conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// Who a displayed message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

/// One displayed message, kept for local redisplay only
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub sender: Sender,
    pub message: RenderableMessage,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(sender: Sender, message: RenderableMessage) -> Self {
        Self {
            sender,
            message,
            timestamp: Utc::now(),
        }
    }
}

/// Trailing `limit` messages of a history slice.
pub fn context_window(history: &[ChatMessage], limit: usize) -> &[ChatMessage] {
    let start = history.len().saturating_sub(limit);
    &history[start..]
}
