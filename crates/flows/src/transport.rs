//! Outbound platform capability.
//!
//! The flow core never talks to Telegram directly; it calls this trait. The
//! trait only reports failures; the caller decides per call site whether a
//! failure is fatal (primary action, propagate with `?`) or cosmetic (a
//! notification edit, log and continue). Implementations must not swallow
//! errors themselves.

use {async_trait::async_trait, courier_common::Result};

/// One inline choice: a label shown to the user and the action payload sent
/// back when selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineChoice {
    pub label: String,
    pub data: String,
}

impl InlineChoice {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Send, edit, forward, and metadata operations on the messaging platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a plain text message. Returns the new message's id.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i32>;

    /// Send a message with a one-time choice keyboard; the selection comes
    /// back as ordinary message text.
    async fn send_choice_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        options: &[String],
    ) -> Result<i32>;

    /// Send a message with inline choice rows; selections come back as
    /// actions carrying each choice's payload.
    async fn send_inline_choices(
        &self,
        chat_id: i64,
        text: &str,
        rows: &[Vec<InlineChoice>],
    ) -> Result<i32>;

    /// Replace the text of an existing message.
    async fn edit_message_text(&self, chat_id: i64, message_id: i32, text: &str) -> Result<()>;

    /// Replace a message's inline choice row. An empty row clears it.
    async fn edit_action_row(
        &self,
        chat_id: i64,
        message_id: i32,
        row: &[InlineChoice],
    ) -> Result<()>;

    /// Forward a message to another chat.
    async fn forward_message(&self, to_chat: i64, from_chat: i64, message_id: i32) -> Result<()>;

    /// Resolve a chat's title, when it has one.
    async fn chat_title(&self, chat_id: i64) -> Result<Option<String>>;
}
