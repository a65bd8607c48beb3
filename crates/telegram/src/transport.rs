//! `Transport` implementation over the Bot API.
//!
//! Rate-limit responses (RetryAfter) are retried in place a bounded number
//! of times; every other request error surfaces to the caller, which decides
//! whether the operation was fatal or cosmetic. Edits that change nothing
//! (MessageNotModified) are treated as success.

use std::{future::Future, time::Duration};

use {
    async_trait::async_trait,
    teloxide::{
        ApiError, Bot, RequestError,
        prelude::*,
        types::{
            ChatId, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
            MessageId,
        },
    },
    tracing::warn,
};

use {
    courier_common::{Error, Result},
    courier_flows::transport::{InlineChoice, Transport},
};

const RETRY_AFTER_MAX_RETRIES: usize = 3;

/// Bot API backed transport shared by the dispatcher and the polling loop.
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn with_retry<T, F, Fut>(
        &self,
        chat_id: i64,
        operation: &'static str,
        mut request: F,
    ) -> std::result::Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RequestError>>,
    {
        let mut retries = 0usize;
        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err);
                    };
                    if retries >= RETRY_AFTER_MAX_RETRIES {
                        warn!(
                            chat_id,
                            operation,
                            retries,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        return Err(err);
                    }
                    retries += 1;
                    warn!(
                        chat_id,
                        operation,
                        retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

fn is_message_not_modified_error(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::MessageNotModified))
}

fn inline_markup(rows: &[Vec<InlineChoice>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|choice| InlineKeyboardButton::callback(choice.label.clone(), choice.data.clone()))
            .collect::<Vec<_>>()
    }))
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i32> {
        let message = self
            .with_retry(chat_id, "send message", || {
                let req = self.bot.send_message(ChatId(chat_id), text);
                async move { req.await }
            })
            .await
            .map_err(|err| Error::transport("send message", err))?;
        Ok(message.id.0)
    }

    async fn send_choice_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        options: &[String],
    ) -> Result<i32> {
        let message = self
            .with_retry(chat_id, "send choice keyboard", || {
                let keyboard = KeyboardMarkup::new(
                    options
                        .iter()
                        .map(|option| vec![KeyboardButton::new(option.clone())]),
                )
                .one_time_keyboard()
                .resize_keyboard();
                let req = self
                    .bot
                    .send_message(ChatId(chat_id), text)
                    .reply_markup(keyboard);
                async move { req.await }
            })
            .await
            .map_err(|err| Error::transport("send choice keyboard", err))?;
        Ok(message.id.0)
    }

    async fn send_inline_choices(
        &self,
        chat_id: i64,
        text: &str,
        rows: &[Vec<InlineChoice>],
    ) -> Result<i32> {
        let message = self
            .with_retry(chat_id, "send inline choices", || {
                let req = self
                    .bot
                    .send_message(ChatId(chat_id), text)
                    .reply_markup(inline_markup(rows));
                async move { req.await }
            })
            .await
            .map_err(|err| Error::transport("send inline choices", err))?;
        Ok(message.id.0)
    }

    async fn edit_message_text(&self, chat_id: i64, message_id: i32, text: &str) -> Result<()> {
        let result = self
            .with_retry(chat_id, "edit message text", || {
                let req = self
                    .bot
                    .edit_message_text(ChatId(chat_id), MessageId(message_id), text);
                async move { req.await }
            })
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) if is_message_not_modified_error(&err) => Ok(()),
            Err(err) => Err(Error::transport("edit message text", err)),
        }
    }

    async fn edit_action_row(
        &self,
        chat_id: i64,
        message_id: i32,
        row: &[InlineChoice],
    ) -> Result<()> {
        // An empty keyboard clears the buttons without touching the text.
        let result = self
            .with_retry(chat_id, "edit action row", || {
                let keyboard = if row.is_empty() {
                    InlineKeyboardMarkup::default()
                } else {
                    inline_markup(&[row.to_vec()])
                };
                let req = self
                    .bot
                    .edit_message_reply_markup(ChatId(chat_id), MessageId(message_id))
                    .reply_markup(keyboard);
                async move { req.await }
            })
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) if is_message_not_modified_error(&err) => Ok(()),
            Err(err) => Err(Error::transport("edit action row", err)),
        }
    }

    async fn forward_message(&self, to_chat: i64, from_chat: i64, message_id: i32) -> Result<()> {
        self.with_retry(to_chat, "forward message", || {
            let req = self
                .bot
                .forward_message(ChatId(to_chat), ChatId(from_chat), MessageId(message_id));
            async move { req.await }
        })
        .await
        .map_err(|err| Error::transport("forward message", err))?;
        Ok(())
    }

    async fn chat_title(&self, chat_id: i64) -> Result<Option<String>> {
        let chat = self
            .with_retry(chat_id, "get chat", || {
                let req = self.bot.get_chat(ChatId(chat_id));
                async move { req.await }
            })
            .await
            .map_err(|err| Error::transport("get chat", err))?;
        Ok(chat.title().map(ToOwned::to_owned))
    }
}
