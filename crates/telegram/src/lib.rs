//! Telegram integration for courier.
//!
//! Implements the flow core's `Transport` capability on top of the teloxide
//! Bot API client and runs a manual long-polling loop that feeds updates
//! into the dispatcher.

pub mod bot;
pub mod config;
pub mod event;
pub mod transport;

pub use {
    bot::{build_bot, start_polling},
    config::TelegramConfig,
    transport::TelegramTransport,
};
