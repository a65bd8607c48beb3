use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use courier_flows::Dispatcher;

use crate::{config::TelegramConfig, event};

/// Build the Bot API client.
///
/// The HTTP timeout must outlast the long-polling timeout (30s) so the
/// client does not abort the request before Telegram responds.
pub fn build_bot(config: &TelegramConfig) -> anyhow::Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(std::time::Duration::from_secs(45))
        .build()?;
    Ok(Bot::with_client(
        config.token.expose_secret(),
        client,
    ))
}

/// Start the polling loop.
///
/// Spawns a background task that pulls updates and hands each one to the
/// dispatcher as an independent task, until the returned token is
/// cancelled. A polling conflict (another instance running with the same
/// token) cancels the token and stops the loop.
pub async fn start_polling(
    bot: Bot,
    dispatcher: Arc<Dispatcher>,
) -> anyhow::Result<CancellationToken> {
    // Verify credentials and get the bot username.
    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    // Register slash commands for autocomplete in Telegram clients.
    let commands = vec![
        BotCommand::new("start", "Show the welcome message"),
        BotCommand::new("create", "Create a domain you administer"),
        BotCommand::new("group", "Turn this chat into a relay group"),
        BotCommand::new("join", "Ask to join a domain"),
        BotCommand::new("cancel", "Abandon the current flow"),
        BotCommand::new("help", "Show available commands"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username = ?bot_username, "telegram bot connected (webhook cleared)");

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        info!("starting telegram manual polling loop");
        let mut offset: i32 = 0;

        loop {
            if cancel_clone.is_cancelled() {
                info!("telegram polling stopped");
                break;
            }

            let result = bot
                .get_updates()
                .offset(offset)
                .timeout(30)
                .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
                .await;

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                debug!(chat_id = msg.chat.id.0, "received telegram message");
                                let inbound = event::map_message(&msg);
                                let dispatcher = Arc::clone(&dispatcher);
                                tokio::spawn(async move {
                                    if let Err(e) = dispatcher.dispatch_message(&inbound).await {
                                        error!(
                                            chat_id = inbound.chat_id,
                                            error = %e,
                                            "error handling telegram message"
                                        );
                                    }
                                });
                            },
                            UpdateKind::CallbackQuery(query) => {
                                debug!(
                                    callback_data = ?query.data,
                                    "received telegram callback query"
                                );
                                // Answer first to dismiss the client's
                                // loading spinner, whatever the outcome.
                                let _ = bot.answer_callback_query(&query.id).await;
                                let Some(action) = event::map_callback(&query) else {
                                    continue;
                                };
                                let dispatcher = Arc::clone(&dispatcher);
                                tokio::spawn(async move {
                                    if let Err(e) = dispatcher.dispatch_action(&action).await {
                                        error!(
                                            chat_id = action.chat_id,
                                            error = %e,
                                            "error handling telegram callback query"
                                        );
                                    }
                                });
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    // Another instance is polling with the same token.
                    let is_conflict =
                        matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates));
                    if is_conflict {
                        warn!(
                            "telegram bot disabled: another instance is already running with \
                             this token"
                        );
                        cancel_clone.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                },
            }
        }
    });

    Ok(cancel)
}
