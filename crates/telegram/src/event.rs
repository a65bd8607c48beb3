//! Mapping from teloxide update payloads to the flow core's event types.

use teloxide::types::{CallbackQuery, Chat, Message, User};

use {
    courier_common::{ChatKind, UserIdentity},
    courier_flows::event::{InboundAction, InboundMessage},
};

pub(crate) fn identity(user: &User) -> UserIdentity {
    UserIdentity {
        id: user.id.0 as i64,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}

fn chat_kind(chat: &Chat) -> ChatKind {
    match chat.kind {
        teloxide::types::ChatKind::Private(_) => ChatKind::Private,
        teloxide::types::ChatKind::Public(ref p) => match p.kind {
            teloxide::types::PublicChatKind::Channel(_) => ChatKind::Channel,
            _ => ChatKind::Group,
        },
    }
}

pub(crate) fn map_message(msg: &Message) -> InboundMessage {
    InboundMessage {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
        chat_kind: chat_kind(&msg.chat),
        chat_title: msg.chat.title().map(ToOwned::to_owned),
        sender: msg.from.as_ref().map(identity),
        text: msg.text().map(ToOwned::to_owned),
    }
}

/// A callback query without data carries no action; `None` means skip it.
/// When Telegram withholds the originating message (too old), the action
/// still dispatches, it just cannot edit the notification afterwards.
pub(crate) fn map_callback(query: &CallbackQuery) -> Option<InboundAction> {
    let data = query.data.clone()?;
    let (chat_id, message_id) = match &query.message {
        Some(message) => (message.chat().id.0, Some(message.id().0)),
        None => (query.from.id.0 as i64, None),
    };
    Some(InboundAction {
        from: identity(&query.from),
        chat_id,
        message_id,
        data,
    })
}
