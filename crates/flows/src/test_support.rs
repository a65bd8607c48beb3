//! In-memory harness for exercising the dispatcher end to end: a real
//! SQLite-backed directory plus a recording mock transport.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicI32, Ordering},
    },
};

use {
    async_trait::async_trait,
    courier_common::{ChatKind, Error, Result, UserIdentity},
    courier_directory::{ContextStore, DomainStore, GroupStore, init_schema},
};

use crate::{
    dispatch::Dispatcher,
    event::InboundMessage,
    transport::{InlineChoice, Transport},
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OutboundCall {
    Message {
        chat_id: i64,
        text: String,
    },
    ChoiceKeyboard {
        chat_id: i64,
        text: String,
        options: Vec<String>,
    },
    InlineChoices {
        chat_id: i64,
        text: String,
        rows: Vec<Vec<InlineChoice>>,
    },
    EditText {
        chat_id: i64,
        message_id: i32,
        text: String,
    },
    EditActionRow {
        chat_id: i64,
        message_id: i32,
        row: Vec<InlineChoice>,
    },
    Forward {
        to_chat: i64,
        from_chat: i64,
        message_id: i32,
    },
}

/// Records every outbound call and answers metadata lookups from a fixture
/// map. Failure injection is per concern, not per call.
#[derive(Default)]
pub(crate) struct MockTransport {
    calls: Mutex<Vec<OutboundCall>>,
    titles: Mutex<HashMap<i64, String>>,
    next_message_id: AtomicI32,
    fail_forwards: AtomicBool,
    fail_edits: AtomicBool,
}

impl MockTransport {
    pub(crate) fn calls(&self) -> Vec<OutboundCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Texts of plain messages sent to a chat, in send order.
    pub(crate) fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                OutboundCall::Message { chat_id: c, text } if c == chat_id => Some(text),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn set_title(&self, chat_id: i64, title: &str) {
        self.titles.lock().unwrap().insert(chat_id, title.into());
    }

    pub(crate) fn fail_forwards(&self) {
        self.fail_forwards.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_edits(&self) {
        self.fail_edits.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: OutboundCall) -> i32 {
        self.calls.lock().unwrap().push(call);
        self.next_message_id.fetch_add(1, Ordering::SeqCst) + 100
    }

    fn simulated(context: &str) -> Error {
        Error::transport(context, std::io::Error::other("simulated failure"))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i32> {
        Ok(self.record(OutboundCall::Message {
            chat_id,
            text: text.into(),
        }))
    }

    async fn send_choice_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        options: &[String],
    ) -> Result<i32> {
        Ok(self.record(OutboundCall::ChoiceKeyboard {
            chat_id,
            text: text.into(),
            options: options.to_vec(),
        }))
    }

    async fn send_inline_choices(
        &self,
        chat_id: i64,
        text: &str,
        rows: &[Vec<InlineChoice>],
    ) -> Result<i32> {
        Ok(self.record(OutboundCall::InlineChoices {
            chat_id,
            text: text.into(),
            rows: rows.to_vec(),
        }))
    }

    async fn edit_message_text(&self, chat_id: i64, message_id: i32, text: &str) -> Result<()> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(Self::simulated("edit_message_text"));
        }
        self.record(OutboundCall::EditText {
            chat_id,
            message_id,
            text: text.into(),
        });
        Ok(())
    }

    async fn edit_action_row(
        &self,
        chat_id: i64,
        message_id: i32,
        row: &[InlineChoice],
    ) -> Result<()> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(Self::simulated("edit_action_row"));
        }
        self.record(OutboundCall::EditActionRow {
            chat_id,
            message_id,
            row: row.to_vec(),
        });
        Ok(())
    }

    async fn forward_message(&self, to_chat: i64, from_chat: i64, message_id: i32) -> Result<()> {
        if self.fail_forwards.load(Ordering::SeqCst) {
            return Err(Self::simulated("forward_message"));
        }
        self.record(OutboundCall::Forward {
            to_chat,
            from_chat,
            message_id,
        });
        Ok(())
    }

    async fn chat_title(&self, chat_id: i64) -> Result<Option<String>> {
        Ok(self.titles.lock().unwrap().get(&chat_id).cloned())
    }
}

pub(crate) struct Harness {
    pub(crate) dispatcher: Dispatcher,
    pub(crate) transport: Arc<MockTransport>,
}

impl Harness {
    pub(crate) async fn new() -> Self {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        init_schema(&pool).await.expect("schema");
        let transport = Arc::new(MockTransport::default());
        let dispatcher = Dispatcher::new(
            ContextStore::new(pool.clone()),
            DomainStore::new(pool.clone()),
            GroupStore::new(pool),
            transport.clone(),
        );
        Self {
            dispatcher,
            transport,
        }
    }
}

pub(crate) fn user(id: i64, name: &str) -> UserIdentity {
    UserIdentity {
        id,
        first_name: name.into(),
        last_name: None,
        username: None,
    }
}

pub(crate) fn private_msg(chat_id: i64, user: &UserIdentity, text: &str) -> InboundMessage {
    InboundMessage {
        chat_id,
        message_id: 10,
        chat_kind: ChatKind::Private,
        chat_title: None,
        sender: Some(user.clone()),
        text: Some(text.into()),
    }
}

pub(crate) fn group_msg(
    chat_id: i64,
    user: &UserIdentity,
    text: &str,
    title: Option<&str>,
) -> InboundMessage {
    InboundMessage {
        chat_id,
        message_id: 10,
        chat_kind: ChatKind::Group,
        chat_title: title.map(Into::into),
        sender: Some(user.clone()),
        text: Some(text.into()),
    }
}

pub(crate) fn channel_msg(chat_id: i64, text: &str) -> InboundMessage {
    InboundMessage {
        chat_id,
        message_id: 10,
        chat_kind: ChatKind::Channel,
        chat_title: None,
        sender: None,
        text: Some(text.into()),
    }
}
