//! Event dispatcher.
//!
//! Commands route straight to their handler's entrypoint, bypassing any
//! stored context. Free text continues the chat's pending flow if one
//! exists, otherwise becomes a relay candidate. Action payloads are
//! stateless and dispatch on their verb alone.

use std::sync::Arc;

use tracing::{debug, warn};

use {
    courier_common::Result,
    courier_directory::{ContextStore, DomainStore, GroupStore},
};

use crate::{
    context::{ChatContext, CreateGroupStep},
    event::{Action, Command, InboundAction, InboundMessage, parse_command},
    transport::Transport,
};

const START_TEXT: &str = "Hello! Send me a private message and I will relay it to a group chat \
                          you have access to. Type /help to see the commands.";

const HELP_TEXT: &str = "Here is what I can do:\n\
                         /create — create a domain you administer\n\
                         /group — turn this chat into a relay group for one of your domains\n\
                         /join — ask to join a domain\n\
                         /cancel — abandon whatever we were doing\n\n\
                         Anything else you send me in private becomes a message to relay.";

/// Routes every inbound event to the owning flow handler.
pub struct Dispatcher {
    pub(crate) contexts: ContextStore,
    pub(crate) domains: DomainStore,
    pub(crate) groups: GroupStore,
    pub(crate) transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(
        contexts: ContextStore,
        domains: DomainStore,
        groups: GroupStore,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            contexts,
            domains,
            groups,
            transport,
        }
    }

    /// Handle one inbound message.
    pub async fn dispatch_message(&self, msg: &InboundMessage) -> Result<()> {
        if let Some(command) = msg.text.as_deref().and_then(parse_command) {
            debug!(chat_id = msg.chat_id, ?command, "dispatching command");
            return match command {
                Command::Start => {
                    self.transport.send_message(msg.chat_id, START_TEXT).await?;
                    Ok(())
                },
                Command::Help => {
                    self.transport.send_message(msg.chat_id, HELP_TEXT).await?;
                    Ok(())
                },
                Command::Cancel => self.cancel(msg).await,
                Command::Create(handle) => self.create_domain_entry(msg, handle.as_deref()).await,
                Command::Group => self.create_group_entry(msg).await,
                Command::Join(handle) => self.join_domain_entry(msg, handle.as_deref()).await,
            };
        }

        let Some(raw) = self.contexts.get(msg.chat_id).await? else {
            return self.offer_relay(msg).await;
        };
        match serde_json::from_str::<ChatContext>(&raw) {
            Ok(context) => self.continue_flow(context, msg).await,
            Err(error) => {
                // A stored tag no handler recognizes is an internal bug.
                // Keep the row so the inconsistency stays visible instead of
                // silently self-healing.
                warn!(chat_id = msg.chat_id, %error, raw, "unrecognized stored context");
                self.transport
                    .send_message(
                        msg.chat_id,
                        "Sorry, I did not understand that. Type /help to see what I can do.",
                    )
                    .await?;
                Ok(())
            },
        }
    }

    /// Handle one inline-choice selection.
    pub async fn dispatch_action(&self, action: &InboundAction) -> Result<()> {
        match Action::parse(&action.data)? {
            Some(Action::Approve { user_id, handle }) => {
                self.approve(action, user_id, &handle).await
            },
            Some(Action::Deny { user_id, handle }) => self.deny(action, user_id, &handle).await,
            Some(Action::Relay {
                message_id,
                from_chat,
                to_chat,
            }) => self.relay(action, message_id, from_chat, to_chat).await,
            None => {
                debug!(data = action.data, "ignoring unknown action payload");
                Ok(())
            },
        }
    }

    async fn continue_flow(&self, context: ChatContext, msg: &InboundMessage) -> Result<()> {
        let answer = msg.text.as_deref().unwrap_or("");
        match context {
            ChatContext::CreateDomain => self.create_domain_submit(msg, answer).await,
            ChatContext::CreateGroup { step } => match step {
                CreateGroupStep::AwaitingDomainChoice => {
                    self.create_group_choose_domain(msg, answer).await
                },
                CreateGroupStep::AwaitingGroupHandle { domain } => {
                    self.create_group_submit_handle(msg, &domain, answer).await
                },
            },
            ChatContext::JoinDomain => self.join_domain_submit(msg, answer).await,
        }
    }

    async fn cancel(&self, msg: &InboundMessage) -> Result<()> {
        self.contexts.reset(msg.chat_id).await?;
        self.transport
            .send_message(
                msg.chat_id,
                "Okay, I dropped what we were doing. Type /help to see the commands.",
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn save_context(&self, chat_id: i64, context: &ChatContext) -> Result<()> {
        self.contexts
            .set(chat_id, &serde_json::to_string(context)?)
            .await
    }
}
