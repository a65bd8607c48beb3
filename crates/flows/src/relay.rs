//! Relay router.
//!
//! Free text in a private chat with no pending flow is a relay candidate.
//! Eligibility is derived entirely from domain membership: the sender sees
//! the groups of every domain they belong to, nothing else. A non-member
//! gets no reply at all.
//!
//! Group display names are a read-through cache: resolved from the platform
//! on first use and written back to the directory so later relays skip the
//! metadata call.

use tracing::{debug, info, warn};

use {courier_common::ChatKind, courier_common::Result, courier_directory::GroupRecord};

use crate::{
    dispatch::Dispatcher,
    event::{InboundAction, InboundMessage},
    transport::InlineChoice,
};

impl Dispatcher {
    pub(crate) async fn offer_relay(&self, msg: &InboundMessage) -> Result<()> {
        if msg.chat_kind != ChatKind::Private {
            return Ok(());
        }
        let Some(sender) = &msg.sender else {
            return Ok(());
        };

        let domains = self.domains.member_domains(sender.id).await?;
        if domains.is_empty() {
            debug!(user_id = sender.id, "relay candidate from a non-member, staying silent");
            return Ok(());
        }
        let groups = self.groups.in_domains(&domains).await?;
        if groups.is_empty() {
            debug!(user_id = sender.id, "member has no relay destinations, staying silent");
            return Ok(());
        }

        // The domain suffix only earns its keep when it disambiguates.
        let show_domain = domains.len() > 1;
        let mut rows = Vec::with_capacity(groups.len());
        for group in &groups {
            let name = self.group_display_name(group).await;
            let label = if show_domain {
                format!("{name} ({})", group.domain)
            } else {
                name
            };
            rows.push(vec![InlineChoice::new(
                label,
                format!("/relay {} {} {}", msg.message_id, msg.chat_id, group.chat_id),
            )]);
        }
        self.transport
            .send_inline_choices(
                msg.chat_id,
                "Which group should receive this message? Choose one or type /cancel.",
                &rows,
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn relay(
        &self,
        action: &InboundAction,
        message_id: i32,
        from_chat: i64,
        to_chat: i64,
    ) -> Result<()> {
        // The forward is the primary action. Everything after it is
        // confirmation cosmetics and must not undo or mask it.
        self.transport
            .forward_message(to_chat, from_chat, message_id)
            .await?;
        info!(from_chat, to_chat, message_id, "relayed message");

        let confirmation = match self.groups.by_chat(to_chat).await? {
            Some(group) => {
                let name = self.group_display_name(&group).await;
                format!("Message forwarded to {name} ({}).", group.domain)
            },
            None => "Message forwarded.".to_string(),
        };
        if let Some(prompt_id) = action.message_id {
            if let Err(error) = self
                .transport
                .edit_message_text(action.chat_id, prompt_id, &confirmation)
                .await
            {
                warn!(chat_id = action.chat_id, prompt_id, %error,
                      "failed to edit relay confirmation");
            }
            if let Err(error) = self
                .transport
                .edit_action_row(action.chat_id, prompt_id, &[])
                .await
            {
                warn!(chat_id = action.chat_id, prompt_id, %error,
                      "failed to clear relay choices");
            }
        }
        Ok(())
    }

    /// Display name for a group, resolving and persisting it on first use.
    /// Falls back to the chat id when the platform has no title either.
    async fn group_display_name(&self, group: &GroupRecord) -> String {
        if let Some(name) = &group.name {
            return name.clone();
        }
        match self.transport.chat_title(group.chat_id).await {
            Ok(Some(title)) => {
                if let Err(error) = self.groups.set_name(&group.handle, &title).await {
                    warn!(handle = group.handle, %error, "failed to persist resolved group name");
                }
                title
            },
            Ok(None) => group.chat_id.to_string(),
            Err(error) => {
                warn!(chat_id = group.chat_id, %error, "failed to resolve chat title");
                group.chat_id.to_string()
            },
        }
    }
}
