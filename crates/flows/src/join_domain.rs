//! Join-domain flow and its approve/deny sub-protocol.
//!
//! Joining waitlists the requester and notifies the domain admin with an
//! inline approve/deny choice carrying `(requesterId, domainHandle)`.
//! Approve and deny are stateless: they act on that triple alone, never on
//! chat context, so they stay correct however late the admin taps them.

use tracing::warn;

use courier_common::{Result, is_valid_handle};
use courier_directory::{ApproveOutcome, DenyOutcome, JoinOutcome};

use crate::{
    context::ChatContext,
    dispatch::Dispatcher,
    event::{InboundAction, InboundMessage},
    transport::InlineChoice,
};

impl Dispatcher {
    pub(crate) async fn join_domain_entry(
        &self,
        msg: &InboundMessage,
        handle: Option<&str>,
    ) -> Result<()> {
        if msg.sender.is_none() {
            self.transport
                .send_message(
                    msg.chat_id,
                    "You can't join a domain from a channel. Please text me in private.",
                )
                .await?;
            return Ok(());
        }
        match handle {
            Some(handle) => self.join_domain_submit(msg, handle).await,
            None => {
                self.save_context(msg.chat_id, &ChatContext::JoinDomain)
                    .await?;
                self.transport
                    .send_message(
                        msg.chat_id,
                        "What's the handle of the domain you would like to join?",
                    )
                    .await?;
                Ok(())
            },
        }
    }

    pub(crate) async fn join_domain_submit(
        &self,
        msg: &InboundMessage,
        handle: &str,
    ) -> Result<()> {
        let Some(user) = &msg.sender else {
            self.transport
                .send_message(
                    msg.chat_id,
                    "You can't join a domain from a channel. Please text me in private.",
                )
                .await?;
            return Ok(());
        };

        if !is_valid_handle(handle) {
            self.transport
                .send_message(msg.chat_id, "Invalid domain handle. Please retry.")
                .await?;
            return Ok(());
        }

        match self.domains.request_join(handle, user).await? {
            JoinOutcome::NotFound => {
                self.transport
                    .send_message(
                        msg.chat_id,
                        "Domain not found. Please retry with a different handle.",
                    )
                    .await?;
            },
            JoinOutcome::AlreadyMember => {
                self.transport
                    .send_message(
                        msg.chat_id,
                        &format!("You are already part of the domain {handle}."),
                    )
                    .await?;
            },
            JoinOutcome::Requested { admin } => {
                self.contexts.reset(msg.chat_id).await?;
                // Both sends are the point of the flow; a failure here is a
                // failed join request, not cosmetics.
                self.transport
                    .send_inline_choices(
                        admin.id,
                        &format!(
                            "{} would like to join the domain '{handle}'.",
                            user.descriptor()
                        ),
                        &[vec![
                            InlineChoice::new("Approve", format!("/approve {} {handle}", user.id)),
                            InlineChoice::new("Deny", format!("/deny {} {handle}", user.id)),
                        ]],
                    )
                    .await?;
                self.transport
                    .send_message(
                        msg.chat_id,
                        "A request to join this domain has been sent to the admin.",
                    )
                    .await?;
            },
        }
        Ok(())
    }

    pub(crate) async fn approve(
        &self,
        action: &InboundAction,
        user_id: i64,
        handle: &str,
    ) -> Result<()> {
        match self.domains.approve(handle, action.from.id, user_id).await? {
            ApproveOutcome::NotAdmin => {
                self.transport
                    .send_message(
                        action.from.id,
                        &format!(
                            "Either the domain '{handle}' doesn't exist or you are not an \
                             admin. You can only approve requests for a domain you are an \
                             admin of."
                        ),
                    )
                    .await?;
            },
            ApproveOutcome::AlreadyMember(member) => {
                self.transport
                    .send_message(
                        action.from.id,
                        &format!(
                            "{} has already been approved in the domain '{handle}'.",
                            member.descriptor()
                        ),
                    )
                    .await?;
            },
            ApproveOutcome::NotPending => {
                self.transport
                    .send_message(
                        action.from.id,
                        "The request for this user is no longer valid. Please ask them to \
                         join again.",
                    )
                    .await?;
            },
            ApproveOutcome::Approved(member) => {
                self.transport
                    .send_message(
                        action.from.id,
                        &format!(
                            "{} is now a part of the domain '{handle}'.",
                            member.descriptor()
                        ),
                    )
                    .await?;
                // Swap the stale approve/deny row for a kick action on the
                // same triple. The membership is already committed; a failed
                // edit must not undo or mask it.
                if let Some(message_id) = action.message_id {
                    if let Err(error) = self
                        .transport
                        .edit_action_row(action.chat_id, message_id, &[InlineChoice::new(
                            "Kick",
                            format!("/deny {user_id} {handle}"),
                        )])
                        .await
                    {
                        warn!(chat_id = action.chat_id, message_id, %error,
                              "failed to update approval notification");
                    }
                }
            },
        }
        Ok(())
    }

    pub(crate) async fn deny(
        &self,
        action: &InboundAction,
        user_id: i64,
        handle: &str,
    ) -> Result<()> {
        match self.domains.deny(handle, action.from.id, user_id).await? {
            DenyOutcome::NotAdmin => {
                self.transport
                    .send_message(
                        action.from.id,
                        &format!(
                            "Either the domain '{handle}' doesn't exist or you are not an \
                             admin. You can only approve requests for a domain you are an \
                             admin of."
                        ),
                    )
                    .await?;
            },
            DenyOutcome::Stale => {
                self.transport
                    .send_message(
                        action.from.id,
                        "The request for this user is no longer valid.",
                    )
                    .await?;
            },
            DenyOutcome::Kicked(member) => {
                self.transport
                    .send_message(
                        action.from.id,
                        &format!(
                            "{} has been kicked from the domain '{handle}'.",
                            member.descriptor()
                        ),
                    )
                    .await?;
                self.clear_notification_actions(action).await;
            },
            DenyOutcome::Denied(member) => {
                self.transport
                    .send_message(
                        action.from.id,
                        &format!(
                            "{} has been denied from joining the domain '{handle}'.",
                            member.descriptor()
                        ),
                    )
                    .await?;
                self.clear_notification_actions(action).await;
            },
        }
        Ok(())
    }

    async fn clear_notification_actions(&self, action: &InboundAction) {
        if let Some(message_id) = action.message_id {
            if let Err(error) = self
                .transport
                .edit_action_row(action.chat_id, message_id, &[])
                .await
            {
                warn!(chat_id = action.chat_id, message_id, %error,
                      "failed to clear notification actions");
            }
        }
    }
}
