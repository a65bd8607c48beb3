//! Create-group flow.
//!
//! Entry narrows by how many domains the requester admins: none (refuse),
//! one (preselect it), several (offer a choice keyboard whose answer is
//! validated against that same admin-owned set). The final step binds the
//! originating chat as the group's relay destination.

use courier_common::{Result, is_valid_handle};

use crate::{
    context::{ChatContext, CreateGroupStep},
    dispatch::Dispatcher,
    event::InboundMessage,
};

impl Dispatcher {
    pub(crate) async fn create_group_entry(&self, msg: &InboundMessage) -> Result<()> {
        let Some(admin) = &msg.sender else {
            self.transport
                .send_message(
                    msg.chat_id,
                    "I can't create a group from a channel. Please text me in private.",
                )
                .await?;
            return Ok(());
        };

        let admined = self.domains.admined_by(admin.id).await?;
        match admined.as_slice() {
            [] => {
                self.transport
                    .send_message(
                        msg.chat_id,
                        "You need to have created a domain first in order to create a group \
                         in it.",
                    )
                    .await?;
                Ok(())
            },
            [only] => {
                self.save_context(msg.chat_id, &ChatContext::CreateGroup {
                    step: CreateGroupStep::AwaitingGroupHandle {
                        domain: only.handle.clone(),
                    },
                })
                .await?;
                self.transport
                    .send_message(
                        msg.chat_id,
                        &format!(
                            "Great! I am creating a group in the domain '{}', please type an \
                             handle for it.",
                            only.handle
                        ),
                    )
                    .await?;
                Ok(())
            },
            many => {
                self.save_context(msg.chat_id, &ChatContext::CreateGroup {
                    step: CreateGroupStep::AwaitingDomainChoice,
                })
                .await?;
                let options: Vec<String> = many.iter().map(|d| d.handle.clone()).collect();
                self.transport
                    .send_choice_keyboard(
                        msg.chat_id,
                        "It looks like you are the admin of several domains. Please choose the \
                         one you wish to create this group in.",
                        &options,
                    )
                    .await?;
                Ok(())
            },
        }
    }

    pub(crate) async fn create_group_choose_domain(
        &self,
        msg: &InboundMessage,
        choice: &str,
    ) -> Result<()> {
        let choice = choice.trim();
        let admined = match &msg.sender {
            Some(user) => self.domains.admined_by(user.id).await?,
            None => Vec::new(),
        };

        if admined.iter().any(|d| d.handle == choice) {
            self.save_context(msg.chat_id, &ChatContext::CreateGroup {
                step: CreateGroupStep::AwaitingGroupHandle {
                    domain: choice.to_string(),
                },
            })
            .await?;
            self.transport
                .send_message(
                    msg.chat_id,
                    &format!(
                        "Great! I am going to create a group in the domain '{choice}', please \
                         type an handle for it."
                    ),
                )
                .await?;
        } else {
            self.transport
                .send_message(
                    msg.chat_id,
                    &format!(
                        "Uhh either the domain '{choice}' doesn't exist or you are not an \
                         admin. Please retry with a domain you are an admin of."
                    ),
                )
                .await?;
        }
        Ok(())
    }

    pub(crate) async fn create_group_submit_handle(
        &self,
        msg: &InboundMessage,
        domain: &str,
        handle: &str,
    ) -> Result<()> {
        if !is_valid_handle(handle) {
            self.transport
                .send_message(msg.chat_id, "Invalid group handle. Please retry.")
                .await?;
            return Ok(());
        }

        let created = self
            .groups
            .create(handle, domain, msg.chat_id, msg.chat_title.as_deref())
            .await?;
        if !created {
            self.transport
                .send_message(
                    msg.chat_id,
                    "A group with that handle already exists. Please retry with a different \
                     handle.",
                )
                .await?;
            return Ok(());
        }

        self.contexts.reset(msg.chat_id).await?;
        self.transport
            .send_message(
                msg.chat_id,
                &format!(
                    "Super! Now members of the domain '{domain}' will be able to send messages \
                     here with the handle '{handle}'."
                ),
            )
            .await?;
        Ok(())
    }
}
