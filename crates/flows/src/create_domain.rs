//! Create-domain flow.
//!
//! `start → awaiting_handle → done`. The handle can arrive inline with the
//! command or as a continuation answer; both paths validate, check for a
//! taken handle, and create the domain with the invoking user as admin.

use courier_common::{Result, is_valid_handle};

use crate::{context::ChatContext, dispatch::Dispatcher, event::InboundMessage};

const HANDLE_PROMPT: &str = "I need an handle for your domain, a text with only lowercase \
                             letters or digits, for example \"pluto42\". Type /cancel if you \
                             changed your mind. What's it going to be?";

impl Dispatcher {
    pub(crate) async fn create_domain_entry(
        &self,
        msg: &InboundMessage,
        handle: Option<&str>,
    ) -> Result<()> {
        match handle {
            Some(handle) => self.create_domain_submit(msg, handle).await,
            None => {
                self.save_context(msg.chat_id, &ChatContext::CreateDomain)
                    .await?;
                self.transport
                    .send_message(msg.chat_id, HANDLE_PROMPT)
                    .await?;
                Ok(())
            },
        }
    }

    pub(crate) async fn create_domain_submit(
        &self,
        msg: &InboundMessage,
        handle: &str,
    ) -> Result<()> {
        let Some(admin) = &msg.sender else {
            self.transport
                .send_message(
                    msg.chat_id,
                    "I can't create a domain from a channel. Please text me in private.",
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

        // Single conditional insert; no check-then-write window.
        if !self.domains.create(handle, admin).await? {
            self.transport
                .send_message(
                    msg.chat_id,
                    "Domain already exists. Please retry with a different handle.",
                )
                .await?;
            return Ok(());
        }

        self.contexts.reset(msg.chat_id).await?;
        self.transport
            .send_message(
                msg.chat_id,
                &format!("Domain '{handle}' successfully created!"),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        courier_common::UserIdentity,
        rstest::rstest,
    };

    use crate::test_support::{Harness, channel_msg, private_msg, user};

    #[tokio::test]
    async fn entry_without_handle_prompts_and_sets_context() {
        let h = Harness::new().await;

        h.dispatcher
            .dispatch_message(&private_msg(1, &user(1, "Alice"), "/create"))
            .await
            .unwrap();

        assert!(h.transport.texts_to(1)[0].contains("handle for your domain"));
        assert_eq!(
            h.dispatcher.contexts.get(1).await.unwrap().as_deref(),
            Some(r#"{"flow":"create_domain"}"#)
        );
    }

    #[tokio::test]
    async fn inline_handle_creates_domain_immediately() {
        let h = Harness::new().await;
        let alice = user(1, "Alice");

        h.dispatcher
            .dispatch_message(&private_msg(1, &alice, "/create pluto42"))
            .await
            .unwrap();

        let domain = h.dispatcher.domains.get("pluto42").await.unwrap().unwrap();
        assert_eq!(domain.admin.id, 1);
        assert!(
            h.transport.texts_to(1)[0].contains("successfully created"),
            "got: {:?}",
            h.transport.texts_to(1)
        );
        assert!(h.dispatcher.contexts.get(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn continuation_answer_creates_and_clears_context() {
        let h = Harness::new().await;
        let alice = user(1, "Alice");

        h.dispatcher
            .dispatch_message(&private_msg(1, &alice, "/create"))
            .await
            .unwrap();
        h.dispatcher
            .dispatch_message(&private_msg(1, &alice, "pluto42"))
            .await
            .unwrap();

        assert!(h.dispatcher.domains.get("pluto42").await.unwrap().is_some());
        assert!(h.dispatcher.contexts.get(1).await.unwrap().is_none());
    }

    #[rstest]
    #[case("Pluto42")]
    #[case("pluto 42")]
    #[case("pluto-42")]
    #[case("")]
    #[tokio::test]
    async fn invalid_handle_reprompts_and_keeps_context(#[case] bad: &str) {
        let h = Harness::new().await;
        let alice = user(1, "Alice");

        h.dispatcher
            .dispatch_message(&private_msg(1, &alice, "/create"))
            .await
            .unwrap();
        h.dispatcher
            .dispatch_message(&private_msg(1, &alice, bad))
            .await
            .unwrap();

        assert!(
            h.transport
                .texts_to(1)
                .last()
                .unwrap()
                .contains("Invalid domain handle")
        );
        // Still awaiting a handle at the same step.
        assert_eq!(
            h.dispatcher.contexts.get(1).await.unwrap().as_deref(),
            Some(r#"{"flow":"create_domain"}"#)
        );
    }

    #[tokio::test]
    async fn duplicate_handle_reprompts_and_leaves_record_unchanged() {
        let h = Harness::new().await;
        let alice = user(1, "Alice");
        h.dispatcher
            .domains
            .create("pluto42", &user(99, "Ada"))
            .await
            .unwrap();

        h.dispatcher
            .dispatch_message(&private_msg(1, &alice, "/create"))
            .await
            .unwrap();
        h.dispatcher
            .dispatch_message(&private_msg(1, &alice, "pluto42"))
            .await
            .unwrap();

        assert!(
            h.transport
                .texts_to(1)
                .last()
                .unwrap()
                .contains("already exists")
        );
        let domain = h.dispatcher.domains.get("pluto42").await.unwrap().unwrap();
        assert_eq!(domain.admin.id, 99);
        assert!(h.dispatcher.contexts.get(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn channel_origin_is_rejected() {
        let h = Harness::new().await;

        h.dispatcher
            .dispatch_message(&channel_msg(-500, "/create pluto42"))
            .await
            .unwrap();

        assert!(
            h.transport
                .texts_to(-500)
                .last()
                .unwrap()
                .contains("can't create a domain from a channel")
        );
        assert!(h.dispatcher.domains.get("pluto42").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn admin_identity_is_the_invoking_user() {
        let h = Harness::new().await;
        let ada = UserIdentity {
            id: 99,
            first_name: "Ada".into(),
            last_name: Some("Lovelace".into()),
            username: Some("ada".into()),
        };

        h.dispatcher
            .dispatch_message(&private_msg(99, &ada, "/create mars"))
            .await
            .unwrap();

        let domain = h.dispatcher.domains.get("mars").await.unwrap().unwrap();
        assert_eq!(domain.admin, ada);
    }
}
