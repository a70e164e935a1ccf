//! Non-command messages: member joins and the IP-query interceptor.

use crate::platform::SendOptions;
use crate::services::{is_ip_query, search::IP_REFUSAL};
use crate::state::Warden;
use tracing::{debug, info, warn};
use warden_proto::Message;

impl Warden {
    pub(super) async fn on_members_joined(&self, message: &Message) {
        let chat_id = message.chat.id;
        let sent = self.welcome.on_join(chat_id, &message.new_chat_members).await;
        debug!(chat_id, joined = message.new_chat_members.len(), sent, "Handled member join");
    }

    /// Plain text is otherwise ignored.
    pub(super) async fn intercept_text(&self, message: &Message, text: &str) {
        if !is_ip_query(text) {
            return;
        }
        let chat_id = message.chat.id;
        info!(chat_id, user_id = message.from.as_ref().map(|u| u.id), "Refused IP query");
        crate::metrics::record_search("refused");

        if let Err(e) = self
            .platform
            .send_message(chat_id, IP_REFUSAL, SendOptions::reply_to(message.message_id))
            .await
        {
            warn!(chat_id, error = %e, "Failed to send reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{harness, replies};
    use super::*;
    use crate::services::context::fixtures::{message, user};

    #[tokio::test]
    async fn test_ip_question_is_refused() {
        let h = harness().await;
        h.warden.handle_message(&message(7, "hey, what's my ip?")).await;
        assert_eq!(replies(&h), vec![IP_REFUSAL]);
    }

    #[tokio::test]
    async fn test_other_text_is_ignored() {
        let h = harness().await;
        h.warden.handle_message(&message(7, "good morning")).await;
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_join_without_welcome_sends_nothing() {
        let h = harness().await;
        let mut join = message(7, "");
        join.text = None;
        join.new_chat_members = vec![user(7, "Neo")];
        h.warden.handle_message(&join).await;
        assert!(h.platform.calls().is_empty());
    }
}
