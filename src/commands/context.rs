//! Per-invocation command context carrying the shared state, the gateway and
//! the inbound message fields.

use std::sync::Arc;

use tracing::warn;

use crate::{config::AppConfig, gateway::MessagingGateway, state::SharedState};

/// Everything a command handler needs about the message that triggered it.
#[derive(Clone)]
pub struct CommandContext {
    /// Shared application state.
    pub state: SharedState,
    /// Messaging bridge handle.
    pub gateway: Arc<dyn MessagingGateway>,
    /// Chat the message arrived in (group JID for group chats).
    pub chat_id: String,
    /// Sender JID.
    pub sender_id: String,
    /// Sender display name, possibly empty.
    pub sender_name: String,
    /// Identifier of the triggering message, used for quoting and reactions.
    pub message_id: String,
    /// Whether the chat is a group.
    pub from_group: bool,
    /// Command arguments (prefix and command name already stripped).
    pub args: Vec<String>,
}

impl CommandContext {
    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        self.state.config()
    }

    /// Reply in the chat, quoting the triggering message. Delivery failures
    /// are logged, not propagated; the command already did its work.
    pub async fn reply(&self, text: &str) {
        if let Err(err) = self
            .gateway
            .send_text(&self.chat_id, text, &[], Some(&self.message_id))
            .await
        {
            warn!(chat_id = %self.chat_id, error = %err, "failed to send reply");
        }
    }

    /// Send a plain message in the chat without quoting.
    pub async fn say(&self, text: &str) {
        if let Err(err) = self.gateway.send_text(&self.chat_id, text, &[], None).await {
            warn!(chat_id = %self.chat_id, error = %err, "failed to send message");
        }
    }

    /// Reply in the chat while mentioning the given users.
    pub async fn reply_mentioning(&self, text: &str, mentions: &[String]) {
        if let Err(err) = self
            .gateway
            .send_text(&self.chat_id, text, mentions, Some(&self.message_id))
            .await
        {
            warn!(chat_id = %self.chat_id, error = %err, "failed to send mention reply");
        }
    }

    /// React to the triggering message with an emoji.
    pub async fn react(&self, emoji: &str) {
        if let Err(err) = self
            .gateway
            .send_reaction(&self.chat_id, &self.message_id, emoji)
            .await
        {
            warn!(chat_id = %self.chat_id, error = %err, "failed to send reaction");
        }
    }
}
