use serde::Deserialize;

/// Inbound message event delivered by the messaging bridge.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    /// Identifier of the message, used for quoting and reactions.
    pub message_id: String,
    /// Chat the message arrived in.
    pub chat_id: String,
    /// Sender JID.
    pub sender_id: String,
    /// Sender display name, when the bridge knows it.
    #[serde(default)]
    pub sender_name: Option<String>,
    /// Text or caption content; absent for pure media messages.
    #[serde(default)]
    pub text: Option<String>,
    /// Whether the chat is a group.
    #[serde(default)]
    pub from_group: bool,
}
