//! Messaging gateway abstraction. The WhatsApp session itself lives in an
//! external bridge process; this trait covers the narrow operations the bot
//! consumes from it.

pub mod http;

use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Result alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures raised while talking to the messaging bridge.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The HTTP client could not be constructed.
    #[error("failed to build gateway HTTP client")]
    ClientBuilder {
        /// Client failure.
        #[source]
        source: reqwest::Error,
    },
    /// The request never reached the bridge.
    #[error("failed to send gateway request to `{endpoint}`")]
    RequestSend {
        /// Endpoint path.
        endpoint: String,
        /// Client failure.
        #[source]
        source: reqwest::Error,
    },
    /// The bridge answered with a non-success status.
    #[error("unexpected gateway response status {status} for `{endpoint}`")]
    RequestStatus {
        /// Endpoint path.
        endpoint: String,
        /// Response status.
        status: StatusCode,
    },
    /// The bridge answered with a body that could not be decoded.
    #[error("failed to decode gateway response from `{endpoint}`")]
    ResponseDecode {
        /// Endpoint path.
        endpoint: String,
        /// Decode failure.
        #[source]
        source: reqwest::Error,
    },
}

/// One member of a group chat as reported by the bridge.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GroupMember {
    /// Member JID.
    pub id: String,
    /// Whether the member is a group admin.
    #[serde(default)]
    pub is_admin: bool,
}

/// Outbound operations the bot performs against the messaging bridge.
pub trait MessagingGateway: Send + Sync {
    /// Send a text message, optionally mentioning users and quoting a
    /// previous message.
    fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        mentions: &[String],
        reply_to: Option<&str>,
    ) -> BoxFuture<'static, GatewayResult<()>>;

    /// React to a message with an emoji.
    fn send_reaction(
        &self,
        chat_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> BoxFuture<'static, GatewayResult<()>>;

    /// Fetch the current member list of a group chat.
    fn group_members(&self, chat_id: &str) -> BoxFuture<'static, GatewayResult<Vec<GroupMember>>>;
}
