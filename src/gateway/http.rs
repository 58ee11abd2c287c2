//! REST client for the messaging bridge (send text/reaction, list group
//! members).

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method};
use serde::Serialize;

use super::{GatewayError, GatewayResult, GroupMember, MessagingGateway};
use crate::config::AppConfig;

/// Gateway implementation speaking the bridge's REST API over HTTP.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

#[derive(Serialize)]
struct SendTextBody<'a> {
    chat_id: &'a str,
    text: &'a str,
    mentions: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Serialize)]
struct SendReactionBody<'a> {
    chat_id: &'a str,
    message_id: &'a str,
    emoji: &'a str,
}

impl HttpGateway {
    /// Build a gateway client from the application configuration.
    pub fn new(config: &AppConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| GatewayError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::from(config.gateway_base_url.trim_end_matches('/')),
            token: config.gateway_token.as_deref().map(Arc::from),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token.as_ref()),
            None => builder,
        }
    }

    async fn post_json<T: Serialize>(&self, path: String, body: &T) -> GatewayResult<()> {
        let response = self
            .request(Method::POST, &path)
            .json(body)
            .send()
            .await
            .map_err(|source| GatewayError::RequestSend {
                endpoint: path.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::RequestStatus {
                endpoint: path,
                status,
            });
        }
        Ok(())
    }
}

impl MessagingGateway for HttpGateway {
    fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        mentions: &[String],
        reply_to: Option<&str>,
    ) -> BoxFuture<'static, GatewayResult<()>> {
        let gateway = self.clone();
        let chat_id = chat_id.to_owned();
        let text = text.to_owned();
        let mentions = mentions.to_vec();
        let reply_to = reply_to.map(str::to_owned);
        Box::pin(async move {
            let body = SendTextBody {
                chat_id: &chat_id,
                text: &text,
                mentions: &mentions,
                reply_to: reply_to.as_deref(),
            };
            gateway.post_json("messages/text".to_owned(), &body).await
        })
    }

    fn send_reaction(
        &self,
        chat_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> BoxFuture<'static, GatewayResult<()>> {
        let gateway = self.clone();
        let chat_id = chat_id.to_owned();
        let message_id = message_id.to_owned();
        let emoji = emoji.to_owned();
        Box::pin(async move {
            let body = SendReactionBody {
                chat_id: &chat_id,
                message_id: &message_id,
                emoji: &emoji,
            };
            gateway
                .post_json("messages/reaction".to_owned(), &body)
                .await
        })
    }

    fn group_members(&self, chat_id: &str) -> BoxFuture<'static, GatewayResult<Vec<GroupMember>>> {
        let gateway = self.clone();
        let path = format!("groups/{chat_id}/participants");
        Box::pin(async move {
            let response = gateway
                .request(Method::GET, &path)
                .send()
                .await
                .map_err(|source| GatewayError::RequestSend {
                    endpoint: path.clone(),
                    source,
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(GatewayError::RequestStatus {
                    endpoint: path,
                    status,
                });
            }

            response
                .json::<Vec<GroupMember>>()
                .await
                .map_err(|source| GatewayError::ResponseDecode {
                    endpoint: path,
                    source,
                })
        })
    }
}
