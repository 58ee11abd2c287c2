use axum::{Json, Router, extract::State, http::StatusCode, routing::post};

use crate::{commands, dto::webhook::MessageEvent, state::BotContext};

/// Accept one inbound message event from the bridge and process it in its
/// own task, so slow commands never block webhook delivery.
pub async fn receive_message(
    State(context): State<BotContext>,
    Json(event): Json<MessageEvent>,
) -> StatusCode {
    tokio::spawn(commands::handle_event(context, event));
    StatusCode::ACCEPTED
}

/// Configure the webhook routes subtree.
pub fn router() -> Router<BotContext> {
    Router::<BotContext>::new().route("/webhook/message", post(receive_message))
}
