use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::health::HealthResponse, state::BotContext};

/// Return the current health status of the bot and its storage backend.
pub async fn healthcheck(State(context): State<BotContext>) -> Json<HealthResponse> {
    let storage = match context.state.store().await {
        Ok(store) => match store.health_check().await {
            Ok(()) => "ok",
            Err(_) => "unreachable",
        },
        Err(_) => "degraded",
    };

    Json(HealthResponse {
        status: "ok",
        storage,
    })
}

/// Configure the health routes subtree.
pub fn router() -> Router<BotContext> {
    Router::<BotContext>::new().route("/healthcheck", get(healthcheck))
}
