//! HTTP surface: the bridge webhook and the healthcheck.

use axum::Router;

use crate::state::BotContext;

/// Healthcheck route.
pub mod health;
/// Inbound webhook route.
pub mod webhook;

/// Compose all route trees, wiring in the bot context.
pub fn router(context: BotContext) -> Router<()> {
    health::router().merge(webhook::router()).with_state(context)
}
