//! Application-level configuration loaded once at startup and carried in the
//! shared state. Core logic never reads environment variables directly.

use std::{env, time::Duration};

use chrono::FixedOffset;
use tracing::warn;

/// Default command prefix when `BOT_PREFIX` is unset.
const DEFAULT_PREFIX: &str = "!";
/// Default UTC offset (hours) used to interpret admin-entered datetimes.
const DEFAULT_UTC_OFFSET_HOURS: i32 = -3;
/// Default interval between reminder sweeps.
const DEFAULT_REMINDER_TICK_SECS: u64 = 60;
/// Default lookahead window for guess-deadline reminders.
const DEFAULT_REMINDER_LOOKAHEAD_MINUTES: i64 = 10;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Prefix that marks an inbound message as a command.
    pub prefix: String,
    /// JID of the bot account itself, used for the house guess and to keep
    /// the bot out of reminder mentions.
    pub bot_jid: String,
    /// Display name attached to the bot's house guesses.
    pub bot_display_name: String,
    /// JID that bypasses group-admin checks, if configured.
    pub owner_jid: Option<String>,
    /// Base URL of the messaging gateway bridge.
    pub gateway_base_url: String,
    /// Optional bearer token for the gateway bridge.
    pub gateway_token: Option<String>,
    /// MongoDB connection URI.
    pub mongo_uri: String,
    /// MongoDB database name override.
    pub mongo_db: Option<String>,
    /// Fixed UTC offset in which admins enter and read game datetimes.
    pub admin_utc_offset: FixedOffset,
    /// Interval between reminder sweeps.
    pub reminder_tick: Duration,
    /// How far ahead of a guess deadline the reminder sweep looks.
    pub reminder_lookahead: chrono::Duration,
    /// TCP port for the webhook server.
    pub port: u16,
}

impl AppConfig {
    /// Load the configuration from the environment, falling back to defaults
    /// and warning about missing values that degrade functionality.
    pub fn from_env() -> Self {
        let prefix = env::var("BOT_PREFIX")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_PREFIX.into());

        let bot_jid = env::var("BOT_JID").unwrap_or_default();
        if bot_jid.is_empty() {
            warn!("BOT_JID is not set; house guesses and reminder mentions will misbehave");
        }

        let owner_jid = env::var("OWNER_JID").ok().filter(|value| !value.is_empty());
        if owner_jid.is_none() {
            warn!("OWNER_JID is not set; admin commands require group-admin status");
        }

        let offset_hours = env::var("ADMIN_UTC_OFFSET_HOURS")
            .ok()
            .and_then(|value| value.parse::<i32>().ok())
            .unwrap_or(DEFAULT_UTC_OFFSET_HOURS);
        let admin_utc_offset = FixedOffset::east_opt(offset_hours * 3600).unwrap_or_else(|| {
            warn!(offset_hours, "ADMIN_UTC_OFFSET_HOURS out of range; using UTC");
            FixedOffset::east_opt(0).expect("zero offset is always valid")
        });

        let reminder_tick = env::var("REMINDER_TICK_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_REMINDER_TICK_SECS));

        let reminder_lookahead = env::var("REMINDER_LOOKAHEAD_MINUTES")
            .ok()
            .and_then(|value| value.parse::<i64>().ok())
            .map(chrono::Duration::minutes)
            .unwrap_or_else(|| chrono::Duration::minutes(DEFAULT_REMINDER_LOOKAHEAD_MINUTES));

        let port = env::var("PORT")
            .or_else(|_| env::var("SERVER_PORT"))
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        Self {
            prefix,
            bot_jid,
            bot_display_name: env::var("BOT_DISPLAY_NAME").unwrap_or_else(|_| "Pool Bot".into()),
            owner_jid,
            gateway_base_url: env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            gateway_token: env::var("GATEWAY_TOKEN").ok().filter(|value| !value.is_empty()),
            mongo_uri: env::var("MONGO_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".into()),
            mongo_db: env::var("MONGO_DB").ok(),
            admin_utc_offset,
            reminder_tick,
            reminder_lookahead,
            port,
        }
    }
}

#[cfg(test)]
impl AppConfig {
    /// Fixed configuration for unit tests, independent of the environment.
    pub(crate) fn for_tests() -> Self {
        Self {
            prefix: "!".into(),
            bot_jid: "bot@c.us".into(),
            bot_display_name: "Pool Bot".into(),
            owner_jid: Some("owner@c.us".into()),
            gateway_base_url: "http://localhost:3000".into(),
            gateway_token: None,
            mongo_uri: "mongodb://localhost:27017".into(),
            mongo_db: None,
            admin_utc_offset: FixedOffset::west_opt(3 * 3600).expect("valid offset"),
            reminder_tick: Duration::from_secs(60),
            reminder_lookahead: chrono::Duration::minutes(10),
            port: 0,
        }
    }
}
