//! Command surface: a static registry built at startup, prefix-based
//! dispatch, and registry-driven help.

/// Per-invocation command context.
pub mod context;
/// Explicit permission guard functions.
pub mod guards;
/// Argument parsing helpers.
pub mod parse;

mod mentions;
mod misc;
mod pool;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tracing::{debug, error, info};

use crate::{dto::webhook::MessageEvent, error::ServiceError, state::BotContext};

pub use context::CommandContext;

/// Result of one command handler invocation; all replies go through the
/// context, so success carries no payload.
pub type CommandResult = Result<(), ServiceError>;

type Handler = fn(CommandContext) -> BoxFuture<'static, CommandResult>;

/// Descriptor of one chat command.
pub struct CommandSpec {
    /// Command name typed after the prefix.
    pub name: &'static str,
    /// Display category used by the help listing.
    pub category: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Usage guide; `{prefix}` is substituted at render time.
    pub usage: &'static str,
    handler: Handler,
}

/// Static registry mapping command names to their descriptors.
pub struct CommandRegistry {
    commands: IndexMap<&'static str, CommandSpec>,
}

impl CommandRegistry {
    /// Build the registry with every command this bot ships.
    pub fn new() -> Self {
        let specs = [
            CommandSpec {
                name: "games",
                category: "Pool",
                description: "List the group's games open for guesses and awaiting a result.",
                usage: "Use {prefix}games to see every open game and its ID.",
                handler: |ctx| Box::pin(pool::games(ctx)),
            },
            CommandSpec {
                name: "guess",
                category: "Pool",
                description: "Register or update your guess for a pool game.",
                usage: pool::GUESS_USAGE,
                handler: |ctx| Box::pin(pool::guess(ctx)),
            },
            CommandSpec {
                name: "myguesses",
                category: "Pool",
                description: "Show your guesses for the group's upcoming games.",
                usage: "Use {prefix}myguesses to review the guesses you registered for games \
                    that have not taken place yet.",
                handler: |ctx| Box::pin(pool::myguesses(ctx)),
            },
            CommandSpec {
                name: "ranking",
                category: "Pool",
                description: "Show the group's full pool ranking.",
                usage: "Use {prefix}ranking to see who leads the pool and everyone's points.",
                handler: |ctx| Box::pin(pool::ranking(ctx)),
            },
            CommandSpec {
                name: "profile",
                category: "Pool",
                description: "Show your pool profile and statistics.",
                usage: "Use {prefix}profile to see your points, position, guess count and hit \
                    rate.",
                handler: |ctx| Box::pin(pool::profile(ctx)),
            },
            CommandSpec {
                name: "addgame",
                category: "Pool Admin",
                description: "ADMIN: Add a new game to the group pool.",
                usage: pool::ADDGAME_USAGE,
                handler: |ctx| Box::pin(pool::addgame(ctx)),
            },
            CommandSpec {
                name: "settle",
                category: "Pool Admin",
                description: "ADMIN: Record a game's final score and settle all guesses.",
                usage: pool::SETTLE_USAGE,
                handler: |ctx| Box::pin(pool::settle(ctx)),
            },
            CommandSpec {
                name: "guesses",
                category: "Pool Admin",
                description: "ADMIN: List every guess for one game with a summary.",
                usage: pool::GUESSES_USAGE,
                handler: |ctx| Box::pin(pool::guesses(ctx)),
            },
            CommandSpec {
                name: "everyone",
                category: "Utilities",
                description: "ADMIN: Mention every group member.",
                usage: "Use {prefix}everyone [message] to mention all members who have not \
                    opted out.",
                handler: |ctx| Box::pin(mentions::everyone(ctx)),
            },
            CommandSpec {
                name: "nomention",
                category: "Utilities",
                description: "Stop being mentioned by call-outs and reminders.",
                usage: "Use {prefix}nomention and the bot will leave you out of mention lists.",
                handler: |ctx| Box::pin(mentions::nomention(ctx)),
            },
            CommandSpec {
                name: "mentionme",
                category: "Utilities",
                description: "Opt back into call-outs and reminders.",
                usage: "Use {prefix}mentionme to be included in mention lists again.",
                handler: |ctx| Box::pin(mentions::mentionme(ctx)),
            },
            CommandSpec {
                name: "ping",
                category: "Utilities",
                description: "Check whether the bot is alive.",
                usage: "Use {prefix}ping and the bot answers with pong.",
                handler: |ctx| Box::pin(misc::ping(ctx)),
            },
        ];

        let mut commands = IndexMap::new();
        for spec in specs {
            commands.insert(spec.name, spec);
        }
        Self { commands }
    }

    /// Look up a command by name.
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    /// Render the general help listing, grouped by category.
    pub fn help_overview(&self, prefix: &str) -> String {
        let mut by_category: IndexMap<&str, Vec<&CommandSpec>> = IndexMap::new();
        for spec in self.commands.values() {
            by_category.entry(spec.category).or_default().push(spec);
        }

        let mut text = String::from("📜 *Available commands:*\n\n");
        text.push_str(&format!(
            "For details about a command, use {prefix}help <command>\n\n"
        ));
        for (category, specs) in &by_category {
            text.push_str(&format!("🔹 *{}*\n", category.to_uppercase()));
            for spec in specs {
                text.push_str(&format!(
                    "  *{prefix}{}* – {}\n",
                    spec.name, spec.description
                ));
            }
            text.push('\n');
        }
        text.trim_end().to_owned()
    }

    /// Render the detailed help for one command, if it exists.
    pub fn help_for(&self, prefix: &str, name: &str) -> Option<String> {
        self.commands
            .get(name)
            .map(|spec| spec.usage.replace("{prefix}", prefix))
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Process one inbound message event: strip the prefix, resolve the command
/// and run it, mapping every failure to a user-facing reply.
pub async fn handle_event(bot: BotContext, event: MessageEvent) {
    let Some(text) = event.text.as_deref() else {
        return;
    };
    let prefix = bot.state.config().prefix.clone();
    let Some(rest) = text.trim().strip_prefix(prefix.as_str()) else {
        return;
    };

    let mut tokens = parse::tokenize(rest);
    if tokens.is_empty() {
        return;
    }
    let name = tokens.remove(0).to_lowercase();

    let ctx = CommandContext {
        state: bot.state.clone(),
        gateway: bot.gateway.clone(),
        chat_id: event.chat_id,
        sender_id: event.sender_id,
        sender_name: event.sender_name.unwrap_or_default(),
        message_id: event.message_id,
        from_group: event.from_group,
        args: tokens,
    };

    if name == "help" {
        handle_help(&bot.registry, &ctx).await;
        return;
    }

    match bot.registry.get(&name) {
        Some(spec) => {
            info!(command = spec.name, chat_id = %ctx.chat_id, "dispatching command");
            if let Err(err) = (spec.handler)(ctx.clone()).await {
                report_failure(&ctx, spec.name, &err).await;
            }
        }
        None => {
            ctx.reply(&format!(
                "❌ Unknown command! Use {prefix}help to see the available commands."
            ))
            .await;
        }
    }
}

async fn handle_help(registry: &CommandRegistry, ctx: &CommandContext) {
    let prefix = &ctx.config().prefix;
    let text = match ctx.args.first() {
        Some(name) => registry
            .help_for(prefix, &name.to_lowercase())
            .unwrap_or_else(|| {
                format!(
                    "❌ Command *{name}* not found. Use {prefix}help for the full list."
                )
            }),
        None => registry.help_overview(prefix),
    };
    ctx.reply(&text).await;
}

async fn report_failure(ctx: &CommandContext, command: &str, err: &ServiceError) {
    match err {
        ServiceError::Unavailable(_) | ServiceError::Degraded | ServiceError::Gateway(_) => {
            error!(
                command,
                chat_id = %ctx.chat_id,
                sender_id = %ctx.sender_id,
                error = %err,
                "command failed on an external dependency"
            );
        }
        _ => {
            debug!(command, chat_id = %ctx.chat_id, error = %err, "command rejected");
        }
    }
    ctx.reply(&failure_reply(err)).await;
}

fn failure_reply(err: &ServiceError) -> String {
    match err {
        ServiceError::Unavailable(_) | ServiceError::Degraded => {
            "⚠️ The pool database is unavailable right now. Please try again in a moment.".into()
        }
        ServiceError::Gateway(_) => {
            "❌ Oops! Something went wrong on our side. Please try again later.".into()
        }
        ServiceError::Unauthorized(message) => message.clone(),
        ServiceError::InvalidInput(message) | ServiceError::NotFound(message) => {
            format!("❌ {message}")
        }
        ServiceError::GameNotOpen(message) => format!("🚫 {message}"),
        ServiceError::DeadlinePassed(message) => format!("⏰ {message}"),
        ServiceError::AlreadySettled(message) => format!("⚠️ {message}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{GameEntity, GameStatus},
            pool_store::{PoolStore, memory::MemoryPoolStore},
        },
        gateway::{GroupMember, testing::RecordingGateway},
        state::AppState,
    };

    const GROUP: &str = "group-1@g.us";

    async fn bot_context() -> (BotContext, RecordingGateway, Arc<MemoryPoolStore>) {
        let state = AppState::new(AppConfig::for_tests());
        let store = Arc::new(MemoryPoolStore::new());
        state.set_store(store.clone()).await;

        let gateway = RecordingGateway::with_members(vec![GroupMember {
            id: "u1@c.us".into(),
            is_admin: false,
        }]);
        let bot = BotContext {
            state,
            gateway: Arc::new(gateway.clone()),
            registry: Arc::new(CommandRegistry::new()),
        };
        (bot, gateway, store)
    }

    fn event(text: &str, from_group: bool) -> MessageEvent {
        MessageEvent {
            message_id: "msg-1".into(),
            chat_id: GROUP.into(),
            sender_id: "u1@c.us".into(),
            sender_name: Some("Alice".into()),
            text: Some(text.into()),
            from_group,
        }
    }

    fn open_game(game_id: i64) -> GameEntity {
        GameEntity {
            game_id,
            group_id: GROUP.into(),
            league: "Serie A".into(),
            home_team: "Atletico".into(),
            away_team: "Cruzeiro".into(),
            kickoff_at: Utc::now() + Duration::hours(3),
            guess_deadline: Utc::now() + Duration::hours(2),
            status: GameStatus::Scheduled,
            home_score: None,
            away_score: None,
            reminder_sent: false,
        }
    }

    #[tokio::test]
    async fn ignores_messages_without_the_prefix() {
        let (bot, gateway, _store) = bot_context().await;
        handle_event(bot, event("hello there", true)).await;
        assert!(gateway.sent_texts().is_empty());
    }

    #[tokio::test]
    async fn unknown_commands_get_a_hint() {
        let (bot, gateway, _store) = bot_context().await;
        handle_event(bot, event("!doesnotexist", true)).await;
        let sent = gateway.sent_texts();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("Unknown command"));
    }

    #[tokio::test]
    async fn ping_answers_pong() {
        let (bot, gateway, _store) = bot_context().await;
        handle_event(bot, event("!ping", true)).await;
        assert_eq!(gateway.sent_texts()[0].text, "🏓 Pong!");
    }

    #[tokio::test]
    async fn group_only_commands_reject_direct_chats() {
        let (bot, gateway, _store) = bot_context().await;
        handle_event(bot, event("!guess 1 2x1", false)).await;
        let sent = gateway.sent_texts();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("only be used in groups"));
    }

    #[tokio::test]
    async fn guess_command_registers_and_confirms() {
        let (bot, gateway, store) = bot_context().await;
        store.insert_game(open_game(1)).await.unwrap();

        handle_event(bot, event("!guess 1 2x1", true)).await;

        let guesses = store.all_guesses();
        assert_eq!(guesses.len(), 1);
        assert_eq!((guesses[0].home_guess, guesses[0].away_guess), (2, 1));
        assert_eq!(guesses[0].display_name, "Alice");

        let reactions = gateway.reactions.lock().unwrap().clone();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].2, "✅");
        assert!(gateway.sent_texts()[0].text.contains("You guessed"));
    }

    #[tokio::test]
    async fn guess_command_rejects_malformed_scoreline() {
        let (bot, gateway, store) = bot_context().await;
        store.insert_game(open_game(1)).await.unwrap();

        handle_event(bot, event("!guess 1 2-1", true)).await;

        assert!(store.all_guesses().is_empty());
        assert!(gateway.sent_texts()[0].text.contains("scoreline"));
    }

    #[tokio::test]
    async fn help_lists_commands_by_category() {
        let (bot, gateway, _store) = bot_context().await;
        handle_event(bot, event("!help", true)).await;
        let text = &gateway.sent_texts()[0].text;
        assert!(text.contains("POOL ADMIN"));
        assert!(text.contains("!addgame"));
        assert!(text.contains("!ranking"));
    }

    #[tokio::test]
    async fn help_for_a_single_command_shows_usage() {
        let (bot, gateway, _store) = bot_context().await;
        handle_event(bot, event("!help guess", true)).await;
        let text = &gateway.sent_texts()[0].text;
        assert!(text.contains("!guess 1 2x1"));
    }

    #[tokio::test]
    async fn degraded_storage_yields_a_generic_apology() {
        let (bot, gateway, store) = bot_context().await;
        store.insert_game(open_game(1)).await.unwrap();
        bot.state.update_degraded(true);

        handle_event(bot, event("!guess 1 2x1", true)).await;
        assert!(
            gateway.sent_texts()[0]
                .text
                .contains("unavailable right now")
        );
    }
}
