//! Small utility command handlers.

use super::{CommandResult, context::CommandContext};

pub(super) async fn ping(ctx: CommandContext) -> CommandResult {
    ctx.reply("🏓 Pong!").await;
    Ok(())
}
