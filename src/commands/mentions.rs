//! Mention-related command handlers: mention everyone, opt out, opt back in.

use crate::services::mentions;

use super::{CommandResult, context::CommandContext, guards};

pub(super) async fn everyone(ctx: CommandContext) -> CommandResult {
    guards::require_admin(&ctx).await?;

    let members = ctx.gateway.group_members(&ctx.chat_id).await?;
    let bot_jid = &ctx.config().bot_jid;
    let ids: Vec<String> = members
        .into_iter()
        .map(|member| member.id)
        .filter(|id| id != bot_jid)
        .collect();

    let mentionable = mentions::filter_mentionable(&ctx.state, ids).await?;
    if mentionable.is_empty() {
        ctx.reply("🤔 Nobody to mention in this group.").await;
        return Ok(());
    }

    let announcement = if ctx.args.is_empty() {
        "📣 Attention everyone!".to_owned()
    } else {
        ctx.args.join(" ")
    };
    let tags = mentions::mention_tags(&mentionable);
    ctx.reply_mentioning(&format!("{announcement}\n\n{tags}"), &mentionable)
        .await;
    Ok(())
}

pub(super) async fn nomention(ctx: CommandContext) -> CommandResult {
    mentions::opt_out(&ctx.state, &ctx.sender_id).await?;
    ctx.reply("🔕 Got it! You will no longer be mentioned in group call-outs and reminders.")
        .await;
    Ok(())
}

pub(super) async fn mentionme(ctx: CommandContext) -> CommandResult {
    mentions::opt_in(&ctx.state, &ctx.sender_id).await?;
    ctx.reply("🔔 Welcome back! You will be mentioned in group call-outs and reminders again.")
        .await;
    Ok(())
}
