//! Explicit permission guards called at the top of command handlers.

use crate::error::ServiceError;

use super::context::CommandContext;

/// Reject the command unless it was sent in a group chat.
pub fn require_group(ctx: &CommandContext) -> Result<(), ServiceError> {
    if ctx.from_group {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized(
            "❌ This command can only be used in groups.".into(),
        ))
    }
}

/// Reject the command unless the sender is a group admin (or the configured
/// owner, who bypasses the check).
pub async fn require_admin(ctx: &CommandContext) -> Result<(), ServiceError> {
    require_group(ctx)?;

    if ctx
        .config()
        .owner_jid
        .as_deref()
        .is_some_and(|owner| owner == ctx.sender_id)
    {
        return Ok(());
    }

    let members = ctx.gateway.group_members(&ctx.chat_id).await?;
    let is_admin = members
        .iter()
        .any(|member| member.id == ctx.sender_id && member.is_admin);

    if is_admin {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized(
            "❌ You need to be a group admin to use this command.".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        gateway::{GroupMember, testing::RecordingGateway},
        state::AppState,
    };

    fn context(sender: &str, from_group: bool, gateway: RecordingGateway) -> CommandContext {
        CommandContext {
            state: AppState::new(AppConfig::for_tests()),
            gateway: Arc::new(gateway),
            chat_id: "group-1@g.us".into(),
            sender_id: sender.into(),
            sender_name: "Tester".into(),
            message_id: "msg-1".into(),
            from_group,
            args: Vec::new(),
        }
    }

    #[tokio::test]
    async fn group_guard_rejects_direct_chats() {
        let ctx = context("u1@c.us", false, RecordingGateway::new());
        assert!(matches!(
            require_group(&ctx),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn admin_guard_accepts_group_admins() {
        let gateway = RecordingGateway::with_members(vec![GroupMember {
            id: "u1@c.us".into(),
            is_admin: true,
        }]);
        let ctx = context("u1@c.us", true, gateway);
        assert!(require_admin(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn admin_guard_rejects_regular_members() {
        let gateway = RecordingGateway::with_members(vec![GroupMember {
            id: "u1@c.us".into(),
            is_admin: false,
        }]);
        let ctx = context("u1@c.us", true, gateway);
        assert!(matches!(
            require_admin(&ctx).await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn owner_bypasses_the_admin_check() {
        // No member entry for the owner on purpose.
        let ctx = context("owner@c.us", true, RecordingGateway::new());
        assert!(require_admin(&ctx).await.is_ok());
    }
}
