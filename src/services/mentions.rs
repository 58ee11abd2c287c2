//! Mention opt-out registry and mention helpers.

use crate::{error::ServiceError, state::SharedState};

/// Add the user to the mention opt-out set.
pub async fn opt_out(state: &SharedState, user_id: &str) -> Result<(), ServiceError> {
    let store = state.store().await?;
    Ok(store.add_mention_opt_out(user_id).await?)
}

/// Remove the user from the mention opt-out set.
pub async fn opt_in(state: &SharedState, user_id: &str) -> Result<(), ServiceError> {
    let store = state.store().await?;
    Ok(store.remove_mention_opt_out(user_id).await?)
}

/// Drop every user that asked not to be mentioned.
pub async fn filter_mentionable(
    state: &SharedState,
    user_ids: Vec<String>,
) -> Result<Vec<String>, ServiceError> {
    let store = state.store().await?;
    let opted_out = store.mention_opt_outs().await?;
    Ok(user_ids
        .into_iter()
        .filter(|id| !opted_out.contains(id))
        .collect())
}

/// Render the `@` tags for a mention list, using the JID prefix as the
/// visible handle.
pub fn mention_tags(user_ids: &[String]) -> String {
    user_ids
        .iter()
        .map(|id| format!("@{}", id.split('@').next().unwrap_or(id)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::pool_store::memory::MemoryPoolStore, state::AppState,
    };

    #[tokio::test]
    async fn opt_out_round_trip_filters_mentions() {
        let state = AppState::new(AppConfig::for_tests());
        state.set_store(Arc::new(MemoryPoolStore::new())).await;

        opt_out(&state, "u2@c.us").await.unwrap();
        let kept = filter_mentionable(
            &state,
            vec!["u1@c.us".into(), "u2@c.us".into(), "u3@c.us".into()],
        )
        .await
        .unwrap();
        assert_eq!(kept, vec!["u1@c.us".to_owned(), "u3@c.us".to_owned()]);

        opt_in(&state, "u2@c.us").await.unwrap();
        let kept = filter_mentionable(&state, vec!["u2@c.us".into()])
            .await
            .unwrap();
        assert_eq!(kept, vec!["u2@c.us".to_owned()]);
    }

    #[test]
    fn tags_use_the_jid_prefix() {
        let tags = mention_tags(&["5531999@c.us".into(), "5532888@c.us".into()]);
        assert_eq!(tags, "@5531999 @5532888");
    }
}
