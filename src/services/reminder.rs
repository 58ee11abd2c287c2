//! Periodic sweep that reminds group members who have not guessed yet about
//! games whose guess deadline is about to pass.

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::{
    dao::{models::GameEntity, pool_store::PoolStore},
    error::ServiceError,
    gateway::MessagingGateway,
    services::mentions::mention_tags,
    state::SharedState,
};

/// Run the reminder loop forever. Each tick performs one sweep; a sweep that
/// outlives the tick interval causes the next ticks to be skipped via the
/// shared re-entrancy gate rather than piling up.
pub async fn run(state: SharedState, gateway: Arc<dyn MessagingGateway>) {
    let mut ticker = interval(state.config().reminder_tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Ok(_guard) = state.reminder_gate().try_lock() else {
            warn!("previous reminder sweep still running; skipping tick");
            continue;
        };

        if let Err(err) = sweep_at(&state, gateway.as_ref(), Utc::now()).await {
            warn!(error = %err, "reminder sweep failed");
        }
    }
}

async fn sweep_at(
    state: &SharedState,
    gateway: &dyn MessagingGateway,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let store = state.store().await?;
    let until = now + state.config().reminder_lookahead;
    let due = store.games_needing_reminder(now, until).await?;

    for game in due {
        if let Err(err) = remind_game(state, gateway, store.as_ref(), &game).await {
            warn!(
                game_id = game.game_id,
                group_id = %game.group_id,
                error = %err,
                "failed to deliver guess deadline reminder"
            );
        }

        // Always flag the game, even after a failed delivery: one lost
        // reminder beats a retry storm of duplicate mentions.
        if let Err(err) = store.mark_reminder_sent(game.game_id).await {
            warn!(
                game_id = game.game_id,
                error = %err,
                "failed to mark reminder as sent"
            );
        }
    }

    Ok(())
}

async fn remind_game(
    state: &SharedState,
    gateway: &dyn MessagingGateway,
    store: &dyn PoolStore,
    game: &GameEntity,
) -> Result<(), ServiceError> {
    let members = gateway.group_members(&game.group_id).await?;
    let guessed: HashSet<String> = store
        .guesses_for_game(game.game_id, &game.group_id)
        .await?
        .into_iter()
        .map(|guess| guess.user_id)
        .collect();
    let opted_out = store.mention_opt_outs().await?;

    let bot_jid = &state.config().bot_jid;
    let pending: Vec<String> = members
        .into_iter()
        .map(|member| member.id)
        .filter(|id| !guessed.contains(id) && id != bot_jid && !opted_out.contains(id))
        .collect();

    if pending.is_empty() {
        debug!(
            game_id = game.game_id,
            group_id = %game.group_id,
            "everyone guessed or opted out; no reminder needed"
        );
        return Ok(());
    }

    let deadline_local = game
        .guess_deadline
        .with_timezone(&state.config().admin_utc_offset);
    let text = format!(
        "⏳ *Time to guess!* ⏳\n\n\
         Guesses for *{home} vs {away}* close at *{deadline}* and you have not guessed yet!\n\n\
         Send yours with: `{prefix}guess {id} <Home>x<Away>`\n\n\
         Missing: {tags}",
        home = game.home_team,
        away = game.away_team,
        deadline = deadline_local.format("%H:%M"),
        prefix = state.config().prefix,
        id = game.game_id,
        tags = mention_tags(&pending),
    );

    gateway
        .send_text(&game.group_id, &text, &pending, None)
        .await?;
    info!(
        game_id = game.game_id,
        group_id = %game.group_id,
        pending = pending.len(),
        "sent guess deadline reminder"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{GameStatus, GuessEntity},
            pool_store::memory::MemoryPoolStore,
        },
        gateway::{GroupMember, testing::RecordingGateway},
        state::AppState,
    };

    const GROUP: &str = "group-1@g.us";

    fn member(id: &str) -> GroupMember {
        GroupMember {
            id: id.into(),
            is_admin: false,
        }
    }

    fn game(game_id: i64, deadline: DateTime<Utc>) -> GameEntity {
        GameEntity {
            game_id,
            group_id: GROUP.into(),
            league: "Serie A".into(),
            home_team: "Atletico".into(),
            away_team: "Cruzeiro".into(),
            kickoff_at: deadline + Duration::minutes(30),
            guess_deadline: deadline,
            status: GameStatus::Scheduled,
            home_score: None,
            away_score: None,
            reminder_sent: false,
        }
    }

    fn guess(user_id: &str, game_id: i64, at: DateTime<Utc>) -> GuessEntity {
        GuessEntity {
            group_id: GROUP.into(),
            user_id: user_id.into(),
            display_name: user_id.into(),
            game_id,
            home_guess: 1,
            away_guess: 0,
            guessed_at: at,
        }
    }

    async fn test_state() -> (SharedState, Arc<MemoryPoolStore>) {
        let state = AppState::new(AppConfig::for_tests());
        let store = Arc::new(MemoryPoolStore::new());
        state.set_store(store.clone()).await;
        (state, store)
    }

    #[tokio::test]
    async fn mentions_only_members_who_did_not_guess() {
        let (state, store) = test_state().await;
        let now = Utc::now();

        store.insert_game(game(1, now + Duration::minutes(5))).await.unwrap();
        store.upsert_guess(guess("u1@c.us", 1, now)).await.unwrap();
        store.add_mention_opt_out("u3@c.us").await.unwrap();

        let gateway = RecordingGateway::with_members(vec![
            member("u1@c.us"),
            member("u2@c.us"),
            member("u3@c.us"),
            member("bot@c.us"),
        ]);

        sweep_at(&state, &gateway, now).await.unwrap();

        let sent = gateway.sent_texts();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].mentions, vec!["u2@c.us".to_owned()]);
        assert!(sent[0].text.contains("Atletico vs Cruzeiro"));
        assert!(store.game(1).unwrap().reminder_sent);
    }

    #[tokio::test]
    async fn skips_silently_when_everyone_guessed() {
        let (state, store) = test_state().await;
        let now = Utc::now();

        store.insert_game(game(1, now + Duration::minutes(5))).await.unwrap();
        store.upsert_guess(guess("u1@c.us", 1, now)).await.unwrap();

        let gateway =
            RecordingGateway::with_members(vec![member("u1@c.us"), member("bot@c.us")]);
        sweep_at(&state, &gateway, now).await.unwrap();

        assert!(gateway.sent_texts().is_empty());
        // Still flagged so the game is never swept again.
        assert!(store.game(1).unwrap().reminder_sent);
    }

    #[tokio::test]
    async fn flags_game_even_when_delivery_fails() {
        let (state, store) = test_state().await;
        let now = Utc::now();

        store.insert_game(game(1, now + Duration::minutes(5))).await.unwrap();

        let gateway = RecordingGateway::with_members(vec![member("u2@c.us")]);
        gateway.fail_sends(true);
        sweep_at(&state, &gateway, now).await.unwrap();

        assert!(gateway.sent_texts().is_empty());
        assert!(store.game(1).unwrap().reminder_sent);
    }

    #[tokio::test]
    async fn ignores_games_outside_the_lookahead_window() {
        let (state, store) = test_state().await;
        let now = Utc::now();

        store.insert_game(game(1, now + Duration::hours(2))).await.unwrap();
        store.insert_game(game(2, now - Duration::minutes(1))).await.unwrap();

        let gateway = RecordingGateway::with_members(vec![member("u2@c.us")]);
        sweep_at(&state, &gateway, now).await.unwrap();

        assert!(gateway.sent_texts().is_empty());
        assert!(!store.game(1).unwrap().reminder_sent);
        assert!(!store.game(2).unwrap().reminder_sent);
    }

    #[tokio::test]
    async fn already_flagged_games_are_not_reminded_again() {
        let (state, store) = test_state().await;
        let now = Utc::now();

        let mut due = game(1, now + Duration::minutes(5));
        due.reminder_sent = true;
        store.insert_game(due).await.unwrap();

        let gateway = RecordingGateway::with_members(vec![member("u2@c.us")]);
        sweep_at(&state, &gateway, now).await.unwrap();
        assert!(gateway.sent_texts().is_empty());
    }
}
