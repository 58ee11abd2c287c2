//! In-memory [`PoolStore`] used by unit tests. Mutations take a single lock
//! for their whole duration, which gives the same atomicity the MongoDB
//! backend gets from `findOneAndUpdate`.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use crate::dao::{
    models::{GameEntity, GameStatus, GuessEntity, RankingEntity},
    pool_store::PoolStore,
    storage::{StorageError, StorageResult},
};

/// Test double mirroring the semantics of the MongoDB store.
#[derive(Clone, Default)]
pub struct MemoryPoolStore {
    inner: Arc<Mutex<MemoryInner>>,
    fail: Arc<Mutex<bool>>,
}

#[derive(Default)]
struct MemoryInner {
    sequences: HashMap<String, i64>,
    games: Vec<GameEntity>,
    guesses: Vec<GuessEntity>,
    rankings: Vec<RankingEntity>,
    opt_outs: HashSet<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("memory store failure injected")]
struct InjectedFailure;

impl MemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail, to exercise degraded paths.
    pub fn fail_all(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    fn check(&self) -> StorageResult<()> {
        if *self.fail.lock().unwrap() {
            Err(StorageError::unavailable(
                "memory store failure injected".into(),
                InjectedFailure,
            ))
        } else {
            Ok(())
        }
    }

    /// Direct snapshot of a stored game, bypassing the trait.
    pub fn game(&self, game_id: i64) -> Option<GameEntity> {
        self.inner
            .lock()
            .unwrap()
            .games
            .iter()
            .find(|game| game.game_id == game_id)
            .cloned()
    }

    /// Direct snapshot of stored guesses, bypassing the trait.
    pub fn all_guesses(&self) -> Vec<GuessEntity> {
        self.inner.lock().unwrap().guesses.clone()
    }
}

impl PoolStore for MemoryPoolStore {
    fn next_sequence(&self, name: &str) -> BoxFuture<'static, StorageResult<i64>> {
        let store = self.clone();
        let name = name.to_owned();
        Box::pin(async move {
            store.check()?;
            let mut inner = store.inner.lock().unwrap();
            let seq = inner.sequences.entry(name).or_insert(0);
            *seq += 1;
            Ok(*seq)
        })
    }

    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            store.inner.lock().unwrap().games.push(game);
            Ok(())
        })
    }

    fn find_game(&self, game_id: i64) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            Ok(store.game(game_id))
        })
    }

    fn find_game_in_group(
        &self,
        game_id: i64,
        group_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        let group_id = group_id.to_owned();
        Box::pin(async move {
            store.check()?;
            Ok(store
                .game(game_id)
                .filter(|game| game.group_id == group_id))
        })
    }

    fn games_open_for_guessing(
        &self,
        group_id: &str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        let group_id = group_id.to_owned();
        Box::pin(async move {
            store.check()?;
            let inner = store.inner.lock().unwrap();
            let mut games: Vec<_> = inner
                .games
                .iter()
                .filter(|game| {
                    game.group_id == group_id
                        && game.status == GameStatus::Scheduled
                        && game.guess_deadline > now
                })
                .cloned()
                .collect();
            games.sort_by_key(|game| game.kickoff_at);
            Ok(games)
        })
    }

    fn games_awaiting_result(
        &self,
        group_id: &str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        let group_id = group_id.to_owned();
        Box::pin(async move {
            store.check()?;
            let inner = store.inner.lock().unwrap();
            let mut games: Vec<_> = inner
                .games
                .iter()
                .filter(|game| {
                    game.group_id == group_id
                        && game.status == GameStatus::Scheduled
                        && game.kickoff_at < now
                })
                .cloned()
                .collect();
            games.sort_by_key(|game| game.kickoff_at);
            Ok(games)
        })
    }

    fn games_needing_reminder(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            let inner = store.inner.lock().unwrap();
            let mut games: Vec<_> = inner
                .games
                .iter()
                .filter(|game| {
                    game.status == GameStatus::Scheduled
                        && !game.reminder_sent
                        && game.guess_deadline >= from
                        && game.guess_deadline <= until
                })
                .cloned()
                .collect();
            games.sort_by_key(|game| game.kickoff_at);
            Ok(games)
        })
    }

    fn mark_reminder_sent(&self, game_id: i64) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            let mut inner = store.inner.lock().unwrap();
            if let Some(game) = inner.games.iter_mut().find(|game| game.game_id == game_id) {
                game.reminder_sent = true;
            }
            Ok(())
        })
    }

    fn claim_settlement(
        &self,
        game_id: i64,
        home_score: u8,
        away_score: u8,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            let mut inner = store.inner.lock().unwrap();
            let Some(game) = inner
                .games
                .iter_mut()
                .find(|game| game.game_id == game_id && game.status == GameStatus::Scheduled)
            else {
                return Ok(None);
            };
            game.status = GameStatus::Finished;
            game.home_score = Some(home_score);
            game.away_score = Some(away_score);
            Ok(Some(game.clone()))
        })
    }

    fn upsert_guess(&self, guess: GuessEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            let mut inner = store.inner.lock().unwrap();
            if let Some(existing) = inner.guesses.iter_mut().find(|existing| {
                existing.group_id == guess.group_id
                    && existing.user_id == guess.user_id
                    && existing.game_id == guess.game_id
            }) {
                *existing = guess;
            } else {
                inner.guesses.push(guess);
            }
            Ok(())
        })
    }

    fn guesses_for_game(
        &self,
        game_id: i64,
        group_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GuessEntity>>> {
        let store = self.clone();
        let group_id = group_id.to_owned();
        Box::pin(async move {
            store.check()?;
            let inner = store.inner.lock().unwrap();
            let mut guesses: Vec<_> = inner
                .guesses
                .iter()
                .filter(|guess| guess.game_id == game_id && guess.group_id == group_id)
                .cloned()
                .collect();
            guesses.sort_by(|a, b| a.display_name.cmp(&b.display_name));
            Ok(guesses)
        })
    }

    fn guesses_for_user(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GuessEntity>>> {
        let store = self.clone();
        let group_id = group_id.to_owned();
        let user_id = user_id.to_owned();
        Box::pin(async move {
            store.check()?;
            let inner = store.inner.lock().unwrap();
            let mut guesses: Vec<_> = inner
                .guesses
                .iter()
                .filter(|guess| guess.group_id == group_id && guess.user_id == user_id)
                .cloned()
                .collect();
            guesses.sort_by_key(|guess| guess.game_id);
            Ok(guesses)
        })
    }

    fn count_guesses_for_user(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        let group_id = group_id.to_owned();
        let user_id = user_id.to_owned();
        Box::pin(async move {
            store.check()?;
            let inner = store.inner.lock().unwrap();
            Ok(inner
                .guesses
                .iter()
                .filter(|guess| guess.group_id == group_id && guess.user_id == user_id)
                .count() as u64)
        })
    }

    fn award_point(
        &self,
        group_id: &str,
        user_id: &str,
        display_name: &str,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let group_id = group_id.to_owned();
        let user_id = user_id.to_owned();
        let display_name = display_name.to_owned();
        Box::pin(async move {
            store.check()?;
            let mut inner = store.inner.lock().unwrap();
            if let Some(entry) = inner
                .rankings
                .iter_mut()
                .find(|entry| entry.group_id == group_id && entry.user_id == user_id)
            {
                entry.total_points += 1;
                entry.display_name = display_name;
            } else {
                inner.rankings.push(RankingEntity {
                    group_id,
                    user_id,
                    display_name,
                    total_points: 1,
                });
            }
            Ok(())
        })
    }

    fn group_ranking(
        &self,
        group_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<RankingEntity>>> {
        let store = self.clone();
        let group_id = group_id.to_owned();
        Box::pin(async move {
            store.check()?;
            let inner = store.inner.lock().unwrap();
            let mut entries: Vec<_> = inner
                .rankings
                .iter()
                .filter(|entry| entry.group_id == group_id)
                .cloned()
                .collect();
            entries.sort_by(|a, b| {
                b.total_points
                    .cmp(&a.total_points)
                    .then_with(|| a.display_name.cmp(&b.display_name))
            });
            Ok(entries)
        })
    }

    fn add_mention_opt_out(&self, user_id: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let user_id = user_id.to_owned();
        Box::pin(async move {
            store.check()?;
            store.inner.lock().unwrap().opt_outs.insert(user_id);
            Ok(())
        })
    }

    fn remove_mention_opt_out(&self, user_id: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let user_id = user_id.to_owned();
        Box::pin(async move {
            store.check()?;
            store.inner.lock().unwrap().opt_outs.remove(&user_id);
            Ok(())
        })
    }

    fn mention_opt_outs(&self) -> BoxFuture<'static, StorageResult<HashSet<String>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            Ok(store.inner.lock().unwrap().opt_outs.clone())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check() })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check() })
    }
}
