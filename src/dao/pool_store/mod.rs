//! Abstraction over the persistence layer for pool games, guesses, rankings,
//! sequence counters and the mention opt-out set.

#[cfg(test)]
pub mod memory;
pub mod mongodb;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use crate::dao::models::{GameEntity, GuessEntity, RankingEntity};
use crate::dao::storage::StorageResult;

/// Persistence operations required by the settlement engine and the reminder
/// scanner. All mutating primitives are atomic in the backend: the sequence
/// increment, the guess upsert, the settlement claim and the point award must
/// each be a single store round-trip, never a read-then-write pair.
pub trait PoolStore: Send + Sync {
    /// Atomically increment and return the named counter, starting at 1.
    fn next_sequence(&self, name: &str) -> BoxFuture<'static, StorageResult<i64>>;

    /// Persist a newly created game.
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a game by its globally unique id.
    fn find_game(&self, game_id: i64) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Fetch a game by id, scoped to one group.
    fn find_game_in_group(
        &self,
        game_id: i64,
        group_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Scheduled games in the group whose guess deadline is still ahead of
    /// `now`, ordered by kickoff ascending.
    fn games_open_for_guessing(
        &self,
        group_id: &str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Scheduled games in the group whose kickoff already passed, ordered by
    /// kickoff ascending.
    fn games_awaiting_result(
        &self,
        group_id: &str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Scheduled, not-yet-reminded games across all groups whose guess
    /// deadline falls inside `[from, until]`.
    fn games_needing_reminder(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Record that a reminder attempt was made for the game.
    fn mark_reminder_sent(&self, game_id: i64) -> BoxFuture<'static, StorageResult<()>>;
    /// Atomically move a SCHEDULED game to FINISHED with the given final
    /// score, returning the updated game. `None` means no scheduled game with
    /// that id existed, so a concurrent settlement can win at most once.
    fn claim_settlement(
        &self,
        game_id: i64,
        home_score: u8,
        away_score: u8,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;

    /// Atomically create or overwrite the guess identified by
    /// (group, user, game).
    fn upsert_guess(&self, guess: GuessEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// All guesses for one game in one group, display name ascending.
    fn guesses_for_game(
        &self,
        game_id: i64,
        group_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GuessEntity>>>;
    /// All guesses one user made in one group.
    fn guesses_for_user(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GuessEntity>>>;
    /// Number of guesses one user made in one group.
    fn count_guesses_for_user(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> BoxFuture<'static, StorageResult<u64>>;

    /// Atomically add one point to the user's ranking entry, creating it if
    /// absent, and refresh the display-name snapshot.
    fn award_point(
        &self,
        group_id: &str,
        user_id: &str,
        display_name: &str,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Ranking entries for a group, points descending then name ascending.
    fn group_ranking(
        &self,
        group_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<RankingEntity>>>;

    /// Add a user to the mention opt-out set (idempotent).
    fn add_mention_opt_out(&self, user_id: &str) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove a user from the mention opt-out set (idempotent).
    fn remove_mention_opt_out(&self, user_id: &str) -> BoxFuture<'static, StorageResult<()>>;
    /// The full mention opt-out set.
    fn mention_opt_outs(&self) -> BoxFuture<'static, StorageResult<HashSet<String>>>;

    /// Cheap liveness probe against the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish the backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
