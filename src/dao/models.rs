use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a pool game.
///
/// Only `Scheduled -> Finished` is ever produced by the settlement path;
/// `InProgress` and `Cancelled` are reserved values kept for forward
/// compatibility with externally sourced fixtures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// Open for guesses until the deadline, awaiting settlement afterwards.
    Scheduled,
    /// Reserved; no transition currently produces this value.
    InProgress,
    /// Settled with a final score; immutable from here on.
    Finished,
    /// Reserved; no cancel operation is exposed.
    Cancelled,
}

impl GameStatus {
    /// Stable wire representation, usable inside query filters.
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Scheduled => "SCHEDULED",
            GameStatus::InProgress => "IN_PROGRESS",
            GameStatus::Finished => "FINISHED",
            GameStatus::Cancelled => "CANCELLED",
        }
    }
}

/// A match open for betting inside one group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Sequence-allocated identifier, unique across all groups.
    pub game_id: i64,
    /// Chat JID of the group that owns this pool game.
    pub group_id: String,
    /// League or tournament name.
    pub league: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Kickoff instant.
    pub kickoff_at: DateTime<Utc>,
    /// Last instant at which guesses are accepted; never after kickoff.
    pub guess_deadline: DateTime<Utc>,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Final home score, set only at settlement.
    pub home_score: Option<u8>,
    /// Final away score, set only at settlement.
    pub away_score: Option<u8>,
    /// Whether the deadline reminder for this game was already attempted.
    pub reminder_sent: bool,
}

/// One user's predicted scoreline for one game.
///
/// Identity is the composite (group, user, game); re-guessing overwrites the
/// row in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuessEntity {
    /// Group the guess was made in.
    pub group_id: String,
    /// Guessing user's JID.
    pub user_id: String,
    /// Display name snapshot taken when the guess was (last) registered.
    pub display_name: String,
    /// Target game.
    pub game_id: i64,
    /// Predicted home goals.
    pub home_guess: u8,
    /// Predicted away goals.
    pub away_guess: u8,
    /// When the guess was registered or last edited.
    pub guessed_at: DateTime<Utc>,
}

/// Cumulative score of a user within a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankingEntity {
    /// Group the ranking entry belongs to.
    pub group_id: String,
    /// Ranked user's JID.
    pub user_id: String,
    /// Last known display name.
    pub display_name: String,
    /// Total exact-score hits; one point each, never decremented.
    pub total_points: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_to_wire_names() {
        for status in [
            GameStatus::Scheduled,
            GameStatus::InProgress,
            GameStatus::Finished,
            GameStatus::Cancelled,
        ] {
            let encoded = serde_json::to_string(&status).unwrap();
            assert_eq!(encoded, format!("\"{}\"", status.as_str()));
            let decoded: GameStatus = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, status);
        }
    }
}
