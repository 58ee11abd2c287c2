use chrono::{DateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

use crate::dao::models::{GameEntity, GameStatus, GuessEntity, RankingEntity};

/// Convert a UTC instant into its BSON representation (millisecond
/// precision).
pub fn bson_datetime(value: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_system_time(value.into())
}

fn chrono_datetime(value: BsonDateTime) -> DateTime<Utc> {
    value.to_system_time().into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    game_id: i64,
    group_id: String,
    league: String,
    home_team: String,
    away_team: String,
    kickoff_at: BsonDateTime,
    guess_deadline: BsonDateTime,
    status: GameStatus,
    home_score: Option<u8>,
    away_score: Option<u8>,
    #[serde(default)]
    reminder_sent: bool,
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            game_id: value.game_id,
            group_id: value.group_id,
            league: value.league,
            home_team: value.home_team,
            away_team: value.away_team,
            kickoff_at: bson_datetime(value.kickoff_at),
            guess_deadline: bson_datetime(value.guess_deadline),
            status: value.status,
            home_score: value.home_score,
            away_score: value.away_score,
            reminder_sent: value.reminder_sent,
        }
    }
}

impl From<MongoGameDocument> for GameEntity {
    fn from(value: MongoGameDocument) -> Self {
        Self {
            game_id: value.game_id,
            group_id: value.group_id,
            league: value.league,
            home_team: value.home_team,
            away_team: value.away_team,
            kickoff_at: chrono_datetime(value.kickoff_at),
            guess_deadline: chrono_datetime(value.guess_deadline),
            status: value.status,
            home_score: value.home_score,
            away_score: value.away_score,
            reminder_sent: value.reminder_sent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGuessDocument {
    group_id: String,
    user_id: String,
    display_name: String,
    game_id: i64,
    home_guess: u8,
    away_guess: u8,
    guessed_at: BsonDateTime,
}

impl From<GuessEntity> for MongoGuessDocument {
    fn from(value: GuessEntity) -> Self {
        Self {
            group_id: value.group_id,
            user_id: value.user_id,
            display_name: value.display_name,
            game_id: value.game_id,
            home_guess: value.home_guess,
            away_guess: value.away_guess,
            guessed_at: bson_datetime(value.guessed_at),
        }
    }
}

impl From<MongoGuessDocument> for GuessEntity {
    fn from(value: MongoGuessDocument) -> Self {
        Self {
            group_id: value.group_id,
            user_id: value.user_id,
            display_name: value.display_name,
            game_id: value.game_id,
            home_guess: value.home_guess,
            away_guess: value.away_guess,
            guessed_at: chrono_datetime(value.guessed_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRankingDocument {
    group_id: String,
    user_id: String,
    display_name: String,
    #[serde(default)]
    total_points: u32,
}

impl From<MongoRankingDocument> for RankingEntity {
    fn from(value: MongoRankingDocument) -> Self {
        Self {
            group_id: value.group_id,
            user_id: value.user_id,
            display_name: value.display_name,
            total_points: value.total_points,
        }
    }
}

/// Counter document backing the sequence allocator; `_id` is the sequence
/// name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCounterDocument {
    #[serde(rename = "_id")]
    pub name: String,
    pub seq: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoOptOutDocument {
    pub user_id: String,
}
