//! Pool settlement engine: the only component that performs cross-entity
//! writes on games, guesses and ranking entries.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::warn;

use crate::{
    dao::models::{GameEntity, GameStatus, GuessEntity, RankingEntity},
    error::ServiceError,
    state::SharedState,
};

/// Upper bound for predicted and real goals per side.
pub const MAX_GOALS: u8 = 20;
/// Sequence name used for game identifiers.
const GAME_ID_SEQUENCE: &str = "game_id";
/// Maximum goals the house guess generator can produce per side.
const HOUSE_MAX_GOALS: u8 = 8;
/// Per-step success odds for the weighted goal generator; the chance of one
/// more goal shrinks with each goal already scored.
const GOAL_STEP_ODDS: [f64; 8] = [0.65, 0.55, 0.45, 0.35, 0.18, 0.11, 0.05, 0.02];
/// Odds applied beyond the table, should the configured maximum exceed it.
const GOAL_FALLBACK_ODDS: f64 = 0.01;

/// Input for creating a new pool game.
#[derive(Debug, Clone)]
pub struct NewGameRequest {
    /// League or tournament name.
    pub league: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Kickoff instant.
    pub kickoff_at: DateTime<Utc>,
    /// How long before kickoff guesses close; zero means guesses stay open
    /// until kickoff itself.
    pub deadline_offset: Duration,
}

/// Confirmation data for a registered guess.
#[derive(Debug, Clone)]
pub struct GuessReceipt {
    /// The game the guess targets.
    pub game: GameEntity,
    /// Predicted home goals.
    pub home_guess: u8,
    /// Predicted away goals.
    pub away_guess: u8,
}

/// A user whose guess matched the settled score exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    /// Winner JID.
    pub user_id: String,
    /// Winner display name snapshot.
    pub display_name: String,
}

/// Outcome of settling a game.
#[derive(Debug, Clone)]
pub struct Settlement {
    /// The settled game, with final scores and FINISHED status.
    pub game: GameEntity,
    /// Exact-score winners; unordered peers, one point each.
    pub winners: Vec<Winner>,
}

/// A user's guess joined with its still-scheduled game.
#[derive(Debug, Clone)]
pub struct OpenGuess {
    /// The guess.
    pub guess: GuessEntity,
    /// The owning game.
    pub game: GameEntity,
}

/// All guesses of one game plus outcome tallies.
#[derive(Debug, Clone)]
pub struct GuessBreakdown {
    /// The game.
    pub game: GameEntity,
    /// Guesses, display name ascending.
    pub guesses: Vec<GuessEntity>,
    /// Guesses predicting a home win.
    pub home_wins: usize,
    /// Guesses predicting an away win.
    pub away_wins: usize,
    /// Guesses predicting a draw.
    pub draws: usize,
}

/// A user's pool statistics within one group.
#[derive(Debug, Clone)]
pub struct ProfileStats {
    /// Display name to render.
    pub display_name: String,
    /// Total exact-score points.
    pub points: u32,
    /// 1-based position in the group ranking, if ranked.
    pub position: Option<usize>,
    /// Number of ranked users in the group.
    pub ranked_count: usize,
    /// Total guesses the user ever registered in the group.
    pub total_guesses: u64,
    /// Percentage of guesses that scored a point.
    pub hit_rate: f64,
}

/// Create a new game in the group and register the bot's own house guess.
///
/// Returns the created game and the house scoreline, or `None` when the
/// house guess could not be registered (never a failure of the creation
/// itself).
pub async fn add_game(
    state: &SharedState,
    group_id: &str,
    request: NewGameRequest,
) -> Result<(GameEntity, Option<(u8, u8)>), ServiceError> {
    let game = add_game_at(state, group_id, request, Utc::now()).await?;
    let house = register_house_guess(state, &game).await;
    Ok((game, house))
}

async fn add_game_at(
    state: &SharedState,
    group_id: &str,
    request: NewGameRequest,
    now: DateTime<Utc>,
) -> Result<GameEntity, ServiceError> {
    if request.kickoff_at <= now {
        return Err(ServiceError::InvalidInput(
            "The game's date and time must be in the future.".into(),
        ));
    }
    if request.deadline_offset < Duration::zero() {
        return Err(ServiceError::InvalidInput(
            "The guess deadline offset cannot be negative.".into(),
        ));
    }

    let guess_deadline = request.kickoff_at - request.deadline_offset;
    if guess_deadline <= now {
        return Err(ServiceError::InvalidInput(
            "The guess deadline would already be in the past.".into(),
        ));
    }

    let store = state.store().await?;
    let game_id = store.next_sequence(GAME_ID_SEQUENCE).await?;

    let game = GameEntity {
        game_id,
        group_id: group_id.to_owned(),
        league: request.league,
        home_team: request.home_team,
        away_team: request.away_team,
        kickoff_at: request.kickoff_at,
        guess_deadline,
        status: GameStatus::Scheduled,
        home_score: None,
        away_score: None,
        reminder_sent: false,
    };
    store.insert_game(game.clone()).await?;
    Ok(game)
}

/// Register the synthetic house guess for a freshly created game. Failures
/// are logged and swallowed; the feature is social, not load-bearing.
async fn register_house_guess(state: &SharedState, game: &GameEntity) -> Option<(u8, u8)> {
    let config = state.config();
    if config.bot_jid.is_empty() {
        return None;
    }

    let (home, away) = house_scoreline();
    match register_guess(
        state,
        &game.group_id,
        &config.bot_jid,
        &config.bot_display_name,
        game.game_id,
        home,
        away,
    )
    .await
    {
        Ok(_) => Some((home, away)),
        Err(err) => {
            warn!(
                game_id = game.game_id,
                group_id = %game.group_id,
                error = %err,
                "failed to register house guess"
            );
            None
        }
    }
}

/// Register or overwrite a user's guess for a game in the group.
pub async fn register_guess(
    state: &SharedState,
    group_id: &str,
    user_id: &str,
    display_name: &str,
    game_id: i64,
    home_guess: u8,
    away_guess: u8,
) -> Result<GuessReceipt, ServiceError> {
    register_guess_at(
        state,
        group_id,
        user_id,
        display_name,
        game_id,
        home_guess,
        away_guess,
        Utc::now(),
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn register_guess_at(
    state: &SharedState,
    group_id: &str,
    user_id: &str,
    display_name: &str,
    game_id: i64,
    home_guess: u8,
    away_guess: u8,
    now: DateTime<Utc>,
) -> Result<GuessReceipt, ServiceError> {
    check_goal_bounds(home_guess, away_guess)?;

    let store = state.store().await?;
    let Some(game) = store.find_game_in_group(game_id, group_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "Game with ID {game_id} was not found in this group's pool."
        )));
    };

    if game.status != GameStatus::Scheduled {
        return Err(ServiceError::GameNotOpen(format!(
            "{} vs {} is no longer open for guesses.",
            game.home_team, game.away_team
        )));
    }
    if now > game.guess_deadline {
        return Err(ServiceError::DeadlinePassed(format!(
            "Guesses for {} vs {} are closed.",
            game.home_team, game.away_team
        )));
    }

    let snapshot = display_name_snapshot(display_name, user_id);
    store
        .upsert_guess(GuessEntity {
            group_id: group_id.to_owned(),
            user_id: user_id.to_owned(),
            display_name: snapshot.to_owned(),
            game_id,
            home_guess,
            away_guess,
            guessed_at: now,
        })
        .await?;

    Ok(GuessReceipt {
        game,
        home_guess,
        away_guess,
    })
}

/// Record the real final score of a game and award one point to every guess
/// that matched it exactly.
///
/// The SCHEDULED -> FINISHED transition is claimed atomically in the store
/// before any ranking mutation, so a second settlement of the same game
/// fails with `AlreadySettled` and never double-awards points.
pub async fn settle_result(
    state: &SharedState,
    game_id: i64,
    home_score: u8,
    away_score: u8,
) -> Result<Settlement, ServiceError> {
    check_goal_bounds(home_score, away_score)?;

    let store = state.store().await?;
    let Some(game) = store
        .claim_settlement(game_id, home_score, away_score)
        .await?
    else {
        return match store.find_game(game_id).await? {
            None => Err(ServiceError::NotFound(format!(
                "Game with ID {game_id} was not found."
            ))),
            Some(existing) if existing.status == GameStatus::Finished => {
                Err(ServiceError::AlreadySettled(format!(
                    "{} vs {} was already settled.",
                    existing.home_team, existing.away_team
                )))
            }
            Some(existing) => Err(ServiceError::GameNotOpen(format!(
                "{} vs {} cannot be settled in its current state.",
                existing.home_team, existing.away_team
            ))),
        };
    };

    let guesses = store.guesses_for_game(game_id, &game.group_id).await?;
    let mut winners = Vec::new();
    for guess in guesses {
        if guess.home_guess == home_score && guess.away_guess == away_score {
            store
                .award_point(&game.group_id, &guess.user_id, &guess.display_name)
                .await?;
            winners.push(Winner {
                user_id: guess.user_id,
                display_name: guess.display_name,
            });
        }
    }

    Ok(Settlement { game, winners })
}

/// Scheduled games in the group still open for guesses.
pub async fn open_games(
    state: &SharedState,
    group_id: &str,
) -> Result<Vec<GameEntity>, ServiceError> {
    let store = state.store().await?;
    Ok(store.games_open_for_guessing(group_id, Utc::now()).await?)
}

/// Scheduled games in the group whose kickoff already passed and which await
/// an admin settlement.
pub async fn games_awaiting_result(
    state: &SharedState,
    group_id: &str,
) -> Result<Vec<GameEntity>, ServiceError> {
    let store = state.store().await?;
    Ok(store.games_awaiting_result(group_id, Utc::now()).await?)
}

/// The caller's guesses for games that are still scheduled, joined in memory
/// against the game registry.
pub async fn my_open_guesses(
    state: &SharedState,
    group_id: &str,
    user_id: &str,
) -> Result<Vec<OpenGuess>, ServiceError> {
    let store = state.store().await?;
    let guesses = store.guesses_for_user(group_id, user_id).await?;

    let mut result = Vec::new();
    for guess in guesses {
        let game = store.find_game_in_group(guess.game_id, group_id).await?;
        if let Some(game) = game.filter(|game| game.status == GameStatus::Scheduled) {
            result.push(OpenGuess { guess, game });
        }
    }
    Ok(result)
}

/// Per-game guess detail plus outcome tallies.
pub async fn guess_breakdown(
    state: &SharedState,
    game_id: i64,
    group_id: &str,
) -> Result<GuessBreakdown, ServiceError> {
    let store = state.store().await?;
    let Some(game) = store.find_game_in_group(game_id, group_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "Game with ID {game_id} was not found in this group's pool."
        )));
    };

    let guesses = store.guesses_for_game(game_id, group_id).await?;
    let mut home_wins = 0;
    let mut away_wins = 0;
    let mut draws = 0;
    for guess in &guesses {
        match guess.home_guess.cmp(&guess.away_guess) {
            std::cmp::Ordering::Greater => home_wins += 1,
            std::cmp::Ordering::Less => away_wins += 1,
            std::cmp::Ordering::Equal => draws += 1,
        }
    }

    Ok(GuessBreakdown {
        game,
        guesses,
        home_wins,
        away_wins,
        draws,
    })
}

/// Full ranking of the group, points descending.
pub async fn group_ranking(
    state: &SharedState,
    group_id: &str,
) -> Result<Vec<RankingEntity>, ServiceError> {
    let store = state.store().await?;
    Ok(store.group_ranking(group_id).await?)
}

/// Pool statistics for one user in one group.
pub async fn profile(
    state: &SharedState,
    group_id: &str,
    user_id: &str,
    fallback_name: &str,
) -> Result<ProfileStats, ServiceError> {
    let store = state.store().await?;
    let ranking = store.group_ranking(group_id).await?;
    let total_guesses = store.count_guesses_for_user(group_id, user_id).await?;

    let position = ranking
        .iter()
        .position(|entry| entry.user_id == user_id)
        .map(|index| index + 1);
    let entry = ranking.iter().find(|entry| entry.user_id == user_id);
    let points = entry.map(|entry| entry.total_points).unwrap_or(0);
    let display_name = entry
        .map(|entry| entry.display_name.clone())
        .unwrap_or_else(|| display_name_snapshot(fallback_name, user_id).to_owned());

    let hit_rate = if total_guesses > 0 {
        f64::from(points) / total_guesses as f64 * 100.0
    } else {
        0.0
    };

    Ok(ProfileStats {
        display_name,
        points,
        position,
        ranked_count: ranking.len(),
        total_guesses,
        hit_rate,
    })
}

/// Weighted goal count: keep scoring while the draw beats the per-step odds,
/// which skews scorelines toward 0-3 goals and caps at `max_goals`.
pub fn weighted_goal_count(mut draw: impl FnMut() -> f64, max_goals: u8) -> u8 {
    let mut goals = 0;
    for step in 0..max_goals {
        let odds = GOAL_STEP_ODDS
            .get(usize::from(step))
            .copied()
            .unwrap_or(GOAL_FALLBACK_ODDS);
        if draw() < odds {
            goals += 1;
        } else {
            break;
        }
    }
    goals
}

fn house_scoreline() -> (u8, u8) {
    let mut rng = rand::rng();
    let home = weighted_goal_count(|| rng.random::<f64>(), HOUSE_MAX_GOALS);
    let away = weighted_goal_count(|| rng.random::<f64>(), HOUSE_MAX_GOALS);
    (home, away)
}

fn check_goal_bounds(home: u8, away: u8) -> Result<(), ServiceError> {
    if home > MAX_GOALS || away > MAX_GOALS {
        return Err(ServiceError::InvalidInput(format!(
            "Goals must be between 0 and {MAX_GOALS} per team."
        )));
    }
    Ok(())
}

fn display_name_snapshot<'a>(display_name: &'a str, user_id: &'a str) -> &'a str {
    let trimmed = display_name.trim();
    if trimmed.is_empty() {
        user_id.split('@').next().unwrap_or(user_id)
    } else {
        trimmed
    }
}
