use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias for MongoDB store operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Failures raised by the MongoDB pool store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// The driver client could not be constructed.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// The deployment never answered the initial ping.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Number of ping attempts made.
        attempts: u32,
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// A health-check ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// Index creation failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Target collection.
        collection: &'static str,
        /// Index description.
        index: &'static str,
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// The atomic counter increment failed.
    #[error("failed to advance sequence `{sequence}`")]
    NextSequence {
        /// Sequence name.
        sequence: String,
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// The counter upsert reported success but returned no document.
    #[error("sequence `{sequence}` upsert returned no counter document")]
    SequenceMissing {
        /// Sequence name.
        sequence: String,
    },
    /// A game document could not be written.
    #[error("failed to save game `{game_id}`")]
    SaveGame {
        /// Target game.
        game_id: i64,
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// A game document could not be read.
    #[error("failed to load game `{game_id}`")]
    LoadGame {
        /// Target game.
        game_id: i64,
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// A game listing query failed.
    #[error("failed to query games")]
    QueryGames {
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// The atomic settlement claim failed.
    #[error("failed to settle game `{game_id}`")]
    SettleGame {
        /// Target game.
        game_id: i64,
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// The reminder flag update failed.
    #[error("failed to mark reminder for game `{game_id}`")]
    MarkReminder {
        /// Target game.
        game_id: i64,
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// The atomic guess upsert failed.
    #[error("failed to save guess for game `{game_id}` by `{user_id}`")]
    SaveGuess {
        /// Target game.
        game_id: i64,
        /// Guessing user.
        user_id: String,
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// A guess listing or count query failed.
    #[error("failed to query guesses")]
    QueryGuesses {
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// The ranking point award failed.
    #[error("failed to award ranking point to `{user_id}`")]
    AwardPoint {
        /// Awarded user.
        user_id: String,
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// A ranking listing query failed.
    #[error("failed to query ranking")]
    QueryRanking {
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// A mention opt-out mutation or query failed.
    #[error("failed to access mention opt-outs")]
    OptOuts {
        /// Driver failure.
        #[source]
        source: MongoError,
    },
}
