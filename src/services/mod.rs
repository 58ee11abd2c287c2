/// Mention opt-out registry and mention helpers.
pub mod mentions;
/// Pool settlement engine: game creation, guesses, settlement, rankings.
pub mod pool;
/// Guess-deadline reminder sweep.
pub mod reminder;
/// Storage persistence supervisor with reconnect and degraded mode.
pub mod storage_supervisor;
