//! MongoDB-backed [`PoolStore`] with atomic `findOneAndUpdate` primitives
//! for the sequence counter, guess upserts and the settlement claim.

use std::{collections::HashSet, sync::Arc};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database,
    bson::doc,
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoCounterDocument, MongoGameDocument, MongoGuessDocument, MongoOptOutDocument,
        MongoRankingDocument, bson_datetime,
    },
};
use crate::dao::{
    models::{GameEntity, GameStatus, GuessEntity, RankingEntity},
    pool_store::PoolStore,
    storage::StorageResult,
};
use chrono::{DateTime, Utc};

const GAME_COLLECTION: &str = "pool_games";
const GUESS_COLLECTION: &str = "pool_guesses";
const RANKING_COLLECTION: &str = "pool_rankings";
const COUNTER_COLLECTION: &str = "counters";
const OPT_OUT_COLLECTION: &str = "mention_optouts";

/// MongoDB implementation of the pool store.
#[derive(Clone)]
pub struct MongoPoolStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoPoolStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = establish_connection(&config.options, &config.database_name).await?;

        let store = Self {
            inner: Arc::new(MongoInner {
                database: RwLock::new(database),
                config,
            }),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Create the unique indexes that enforce the data model's identity
    /// constraints at the database level.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        create_index(
            &database.collection::<MongoGameDocument>(GAME_COLLECTION),
            doc! {"game_id": 1},
            "game_id_idx",
            true,
            (GAME_COLLECTION, "game_id"),
        )
        .await?;
        create_index(
            &database.collection::<MongoGameDocument>(GAME_COLLECTION),
            doc! {"group_id": 1, "status": 1},
            "game_group_status_idx",
            false,
            (GAME_COLLECTION, "group_id,status"),
        )
        .await?;
        create_index(
            &database.collection::<MongoGuessDocument>(GUESS_COLLECTION),
            doc! {"group_id": 1, "user_id": 1, "game_id": 1},
            "guess_identity_idx",
            true,
            (GUESS_COLLECTION, "group_id,user_id,game_id"),
        )
        .await?;
        create_index(
            &database.collection::<MongoRankingDocument>(RANKING_COLLECTION),
            doc! {"group_id": 1, "user_id": 1},
            "ranking_identity_idx",
            true,
            (RANKING_COLLECTION, "group_id,user_id"),
        )
        .await?;
        create_index(
            &database.collection::<MongoOptOutDocument>(OPT_OUT_COLLECTION),
            doc! {"user_id": 1},
            "opt_out_user_idx",
            true,
            (OPT_OUT_COLLECTION, "user_id"),
        )
        .await?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.database.read().await;
        guard.clone()
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        self.database().await.collection(GAME_COLLECTION)
    }

    async fn guesses(&self) -> Collection<MongoGuessDocument> {
        self.database().await.collection(GUESS_COLLECTION)
    }

    async fn rankings(&self) -> Collection<MongoRankingDocument> {
        self.database().await.collection(RANKING_COLLECTION)
    }

    async fn counters(&self) -> Collection<MongoCounterDocument> {
        self.database().await.collection(COUNTER_COLLECTION)
    }

    async fn opt_outs(&self) -> Collection<MongoOptOutDocument> {
        self.database().await.collection(OPT_OUT_COLLECTION)
    }

    async fn ping(&self) -> MongoResult<()> {
        let database = self.database().await;
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database = establish_connection(
            &self.inner.config.options,
            &self.inner.config.database_name,
        )
        .await?;
        let mut guard = self.inner.database.write().await;
        *guard = database;
        Ok(())
    }

    async fn next_sequence(&self, name: String) -> MongoResult<i64> {
        let counters = self.counters().await;
        let counter = counters
            .find_one_and_update(doc! {"_id": &name}, doc! {"$inc": {"seq": 1_i64}})
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::NextSequence {
                sequence: name.clone(),
                source,
            })?;

        // With upsert + return-after the document always exists; treat an
        // absent result as a backend failure rather than panicking.
        counter
            .map(|doc| doc.seq)
            .ok_or(MongoDaoError::SequenceMissing { sequence: name })
    }

    async fn insert_game(&self, game: GameEntity) -> MongoResult<()> {
        let game_id = game.game_id;
        let document = MongoGameDocument::from(game);
        self.games()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveGame { game_id, source })?;
        Ok(())
    }

    async fn find_game(&self, game_id: i64) -> MongoResult<Option<GameEntity>> {
        let document = self
            .games()
            .await
            .find_one(doc! {"game_id": game_id})
            .await
            .map_err(|source| MongoDaoError::LoadGame { game_id, source })?;
        Ok(document.map(Into::into))
    }

    async fn find_game_in_group(
        &self,
        game_id: i64,
        group_id: String,
    ) -> MongoResult<Option<GameEntity>> {
        let document = self
            .games()
            .await
            .find_one(doc! {"game_id": game_id, "group_id": group_id})
            .await
            .map_err(|source| MongoDaoError::LoadGame { game_id, source })?;
        Ok(document.map(Into::into))
    }

    async fn list_games(&self, filter: mongodb::bson::Document) -> MongoResult<Vec<GameEntity>> {
        let documents: Vec<MongoGameDocument> = self
            .games()
            .await
            .find(filter)
            .sort(doc! {"kickoff_at": 1})
            .await
            .map_err(|source| MongoDaoError::QueryGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryGames { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn claim_settlement(
        &self,
        game_id: i64,
        home_score: u8,
        away_score: u8,
    ) -> MongoResult<Option<GameEntity>> {
        let updated = self
            .games()
            .await
            .find_one_and_update(
                doc! {"game_id": game_id, "status": GameStatus::Scheduled.as_str()},
                doc! {"$set": {
                    "status": GameStatus::Finished.as_str(),
                    "home_score": i32::from(home_score),
                    "away_score": i32::from(away_score),
                }},
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::SettleGame { game_id, source })?;
        Ok(updated.map(Into::into))
    }

    async fn mark_reminder_sent(&self, game_id: i64) -> MongoResult<()> {
        self.games()
            .await
            .update_one(
                doc! {"game_id": game_id},
                doc! {"$set": {"reminder_sent": true}},
            )
            .await
            .map_err(|source| MongoDaoError::MarkReminder { game_id, source })?;
        Ok(())
    }

    async fn upsert_guess(&self, guess: GuessEntity) -> MongoResult<()> {
        let game_id = guess.game_id;
        let user_id = guess.user_id.clone();
        let filter = doc! {
            "group_id": &guess.group_id,
            "user_id": &guess.user_id,
            "game_id": guess.game_id,
        };
        let update = doc! {"$set": {
            "display_name": &guess.display_name,
            "home_guess": i32::from(guess.home_guess),
            "away_guess": i32::from(guess.away_guess),
            "guessed_at": bson_datetime(guess.guessed_at),
        }};

        self.guesses()
            .await
            .find_one_and_update(filter, update)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveGuess {
                game_id,
                user_id,
                source,
            })?;
        Ok(())
    }

    async fn guesses_for_game(
        &self,
        game_id: i64,
        group_id: String,
    ) -> MongoResult<Vec<GuessEntity>> {
        let documents: Vec<MongoGuessDocument> = self
            .guesses()
            .await
            .find(doc! {"game_id": game_id, "group_id": group_id})
            .sort(doc! {"display_name": 1})
            .await
            .map_err(|source| MongoDaoError::QueryGuesses { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryGuesses { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn guesses_for_user(
        &self,
        group_id: String,
        user_id: String,
    ) -> MongoResult<Vec<GuessEntity>> {
        let documents: Vec<MongoGuessDocument> = self
            .guesses()
            .await
            .find(doc! {"group_id": group_id, "user_id": user_id})
            .sort(doc! {"game_id": 1})
            .await
            .map_err(|source| MongoDaoError::QueryGuesses { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryGuesses { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn count_guesses_for_user(
        &self,
        group_id: String,
        user_id: String,
    ) -> MongoResult<u64> {
        self.guesses()
            .await
            .count_documents(doc! {"group_id": group_id, "user_id": user_id})
            .await
            .map_err(|source| MongoDaoError::QueryGuesses { source })
    }

    async fn award_point(
        &self,
        group_id: String,
        user_id: String,
        display_name: String,
    ) -> MongoResult<()> {
        self.rankings()
            .await
            .update_one(
                doc! {"group_id": group_id, "user_id": &user_id},
                doc! {
                    "$inc": {"total_points": 1_i32},
                    "$set": {"display_name": display_name},
                },
            )
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::AwardPoint { user_id, source })?;
        Ok(())
    }

    async fn group_ranking(&self, group_id: String) -> MongoResult<Vec<RankingEntity>> {
        let documents: Vec<MongoRankingDocument> = self
            .rankings()
            .await
            .find(doc! {"group_id": group_id})
            .sort(doc! {"total_points": -1, "display_name": 1})
            .await
            .map_err(|source| MongoDaoError::QueryRanking { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryRanking { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn add_mention_opt_out(&self, user_id: String) -> MongoResult<()> {
        self.opt_outs()
            .await
            .update_one(
                doc! {"user_id": &user_id},
                doc! {"$setOnInsert": {"user_id": &user_id}},
            )
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::OptOuts { source })?;
        Ok(())
    }

    async fn remove_mention_opt_out(&self, user_id: String) -> MongoResult<()> {
        self.opt_outs()
            .await
            .delete_one(doc! {"user_id": user_id})
            .await
            .map_err(|source| MongoDaoError::OptOuts { source })?;
        Ok(())
    }

    async fn mention_opt_outs(&self) -> MongoResult<HashSet<String>> {
        let documents: Vec<MongoOptOutDocument> = self
            .opt_outs()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::OptOuts { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::OptOuts { source })?;
        Ok(documents.into_iter().map(|doc| doc.user_id).collect())
    }
}

async fn create_index<T: Send + Sync>(
    collection: &Collection<T>,
    keys: mongodb::bson::Document,
    name: &str,
    unique: bool,
    context: (&'static str, &'static str),
) -> MongoResult<()> {
    let index = mongodb::IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(Some(name.to_owned()))
                .unique(Some(unique))
                .build(),
        )
        .build();

    collection
        .create_index(index)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection: context.0,
            index: context.1,
            source,
        })?;
    Ok(())
}

impl PoolStore for MongoPoolStore {
    fn next_sequence(&self, name: &str) -> BoxFuture<'static, StorageResult<i64>> {
        let store = self.clone();
        let name = name.to_owned();
        Box::pin(async move { store.next_sequence(name).await.map_err(Into::into) })
    }

    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_game(game).await.map_err(Into::into) })
    }

    fn find_game(&self, game_id: i64) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(game_id).await.map_err(Into::into) })
    }

    fn find_game_in_group(
        &self,
        game_id: i64,
        group_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        let group_id = group_id.to_owned();
        Box::pin(async move {
            store
                .find_game_in_group(game_id, group_id)
                .await
                .map_err(Into::into)
        })
    }

    fn games_open_for_guessing(
        &self,
        group_id: &str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        let filter = doc! {
            "group_id": group_id,
            "status": GameStatus::Scheduled.as_str(),
            "guess_deadline": {"$gt": bson_datetime(now)},
        };
        Box::pin(async move { store.list_games(filter).await.map_err(Into::into) })
    }

    fn games_awaiting_result(
        &self,
        group_id: &str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        let filter = doc! {
            "group_id": group_id,
            "status": GameStatus::Scheduled.as_str(),
            "kickoff_at": {"$lt": bson_datetime(now)},
        };
        Box::pin(async move { store.list_games(filter).await.map_err(Into::into) })
    }

    fn games_needing_reminder(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        let filter = doc! {
            "status": GameStatus::Scheduled.as_str(),
            "reminder_sent": {"$ne": true},
            "guess_deadline": {
                "$gte": bson_datetime(from),
                "$lte": bson_datetime(until),
            },
        };
        Box::pin(async move { store.list_games(filter).await.map_err(Into::into) })
    }

    fn mark_reminder_sent(&self, game_id: i64) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.mark_reminder_sent(game_id).await.map_err(Into::into) })
    }

    fn claim_settlement(
        &self,
        game_id: i64,
        home_score: u8,
        away_score: u8,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .claim_settlement(game_id, home_score, away_score)
                .await
                .map_err(Into::into)
        })
    }

    fn upsert_guess(&self, guess: GuessEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_guess(guess).await.map_err(Into::into) })
    }

    fn guesses_for_game(
        &self,
        game_id: i64,
        group_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GuessEntity>>> {
        let store = self.clone();
        let group_id = group_id.to_owned();
        Box::pin(async move {
            store
                .guesses_for_game(game_id, group_id)
                .await
                .map_err(Into::into)
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
            store
                .guesses_for_user(group_id, user_id)
                .await
                .map_err(Into::into)
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
            store
                .count_guesses_for_user(group_id, user_id)
                .await
                .map_err(Into::into)
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
            store
                .award_point(group_id, user_id, display_name)
                .await
                .map_err(Into::into)
        })
    }

    fn group_ranking(
        &self,
        group_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<RankingEntity>>> {
        let store = self.clone();
        let group_id = group_id.to_owned();
        Box::pin(async move { store.group_ranking(group_id).await.map_err(Into::into) })
    }

    fn add_mention_opt_out(&self, user_id: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let user_id = user_id.to_owned();
        Box::pin(async move { store.add_mention_opt_out(user_id).await.map_err(Into::into) })
    }

    fn remove_mention_opt_out(&self, user_id: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let user_id = user_id.to_owned();
        Box::pin(async move {
            store
                .remove_mention_opt_out(user_id)
                .await
                .map_err(Into::into)
        })
    }

    fn mention_opt_outs(&self) -> BoxFuture<'static, StorageResult<HashSet<String>>> {
        let store = self.clone();
        Box::pin(async move { store.mention_opt_outs().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.reconnect().await.map_err(Into::into) })
    }
}
