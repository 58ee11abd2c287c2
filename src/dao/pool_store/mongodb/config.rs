use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

/// Default database name when no override is configured.
const DEFAULT_DB: &str = "bolao_bot";

/// Parsed MongoDB connection settings.
#[derive(Clone)]
pub struct MongoConfig {
    /// Parsed client options derived from the connection URI.
    pub options: ClientOptions,
    /// Target database name.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse a connection URI, optionally overriding the database name.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or(DEFAULT_DB).to_owned();
        let options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;

        Ok(Self {
            options,
            database_name,
        })
    }
}
