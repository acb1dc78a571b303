use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

/// Database used when `MONGO_DB` is not provided.
pub const DEFAULT_DATABASE: &str = "quiz_bot";
/// Server used when `MONGO_URI` is not provided.
pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
const DEFAULT_CONNECT_ATTEMPTS: u32 = 10;
const APP_NAME: &str = "quiz-bot-back";

/// Connection settings of the MongoDB quiz store.
#[derive(Clone, Debug)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
    /// Pings tried before a connection attempt is given up.
    pub connect_attempts: u32,
}

impl MongoConfig {
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let mut options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;
        options.app_name.get_or_insert_with(|| APP_NAME.to_owned());

        Ok(Self {
            options,
            database_name: db_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(DEFAULT_DATABASE)
                .to_owned(),
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
        })
    }

    /// Read `MONGO_URI`, `MONGO_DB` and `MONGO_CONNECT_ATTEMPTS`, all optional.
    pub async fn from_env() -> MongoResult<Self> {
        let uri = std::env::var("MONGO_URI").unwrap_or_else(|_| DEFAULT_URI.to_owned());
        let db = std::env::var("MONGO_DB").ok();
        let mut config = Self::from_uri(&uri, db.as_deref()).await?;
        if let Some(attempts) = std::env::var("MONGO_CONNECT_ATTEMPTS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
        {
            config.connect_attempts = attempts.max(1);
        }
        Ok(config)
    }
}
