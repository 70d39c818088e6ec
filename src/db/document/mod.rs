//! MongoDB-backed stores for the document backend.
//!
//! Session records are hard-deleted here (the relational backend
//! soft-deletes instead; a deliberate retention-policy difference). User
//! records are soft-deleted in both backends.

mod sessions;
mod users;

pub use sessions::MongoSessionStore;
pub use users::MongoUserStore;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mongodb::Client;
use mongodb::bson::DateTime as BsonDateTime;
use tracing::info;

use crate::config::DatabaseConfig;

pub struct DocumentStore {
    pub db: mongodb::Database,
}

impl DocumentStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let client = Client::with_uri_str(&config.url)
            .await
            .context("Failed to connect to MongoDB")?;

        info!("Document database connected: {}", config.database_name);

        Ok(Self {
            db: client.database(&config.database_name),
        })
    }
}

/// BSON datetimes carry millisecond precision; domain timestamps created by
/// the document stores are always produced through this pair, so mapping
/// round-trips exactly.
pub(crate) fn to_bson_datetime(value: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(value.timestamp_millis())
}

pub(crate) fn to_chrono_datetime(value: BsonDateTime) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis())
        .ok_or_else(|| anyhow::anyhow!("Stored datetime out of range: {value}"))
}

pub(crate) fn bson_now() -> BsonDateTime {
    to_bson_datetime(Utc::now())
}
