//! SeaORM-backed stores for the relational backend.
//!
//! Records are soft-deleted: every query filters on `deleted_at IS NULL`
//! and deletion stamps the marker instead of removing the row.

mod sessions;
mod users;

pub use sessions::SeaOrmSessionStore;
pub use users::SeaOrmUserStore;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::config::DatabaseConfig;

pub struct RelationalStore {
    pub conn: DatabaseConnection,
}

impl RelationalStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if let Some(path_str) = config.url.strip_prefix("sqlite:") {
            if path_str != ":memory:" {
                if let Some(parent) = Path::new(path_str).parent() {
                    tokio::fs::create_dir_all(parent).await.ok();
                }
                if !Path::new(path_str).exists() {
                    std::fs::File::create(path_str)?;
                }
            }
        }

        let mut opt = ConnectOptions::new(config.url.clone());
        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        super::migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            config.min_connections, config.max_connections
        );

        Ok(Self { conn })
    }
}

/// Timestamps are persisted as RFC 3339 strings.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| anyhow::anyhow!("Invalid stored timestamp {raw:?}: {e}"))?;
    Ok(parsed.with_timezone(&Utc))
}

pub(crate) fn parse_optional_timestamp(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(parse_timestamp).transpose()
}
