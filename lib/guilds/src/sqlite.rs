//! Guild list stored in a SQLite table.

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use studentrun_core::{GuildRecord, Result};
use tracing::{debug, instrument};

use crate::error::GuildStoreError;
use crate::source::GuildSource;

/// Embedded schema migrations for the guild table.
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Row type for guild queries.
///
/// Every column is nullable in the bot-maintained table.
#[derive(FromRow)]
struct GuildRow {
    link: Option<String>,
    name: Option<String>,
    server_id: Option<String>,
    icon_hash: Option<String>,
    range: Option<String>,
}

impl GuildRow {
    /// Returns `None` for rows without an invite link.
    fn into_record(self) -> Option<GuildRecord> {
        let link = self.link.filter(|l| !l.is_empty())?;
        Some(GuildRecord::new(
            link,
            self.name.unwrap_or_default(),
            self.server_id.unwrap_or_default(),
            self.icon_hash.unwrap_or_default(),
            self.range.unwrap_or_default(),
        ))
    }
}

/// A guild source reading the `guilds` table on every request.
#[derive(Debug, Clone)]
pub struct SqliteGuildSource {
    pool: SqlitePool,
}

impl SqliteGuildSource {
    /// Opens the database at `url`, creating the file if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the database cannot be opened.
    pub async fn connect(url: &str) -> Result<Self, GuildStoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| GuildStoreError::InvalidUrl {
                details: e.to_string(),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| GuildStoreError::ConnectionFailed {
                details: e.to_string(),
            })?;

        Ok(Self::from_pool(pool))
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the guild table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails to apply.
    pub async fn ensure_schema(&self) -> Result<(), GuildStoreError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| GuildStoreError::MigrationFailed {
                details: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl GuildSource for SqliteGuildSource {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    #[instrument(skip(self))]
    async fn fetch_all(&self) -> Result<Vec<GuildRecord>, GuildStoreError> {
        let rows: Vec<GuildRow> = sqlx::query_as(
            r#"
            SELECT link, name, server_id, icon_hash, "range"
            FROM guilds
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GuildStoreError::QueryFailed {
            details: e.to_string(),
        })?;

        let total = rows.len();
        let guilds: Vec<GuildRecord> = rows.into_iter().filter_map(GuildRow::into_record).collect();
        debug!(rows = total, guilds = guilds.len(), "Loaded guilds");

        Ok(guilds)
    }
}
