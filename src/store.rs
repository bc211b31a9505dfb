//! SQLite persistence for the rate book and the admin session.

use std::str::FromStr;

use log::{debug, info};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;

use crate::error::Result;
use crate::exchange_rate::ExchangeRate;
use crate::rate_book::RateBook;

const ACCESS_TOKEN_KEY: &str = "currex_admin_token";
const REFRESH_TOKEN_KEY: &str = "currex_admin_refresh_token";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS rate_snapshots (
        id TEXT PRIMARY KEY,
        position INTEGER NOT NULL,
        is_current BOOLEAN NOT NULL,
        body TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )",
];

#[derive(Debug, FromRow)]
struct SnapshotRow {
    is_current: bool,
    body: String,
}

/// Access and refresh tokens of the admin session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminTokens {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

#[derive(Clone)]
pub struct RateStore {
    pool: SqlitePool,
}

impl RateStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = pool_options(database_url).connect_with(options).await?;

        for statement in SCHEMA.iter().copied() {
            sqlx::query(statement).execute(&pool).await?;
        }
        info!("Rate store ready at {}", database_url);

        Ok(RateStore { pool })
    }

    /// The persisted book, or the seeded one when nothing was saved yet.
    pub async fn load_book(&self) -> Result<RateBook> {
        let rows: Vec<SnapshotRow> = sqlx::query_as(
            "SELECT is_current, body FROM rate_snapshots ORDER BY position ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            debug!("No saved rates, using the seeded book");
            return Ok(RateBook::seeded());
        }

        let mut book = RateBook::default();
        for row in rows {
            let rate: ExchangeRate = serde_json::from_str(&row.body)?;
            if row.is_current {
                book.current = Some(rate);
            } else {
                book.history.push(rate);
            }
        }

        Ok(book)
    }

    pub async fn save_book(&self, book: &RateBook) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM rate_snapshots")
            .execute(&mut *tx)
            .await?;

        let entries = book
            .current
            .iter()
            .map(|rate| (rate, true))
            .chain(book.history.iter().map(|rate| (rate, false)));

        for (position, (rate, is_current)) in entries.enumerate() {
            let body = serde_json::to_string(rate)?;
            sqlx::query(
                "INSERT OR REPLACE INTO rate_snapshots (id, position, is_current, body) VALUES (?, ?, ?, ?)",
            )
            .bind(&rate.id)
            .bind(position as i64)
            .bind(is_current)
            .bind(body)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(
            "Saved rate book with {} history entries",
            book.history.len()
        );
        Ok(())
    }

    pub async fn load_tokens(&self) -> Result<AdminTokens> {
        Ok(AdminTokens {
            access: self.get_setting(ACCESS_TOKEN_KEY).await?,
            refresh: self.get_setting(REFRESH_TOKEN_KEY).await?,
        })
    }

    pub async fn save_tokens(&self, tokens: &AdminTokens) -> Result<()> {
        match &tokens.access {
            Some(access) => self.set_setting(ACCESS_TOKEN_KEY, access).await?,
            None => self.delete_setting(ACCESS_TOKEN_KEY).await?,
        }
        match &tokens.refresh {
            Some(refresh) => self.set_setting(REFRESH_TOKEN_KEY, refresh).await?,
            None => self.delete_setting(REFRESH_TOKEN_KEY).await?,
        }
        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.map(|(value,)| value))
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_setting(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Every connection to an in-memory database is a separate database, so the
/// pool keeps exactly one connection and never recycles it.
fn pool_options(database_url: &str) -> SqlitePoolOptions {
    if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_pool_never_recycles_its_connection() {
        let options = pool_options("sqlite::memory:");
        assert_eq!(options.get_max_connections(), 1);
        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_max_lifetime(), None);

        let options = pool_options("sqlite://currex.db?mode=rwc");
        assert_eq!(options.get_max_connections(), 5);
        assert!(options.get_idle_timeout().is_some());
    }
}
