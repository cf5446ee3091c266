use crate::config::Config;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use std::time::Duration;
use tracing::{debug, info};

pub mod schema;

const IN_MEMORY: &str = ":memory:";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("connection pool: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("blocking database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRecord {
    pub id: i64,
    pub guild_id: String,
    pub keyword: String,
    pub response: String,
}

#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    pub fn new(config: &Config) -> DbResult<Self> {
        Self::open(&config.database_url, config.database_pool_size)
    }

    /// Opens a pooled database at `path`.
    ///
    /// Every SQLite `:memory:` connection is a separate database, so an
    /// in-memory pool is pinned to a single long-lived connection.
    pub fn open(path: &str, pool_size: u32) -> DbResult<Self> {
        let builder = Pool::builder();
        let pool = if path == IN_MEMORY {
            let manager = SqliteConnectionManager::memory().with_init(|conn| {
                conn.busy_timeout(BUSY_TIMEOUT)?;
                conn.execute_batch("PRAGMA foreign_keys = ON;")
            });
            builder
                .max_size(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .build(manager)?
        } else {
            let manager = SqliteConnectionManager::file(path).with_init(|conn| {
                conn.busy_timeout(BUSY_TIMEOUT)?;
                conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
            });
            builder.max_size(pool_size.max(1)).build(manager)?
        };

        debug!("Database: Opened pool for {}", path);
        Ok(Self { pool })
    }

    fn conn(&self) -> DbResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    pub fn execute_init(&self) -> DbResult<()> {
        info!("Database: Initializing schema...");
        let conn = self.conn()?;
        conn.execute_batch(schema::SCHEMA)?;
        debug!("Database: Schema initialized successfully");
        Ok(())
    }

    /// Runs `f` on the blocking thread pool with its own handle to the database.
    pub async fn run_blocking<T, F>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Database) -> DbResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db)).await?
    }

    // --- Filters ---

    /// Inserts a filter or replaces the response of the existing one with the
    /// same `(guild_id, keyword)`. Returns the row id either way.
    pub fn upsert_filter(&self, guild_id: &str, keyword: &str, response: &str) -> DbResult<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = tx.query_row(
            "INSERT INTO filters (guild_id, keyword, response)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(guild_id, keyword) DO UPDATE
                SET response = excluded.response, updated_at = CURRENT_TIMESTAMP
             RETURNING id",
            params![guild_id, keyword, response],
            |row| row.get(0),
        )?;
        tx.commit()?;
        debug!("Database: Upserted filter {} in guild {}", id, guild_id);
        Ok(id)
    }

    pub fn get_filter(&self, guild_id: &str, id: i64) -> DbResult<Option<FilterRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT id, guild_id, keyword, response FROM filters
                 WHERE id = ?1 AND guild_id = ?2",
                params![id, guild_id],
                map_filter_row,
            )
            .optional()?;
        Ok(record)
    }

    pub fn list_filters(&self, guild_id: &str) -> DbResult<Vec<FilterRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, guild_id, keyword, response FROM filters
             WHERE guild_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([guild_id], map_filter_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    pub fn delete_filter(&self, guild_id: &str, keyword: &str) -> DbResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let count = tx.execute(
            "DELETE FROM filters WHERE guild_id = ?1 AND keyword = ?2",
            params![guild_id, keyword],
        )?;
        tx.commit()?;
        Ok(count)
    }

    pub fn delete_guild_filters(&self, guild_id: &str) -> DbResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let count = tx.execute("DELETE FROM filters WHERE guild_id = ?1", [guild_id])?;
        tx.commit()?;
        Ok(count)
    }
}

fn map_filter_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FilterRecord> {
    Ok(FilterRecord {
        id: row.get(0)?,
        guild_id: row.get(1)?,
        keyword: row.get(2)?,
        response: row.get(3)?,
    })
}
