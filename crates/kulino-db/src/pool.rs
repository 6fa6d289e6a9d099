//! # Store Database
//!
//! Opens the Kulino SQLite file and hands out repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ServerConfig ──► DbConfig ──► Database::new ──► migrations            │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │                    SqlitePool (WAL, foreign_keys=ON)                    │
//! │                                      │                                  │
//! │          ┌──────────┬───────────────┼─────────────┬──────────────┐      │
//! │          ▼          ▼               ▼             ▼              ▼      │
//! │       menus()    sales()         ledger()   raw_materials()  preorders()│
//! │                                                                         │
//! │  Readers share the pool freely. Every mutation opens BEGIN IMMEDIATE,  │
//! │  so two checkouts touching one size's stock are serialized by SQLite  │
//! │  itself; the second waits up to busy_timeout for the first.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::ledger::LedgerRepository;
use crate::repository::menu::MenuRepository;
use crate::repository::preorder::PreOrderRepository;
use crate::repository::raw_material::RawMaterialRepository;
use crate::repository::sale::SaleRepository;

const MEMORY_PATH: &str = ":memory:";

/// Recycle file-backed connections after this long.
const CONNECTION_LIFETIME: Duration = Duration::from_secs(30 * 60);

// =============================================================================
// Configuration
// =============================================================================

/// Where the store database lives and how the pool around it behaves.
///
/// ```rust,ignore
/// let config = DbConfig::new(data_dir.join("kulino.db"))
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, or `:memory:` for a throwaway store.
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Wait for a free pooled connection.
    pub acquire_timeout: Duration,
    /// `None` keeps idle connections open; an in-memory store vanishes with
    /// its last connection.
    pub idle_timeout: Option<Duration>,
    /// Wait for SQLite's write lock before a checkout reports busy.
    pub busy_timeout: Duration,
    pub apply_migrations: bool,
}

impl DbConfig {
    /// File-backed store with the defaults the server ships with.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(10 * 60)),
            busy_timeout: Duration::from_secs(5),
            apply_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }

    /// Private store for tests.
    ///
    /// A single connection: each SQLite memory connection is a separate
    /// database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: None,
            busy_timeout: Duration::from_secs(5),
            apply_migrations: true,
        }
    }

    fn is_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the store. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the store and brings its schema up to date.
    ///
    /// File stores run in WAL mode with `synchronous = NORMAL`. Foreign keys
    /// are switched on for every connection; sale items and ledger links rely
    /// on them.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening store database");

        let connect_options = if config.is_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        }
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.idle_timeout.map(|_| CONNECTION_LIFETIME))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database { pool };
        if config.apply_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations; already-applied ones are skipped.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Menus and their sizes.
    pub fn menus(&self) -> MenuRepository {
        MenuRepository::new(self.pool.clone())
    }

    /// Sales: checkout, edit, delete.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Ledger entries and summaries.
    pub fn ledger(&self) -> LedgerRepository {
        LedgerRepository::new(self.pool.clone())
    }

    /// Ingredient purchases.
    pub fn raw_materials(&self) -> RawMaterialRepository {
        RawMaterialRepository::new(self.pool.clone())
    }

    /// Pre-orders and their conversion.
    pub fn preorders(&self) -> PreOrderRepository {
        PreOrderRepository::new(self.pool.clone())
    }

    /// Deletes every row in every table, children first, in one unit.
    pub async fn reset_all(&self) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        for table in [
            "ledger_transactions",
            "sale_items",
            "sales_headers",
            "raw_materials",
            "preorders",
            "sizes",
            "menus",
        ] {
            let deleted = sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?
                .rows_affected();
            debug!(table, deleted, "Table cleared");
        }

        tx.commit().await?;
        info!("Database reset");
        Ok(())
    }

    /// Waits for checked-out connections and closes the pool.
    pub async fn close(&self) {
        info!("Closing store database");
        self.pool.close().await;
    }

    /// `true` when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

/// Opens a write unit of work.
///
/// `BEGIN IMMEDIATE` takes SQLite's write lock up front, so two units that
/// read-then-decrement the same stock row run one after the other instead of
/// both reading the old value. Dropping the transaction without `commit()`
/// rolls everything back.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

// =============================================================================
// Unit Tests
// =============================================================================
