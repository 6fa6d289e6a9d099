//! # Application State
//!
//! Shared by every handler through axum's `State` extractor.
//!
//! ## Thread Safety
//! `Database` wraps a `SqlitePool`, which is already `Clone + Send + Sync`.
//! Requests run concurrently; write ordering is settled inside SQLite by
//! `BEGIN IMMEDIATE`, not here.

use std::sync::Arc;

use kulino_core::render::StoreInfo;
use kulino_db::Database;

/// Handler state: the database and the store identity for documents.
#[derive(Debug, Clone)]
pub struct AppState {
    db: Database,
    store: Arc<StoreInfo>,
}

impl AppState {
    pub fn new(db: Database, store: StoreInfo) -> Self {
        AppState {
            db,
            store: Arc::new(store),
        }
    }

    /// Returns the database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Returns the store printed on receipts and reports.
    pub fn store(&self) -> &StoreInfo {
        &self.store
    }
}
