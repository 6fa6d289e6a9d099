//! # kulino-db: Database Layer for Kulino POS
//!
//! SQLite storage for the catalog, sales, ledger, purchases and pre-orders.
//! Every multi-row change is one transaction; a unit either commits whole
//! or leaves the database untouched.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kulino POS Data Flow                             │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kulino-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ MenuRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo      │    │ 001_initial  │  │   │
//! │  │   │ BEGIN         │    │ LedgerRepo    │    │ _schema.sql  │  │   │
//! │  │   │ IMMEDIATE     │    │ RawMaterial   │    │              │  │   │
//! │  │   │               │    │ PreOrderRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │ plan_sale()                   │   │
//! │  │                                ▼                               │   │
//! │  │                         kulino-core                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (kulino.db)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kulino_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("kulino.db")).await?;
//! let sale = db.sales().create(&new_sale).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::ledger::LedgerRepository;
pub use repository::menu::MenuRepository;
pub use repository::preorder::PreOrderRepository;
pub use repository::raw_material::RawMaterialRepository;
pub use repository::sale::SaleRepository;
