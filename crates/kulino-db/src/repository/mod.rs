//! # Repository Module
//!
//! Database repository implementations for Kulino POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.sales().edit(&edit)                                        │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── BEGIN IMMEDIATE                                                   │
//! │  ├── read current rows                                                 │
//! │  ├── kulino_core::ledger::plan_sale(...)   ← every decision            │
//! │  ├── apply the plan                                                    │
//! │  └── COMMIT  (or drop → ROLLBACK)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`MenuRepository`](menu::MenuRepository) - Menus and sizes
//! - [`SaleRepository`](sale::SaleRepository) - Sale create/edit/delete
//! - [`LedgerRepository`](ledger::LedgerRepository) - Transactions and reports
//! - [`RawMaterialRepository`](raw_material::RawMaterialRepository) - Purchases
//! - [`PreOrderRepository`](preorder::PreOrderRepository) - Saved carts

use chrono::{DateTime, Utc};

pub mod ledger;
pub mod menu;
pub mod preorder;
pub mod raw_material;
pub mod sale;

/// The instant stamped on every row written by one operation.
pub(crate) fn timestamp() -> DateTime<Utc> {
    kulino_core::dates::truncate_to_seconds(Utc::now())
}

/// Fresh primary key.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
