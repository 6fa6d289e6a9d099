//! # kulino-core: Pure Business Logic for Kulino POS
//!
//! Everything that decides *what* a sale, an edit or a report should look
//! like lives here, as plain functions over plain data. Persisting the
//! decision is `kulino-db`'s job.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Kulino POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Single-page UI (browser)                        │   │
//! │  │   Menu grid ──► Cart ──► Checkout ──► Receipt / Report          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/server (axum)                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kulino-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │ ledger  │ │  dates  │ │ render  │  │   │
//! │  │   │  Menu   │ │  Money  │ │SalePlan │ │DateRange│ │ receipt │  │   │
//! │  │   │  Sale   │ │         │ │         │ │         │ │ report  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 kulino-db (Database Layer)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Stored entities (Menu, Size, SalesHeader, LedgerTransaction, ...)
//! - [`requests`] - Inputs accepted from the API
//! - [`money`] - Integer rupiah arithmetic
//! - [`ledger`] - Sale planning: stock checks, price capture, descriptions
//! - [`cart`] - Pre-order cart encoding at the storage boundary
//! - [`dates`] - Calendar date filters (`YYYY-MM-DD` and `DD/MM/YYYY`)
//! - [`render`] - Printable receipts and reports (HTML, text)
//! - [`pdf`] - The same documents as PDF
//! - [`validation`] - Field-level input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use kulino_core::money::Money;
//!
//! let price = Money::from_rupiah(15_000);
//! let line = price * 3;
//! assert_eq!(line.to_string(), "Rp 45.000");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod dates;
pub mod error;
pub mod ledger;
pub mod money;
pub mod pdf;
pub mod render;
pub mod requests;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::PreOrderCart;
pub use dates::DateRange;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use requests::*;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items accepted in a single sale or pre-order.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Catches typos like 1000 instead of 10 before they eat the whole stock.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price accepted on a size, sale line, cart line or purchase.
///
/// Together with [`MAX_ITEM_QUANTITY`] and [`MAX_CART_ITEMS`] this keeps any
/// sale total far inside i64.
pub const MAX_PRICE: i64 = 1_000_000_000_000;

/// Highest stock level that can be set on a size.
pub const MAX_STOCK: i64 = 1_000_000_000;

/// Highest amount accepted on a manual ledger entry.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Store name printed on receipts when none is configured.
pub const DEFAULT_STORE_NAME: &str = "Kulino Ngemil";
