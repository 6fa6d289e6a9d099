//! # Domain Types
//!
//! Entities as they are stored and as the frontend receives them.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐ 1:N ┌──────────────┐                                 │
//! │  │     Menu     │────►│     Size     │  price, stock (never < 0)       │
//! │  └──────────────┘     └──────┬───────┘                                 │
//! │                              │ referenced by                           │
//! │  ┌──────────────┐ 1:N ┌──────▼───────┐                                 │
//! │  │ SalesHeader  │────►│   SaleItem   │  captured price + names         │
//! │  └──────┬───────┘     └──────────────┘                                 │
//! │         │ 1:1                                                          │
//! │  ┌──────▼────────────┐ 1:1 ┌──────────────┐                            │
//! │  │ LedgerTransaction │◄────│ RawMaterial  │                            │
//! │  │ INCOME / EXPENSE  │     └──────────────┘                            │
//! │  └───────────────────┘  (or neither: is_manual)                        │
//! │                                                                         │
//! │  ┌──────────────┐                                                       │
//! │  │   PreOrder   │  cart not yet applied to stock                       │
//! │  └──────────────┘                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All money columns are whole rupiah (`i64`); the `Money` accessors are the
//! typed view used by planning and rendering code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::PreOrderCart;
use crate::dates::DisplayRange;
use crate::money::Money;

// =============================================================================
// Catalog
// =============================================================================

/// A menu item with its sized variants.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Menu {
    pub id: String,
    pub name: String,
    /// Image URL or data URI.
    pub image: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Loaded separately; sorted by label.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub sizes: Vec<Size>,
}

/// A priced, stocked variant of a menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Size {
    pub id: String,
    pub menu_id: String,
    /// Label shown to the cashier ("Kecil", "Besar", ...).
    pub size: String,
    pub price: i64,
    pub stock: i64,
}

impl Size {
    /// Returns the live catalog price.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_rupiah(self.price)
    }
}

// =============================================================================
// Sales
// =============================================================================

/// One checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesHeader {
    pub id: String,
    pub buyer_name: String,
    /// Always equals the sum of the items' `total`.
    pub total_amount: i64,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SalesHeader {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_rupiah(self.total_amount)
    }
}

/// A line item in a sale.
/// Uses snapshot pattern to freeze catalog data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sales_header_id: String,
    pub menu_id: String,
    pub size_id: String,
    /// Menu name at time of sale (frozen).
    pub menu_name: String,
    /// Size label at time of sale (frozen).
    pub size_name: String,
    /// Unit price at time of sale (frozen).
    pub price: i64,
    pub quantity: i64,
    /// price × quantity.
    pub total: i64,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_rupiah(self.price)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_rupiah(self.total)
    }
}

/// A sale with its items and the INCOME entry mirroring it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleDetail {
    pub header: SalesHeader,
    pub items: Vec<SaleItem>,
    pub transaction: LedgerTransaction,
}

// =============================================================================
// Ledger
// =============================================================================

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: vec!["INCOME".to_string(), "EXPENSE".to_string()],
            }),
        }
    }
}

/// A financial record.
///
/// ## Linkage
/// ```text
/// sales_header_id  raw_material_id  is_manual   meaning
/// ───────────────  ───────────────  ─────────   ─────────────────────────
///      Some             None          false     income mirroring a sale
///      None             Some          false     raw material purchase
///      None             None          true      typed in by hand
/// ```
/// Never both links at once; the schema enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LedgerTransaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: i64,
    pub description: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub sales_header_id: Option<String>,
    pub raw_material_id: Option<String>,
    pub is_manual: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl LedgerTransaction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_rupiah(self.amount)
    }

    /// What owns this entry, if anything.
    pub fn owner(&self) -> TransactionOwner<'_> {
        match (&self.sales_header_id, &self.raw_material_id) {
            (Some(header_id), _) => TransactionOwner::Sale(header_id),
            (None, Some(raw_id)) => TransactionOwner::RawMaterial(raw_id),
            (None, None) => TransactionOwner::Manual,
        }
    }
}

/// Classification used by delete and edit paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOwner<'a> {
    Sale(&'a str),
    RawMaterial(&'a str),
    Manual,
}

impl TransactionOwner<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionOwner::Sale(_) => "sale",
            TransactionOwner::RawMaterial(_) => "raw material",
            TransactionOwner::Manual => "manual entry",
        }
    }
}

// =============================================================================
// Raw Materials
// =============================================================================

/// A purchase of ingredients or packaging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RawMaterial {
    pub id: String,
    pub name: String,
    pub unit_price: i64,
    /// Whole units of `unit` (e.g. 5 kg).
    pub quantity: i64,
    pub unit: String,
    /// unit_price × quantity.
    pub total_price: i64,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl RawMaterial {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_rupiah(self.total_price)
    }
}

// =============================================================================
// Pre-Orders
// =============================================================================

/// Lifecycle of a saved cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PreOrderStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for PreOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreOrderStatus::Pending => write!(f, "pending"),
            PreOrderStatus::Confirmed => write!(f, "confirmed"),
            PreOrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A buyer's cart saved for later. Has not touched stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PreOrder {
    pub id: String,
    pub buyer_name: String,
    pub total_amount: i64,
    pub status: PreOrderStatus,
    pub items: PreOrderCart,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Read Models
// =============================================================================

/// `GET /api/transactions` payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionSummary {
    pub transactions: Vec<LedgerTransaction>,
    pub total_income: i64,
    pub total_expense: i64,
    /// Number of sale line items dated inside the range.
    pub sales_count: i64,
}

/// Financial report for a date range.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Report {
    /// Newest first.
    pub transactions: Vec<LedgerTransaction>,
    /// Sold line items, newest first.
    pub sales: Vec<SaleItem>,
    pub total_income: i64,
    pub total_expense: i64,
    pub net: i64,
    /// Units sold (sum of quantities).
    pub total_sales: i64,
    pub date_range: DisplayRange,
}

impl Report {
    /// Splits entries into (income, expense), order preserved.
    pub fn partition(&self) -> (Vec<&LedgerTransaction>, Vec<&LedgerTransaction>) {
        self.transactions
            .iter()
            .partition(|t| t.kind == TransactionType::Income)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: TransactionType, header: Option<&str>, raw: Option<&str>) -> LedgerTransaction {
        let now = Utc::now();
        LedgerTransaction {
            id: "t1".to_string(),
            kind,
            amount: 10_000,
            description: "x".to_string(),
            date: now,
            sales_header_id: header.map(str::to_string),
            raw_material_id: raw.map(str::to_string),
            is_manual: header.is_none() && raw.is_none(),
            created_at: now,
        }
    }

    #[test]
    fn test_transaction_owner() {
        let sale = entry(TransactionType::Income, Some("h1"), None);
        assert_eq!(sale.owner(), TransactionOwner::Sale("h1"));

        let purchase = entry(TransactionType::Expense, None, Some("r1"));
        assert_eq!(purchase.owner(), TransactionOwner::RawMaterial("r1"));

        let manual = entry(TransactionType::Expense, None, None);
        assert_eq!(manual.owner(), TransactionOwner::Manual);
        assert_eq!(manual.owner().label(), "manual entry");
    }

    #[test]
    fn test_transaction_type_parsing() {
        assert_eq!("income".parse::<TransactionType>().unwrap(), TransactionType::Income);
        assert_eq!("EXPENSE".parse::<TransactionType>().unwrap(), TransactionType::Expense);
        assert!("refund".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_transaction_serializes_type_field() {
        let json = serde_json::to_value(entry(TransactionType::Income, Some("h1"), None)).unwrap();
        assert_eq!(json["type"], "INCOME");
        assert_eq!(json["salesHeaderId"], "h1");
        assert_eq!(json["isManual"], false);
    }

    #[test]
    fn test_preorder_status_default() {
        assert_eq!(PreOrderStatus::default(), PreOrderStatus::Pending);
        assert_eq!(
            serde_json::to_string(&PreOrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }
}
