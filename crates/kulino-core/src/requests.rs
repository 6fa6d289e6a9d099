//! # Request Types
//!
//! Inputs accepted from the HTTP layer. Each has a `validate()` that runs
//! before any repository call, so malformed input never opens a transaction.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{CartLine, PreOrderCart};
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PreOrderStatus, TransactionType};
use crate::validation::{
    validate_amount, validate_cart_size, validate_name, validate_price, validate_quantity,
    validate_stock, ValidationResult,
};

// =============================================================================
// Sales
// =============================================================================

/// One requested line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItemRequest {
    pub size_id: String,
    pub quantity: i64,
    /// Price to capture. When omitted the previous captured price (edits)
    /// or the live catalog price is used.
    #[serde(default)]
    pub price: Option<i64>,
}

/// `POST /api/sales` body.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewSale {
    pub buyer_name: String,
    pub items: Vec<SaleItemRequest>,
}

impl NewSale {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("buyerName", &self.buyer_name)?;
        validate_sale_items(&self.items)
    }
}

/// `PUT /api/sales` body: a full replacement of the item set.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleEdit {
    pub sales_header_id: String,
    pub buyer_name: String,
    pub items: Vec<SaleItemRequest>,
}

impl SaleEdit {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.sales_header_id.trim().is_empty() {
            return Err(ValidationError::required("salesHeaderId"));
        }
        validate_name("buyerName", &self.buyer_name)?;
        validate_sale_items(&self.items)
    }
}

fn validate_sale_items(items: &[SaleItemRequest]) -> ValidationResult<()> {
    validate_cart_size(items.len())?;
    for item in items {
        if item.size_id.trim().is_empty() {
            return Err(ValidationError::required("sizeId"));
        }
        validate_quantity(item.quantity)?;
        if let Some(price) = item.price {
            validate_price(price)?;
        }
    }
    Ok(())
}

// =============================================================================
// Menus
// =============================================================================

/// A size row in a menu create/update body. `id` is present for sizes that
/// already exist.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SizeInput {
    #[serde(default)]
    pub id: Option<String>,
    pub size: String,
    pub price: i64,
    #[serde(default)]
    pub stock: i64,
}

/// `POST /api/menus` body (and `PUT` with `id`).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MenuInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub sizes: Vec<SizeInput>,
}

impl MenuInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        if self.sizes.is_empty() {
            return Err(ValidationError::required("sizes"));
        }
        for size in &self.sizes {
            validate_name("size", &size.size)?;
            validate_price(size.price)?;
            validate_stock(size.stock)?;
        }
        Ok(())
    }
}

// =============================================================================
// Raw Materials
// =============================================================================

/// `POST /api/raw-materials` body (and `PUT` with `id`).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RawMaterialInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i64,
    pub unit: String,
    /// Calendar date (`YYYY-MM-DD` or `DD/MM/YYYY`); defaults to now.
    #[serde(default)]
    pub date: Option<String>,
}

impl RawMaterialInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_name("unit", &self.unit)?;
        validate_price(self.unit_price)?;
        validate_quantity(self.quantity)
    }

    /// unit_price × quantity, refused when it does not fit in i64.
    pub fn total_price(&self) -> ValidationResult<i64> {
        Money::from_rupiah(self.unit_price)
            .checked_mul(self.quantity)
            .map(|total| total.rupiah())
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "totalPrice".to_string(),
                min: 0,
                max: i64::MAX,
            })
    }
}

// =============================================================================
// Manual Transactions
// =============================================================================

/// `POST /api/transactions` body (and `PUT` with `id`).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ManualTransactionInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: i64,
    pub description: String,
    #[serde(default)]
    pub date: Option<String>,
}

impl ManualTransactionInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_amount(self.amount)?;
        validate_name("description", &self.description)
    }
}

// =============================================================================
// Pre-Orders
// =============================================================================

/// `POST /api/preorders` body.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewPreOrder {
    pub buyer_name: String,
    pub items: Vec<CartLine>,
}

impl NewPreOrder {
    /// Validates and returns the structured cart.
    pub fn cart(&self) -> CoreResult<PreOrderCart> {
        validate_name("buyerName", &self.buyer_name)?;
        Ok(PreOrderCart::new(self.items.clone())?)
    }
}

/// `PUT /api/preorders` body. Absent fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PreOrderUpdate {
    pub id: String,
    #[serde(default)]
    pub buyer_name: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<CartLine>>,
    #[serde(default)]
    pub status: Option<PreOrderStatus>,
}

impl PreOrderUpdate {
    /// Validates the changed fields and returns the new cart, if any.
    pub fn cart(&self) -> CoreResult<Option<PreOrderCart>> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::required("id").into());
        }
        if let Some(name) = &self.buyer_name {
            validate_name("buyerName", name)?;
        }
        match &self.items {
            Some(items) => Ok(Some(PreOrderCart::new(items.clone())?)),
            None => Ok(None),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
