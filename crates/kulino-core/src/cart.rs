//! # Pre-Order Cart
//!
//! A saved cart is a list of `{menuId, sizeId, price, quantity}` lines. It is
//! stored as one JSON text column; this module owns both directions of that
//! encoding and refuses to hand out a cart that does not validate.
//!
//! ```text
//!   NewPreOrder.items ──► PreOrderCart::new ──► encode() ──► preorders.items
//!                          (validated)                          (TEXT)
//!                                                                 │
//!   PreOrder.items ◄──── PreOrderCart::decode ◄───────────────────┘
//!                          (validated again)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::requests::SaleItemRequest;
use crate::validation::{validate_cart_size, validate_price, validate_quantity, ValidationResult};

/// One line of a saved cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub menu_id: String,
    pub size_id: String,
    /// Price quoted when the order was taken.
    pub price: i64,
    pub quantity: i64,
}

impl CartLine {
    fn validate(&self) -> ValidationResult<()> {
        if self.menu_id.trim().is_empty() {
            return Err(ValidationError::required("menuId"));
        }
        if self.size_id.trim().is_empty() {
            return Err(ValidationError::required("sizeId"));
        }
        validate_price(self.price)?;
        validate_quantity(self.quantity)
    }

    pub fn line_total(&self) -> Money {
        Money::from_rupiah(self.price).multiply_quantity(self.quantity)
    }
}

/// A validated, non-empty list of cart lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PreOrderCart(Vec<CartLine>);

impl PreOrderCart {
    /// Builds a cart from raw lines.
    pub fn new(lines: Vec<CartLine>) -> ValidationResult<Self> {
        validate_cart_size(lines.len())?;
        for line in &lines {
            line.validate()?;
        }
        Ok(PreOrderCart(lines))
    }

    /// Serializes for the `preorders.items` column.
    pub fn encode(&self) -> String {
        // A Vec of plain structs cannot fail to serialize.
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    /// Parses and validates a stored cart.
    pub fn decode(raw: &str) -> CoreResult<Self> {
        let lines: Vec<CartLine> =
            serde_json::from_str(raw).map_err(|e| CoreError::CorruptCart {
                reason: e.to_string(),
            })?;
        PreOrderCart::new(lines).map_err(|e| CoreError::CorruptCart {
            reason: e.to_string(),
        })
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.0
    }

    /// Σ price × quantity.
    pub fn total(&self) -> Money {
        self.0.iter().map(CartLine::line_total).sum()
    }

    /// The cart as sale requests, each carrying its quoted price.
    pub fn to_sale_items(&self) -> Vec<SaleItemRequest> {
        self.0
            .iter()
            .map(|line| SaleItemRequest {
                size_id: line.size_id.clone(),
                quantity: line.quantity,
                price: Some(line.price),
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(size_id: &str, price: i64, quantity: i64) -> CartLine {
        CartLine {
            menu_id: "m1".to_string(),
            size_id: size_id.to_string(),
            price,
            quantity,
        }
    }

    #[test]
    fn test_total_and_sale_items() {
        let cart = PreOrderCart::new(vec![line("s1", 10_000, 2), line("s2", 5_000, 1)]).unwrap();
        assert_eq!(cart.total().rupiah(), 25_000);

        let items = cart.to_sale_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].price, Some(10_000));
        assert_eq!(items[1].quantity, 1);
    }

    #[test]
    fn test_decode_stored_json() {
        let cart = PreOrderCart::decode(
            r#"[{"menuId":"m1","sizeId":"s1","price":8000,"quantity":3}]"#,
        )
        .unwrap();
        assert_eq!(cart.lines()[0], line("s1", 8_000, 3));
        assert_eq!(PreOrderCart::decode(&cart.encode()).unwrap(), cart);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            PreOrderCart::decode("not json"),
            Err(CoreError::CorruptCart { .. })
        ));
        assert!(matches!(
            PreOrderCart::decode("[]"),
            Err(CoreError::CorruptCart { .. })
        ));
        assert!(matches!(
            PreOrderCart::decode(r#"[{"menuId":"m1","sizeId":"s1","price":8000,"quantity":0}]"#),
            Err(CoreError::CorruptCart { .. })
        ));
    }

    #[test]
    fn test_serializes_as_array() {
        let cart = PreOrderCart::new(vec![line("s1", 1_000, 1)]).unwrap();
        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
    }
}
