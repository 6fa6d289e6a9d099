//! # Validation Module
//!
//! Field-level checks run before anything reaches the database.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request types (requests.rs)                                  │
//! │  └── THIS MODULE: required fields, ranges, sizes                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Sale planning (ledger.rs)                                    │
//! │  └── unknown sizes, stock against the catalog                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0)                                                │
//! │  ├── UNIQUE one transaction per sale / raw material                    │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_AMOUNT, MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PRICE, MAX_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted name/label/description.
const MAX_NAME_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field (buyer, menu, size label, unit...).
///
/// ## Example
/// ```rust
/// use kulino_core::validation::validate_name;
///
/// assert!(validate_name("buyerName", "Sari").is_ok());
/// assert!(validate_name("buyerName", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in rupiah. Zero is allowed (free items).
pub fn validate_price(rupiah: i64) -> ValidationResult<()> {
    if rupiah < 0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    if rupiah > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE,
        });
    }

    Ok(())
}

/// Validates a stock level set directly on a size.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }

    if stock > MAX_STOCK {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Validates a manual ledger amount.
pub fn validate_amount(rupiah: i64) -> ValidationResult<()> {
    if rupiah <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    if rupiah > MAX_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 1,
            max: MAX_AMOUNT,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in a sale or cart.
///
/// ## Rules
/// - At least one line
/// - At most MAX_CART_ITEMS (100)
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::required("items"));
    }

    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Keripik Singkong").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_and_stock() {
        assert!(validate_price(0).is_ok());
        assert!(validate_price(15_000).is_ok());
        assert!(validate_price(-1).is_err());

        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-3).is_err());
    }

    #[test]
    fn test_upper_bounds() {
        assert!(validate_price(MAX_PRICE).is_ok());
        assert!(matches!(
            validate_price(MAX_PRICE + 1),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "price"
        ));
        assert!(validate_price(i64::MAX / 2).is_err());

        assert!(validate_stock(MAX_STOCK).is_ok());
        assert!(validate_stock(i64::MAX).is_err());

        assert!(validate_amount(MAX_AMOUNT).is_ok());
        assert!(validate_amount(i64::MAX).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(0).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(1).is_ok());
        assert!(validate_cart_size(100).is_ok());
        assert!(validate_cart_size(0).is_err());
        assert!(validate_cart_size(101).is_err());
    }
}
