//! # Sale Planning
//!
//! The pure half of the sales/ledger consistency rules. A [`SalePlan`] is
//! everything the database layer needs to write a sale (or an edit of one)
//! without making a single decision of its own.
//!
//! ## Create vs. Edit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         plan_sale()                                     │
//! │                                                                         │
//! │  requests ──┐                                                           │
//! │  catalog  ──┼──► 1. every sizeId known?          no ──► SizeNotFound   │
//! │  previous ──┘    2. restore = Σ previous qty per size                  │
//! │                  3. demand  = Σ requested qty per size                 │
//! │                  4. demand ≤ stock + restore ?    no ──► StockNotEnough│
//! │                  5. capture price per line                             │
//! │                  6. total + description                                │
//! │                         │                                               │
//! │                         ▼                                               │
//! │                     SalePlan  (nothing written yet)                    │
//! │                                                                         │
//! │  Create: previous = []          Edit: previous = current items         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Restoring before validating is what lets an edit move quantity between
//! two lines of the same size: the capacity freed by lowering one line is
//! available to the other.
//!
//! ## Price Capture
//! 1. An explicit `price` in the request is captured as given.
//! 2. Otherwise, on an edit, the price already captured for that size is kept.
//! 3. Otherwise (new sale, or a size new to this sale) the live catalog price.

use std::collections::{BTreeMap, HashMap};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::requests::SaleItemRequest;
use crate::types::SaleItem;
use crate::validation::{validate_cart_size, validate_price, validate_quantity};

// =============================================================================
// Inputs
// =============================================================================

/// A size as read from the catalog inside the unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub size_id: String,
    pub menu_id: String,
    pub menu_name: String,
    pub size_name: String,
    pub price: i64,
    pub stock: i64,
}

// =============================================================================
// Plan
// =============================================================================

/// One line item to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub menu_id: String,
    pub size_id: String,
    pub menu_name: String,
    pub size_name: String,
    pub price: i64,
    pub quantity: i64,
}

impl PlannedLine {
    pub fn total(&self) -> Money {
        Money::from_rupiah(self.price).multiply_quantity(self.quantity)
    }

    fn checked_total(&self) -> Option<Money> {
        Money::from_rupiah(self.price).checked_mul(self.quantity)
    }
}

/// The full write set of a sale create or edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePlan {
    /// New line items, in request order.
    pub lines: Vec<PlannedLine>,
    /// Header total and INCOME amount.
    pub total: Money,
    /// INCOME description.
    pub description: String,
    /// Stock to give back per size (the previous items).
    pub restore: BTreeMap<String, i64>,
    /// Stock to take per size (the new items).
    pub consume: BTreeMap<String, i64>,
}

// =============================================================================
// Planning
// =============================================================================

/// Plans a sale create (`previous` empty) or a full replacement edit.
///
/// Every check happens here, before any mutation: unknown sizes, bad
/// quantities and stock shortfalls abort the whole plan.
pub fn plan_sale(
    requests: &[SaleItemRequest],
    catalog: &HashMap<String, CatalogEntry>,
    previous: &[SaleItem],
) -> CoreResult<SalePlan> {
    validate_cart_size(requests.len())?;

    let restore = quantities_by_size(previous.iter().map(|i| (i.size_id.as_str(), i.quantity)));

    let mut captured: HashMap<&str, i64> = HashMap::new();
    for item in previous {
        captured.entry(item.size_id.as_str()).or_insert(item.price);
    }

    let mut lines = Vec::with_capacity(requests.len());
    let mut seen_order: Vec<&str> = Vec::new();
    for request in requests {
        validate_quantity(request.quantity)?;
        let entry = catalog
            .get(&request.size_id)
            .ok_or_else(|| CoreError::SizeNotFound(request.size_id.clone()))?;

        let price = match request.price {
            Some(price) => {
                validate_price(price)?;
                price
            }
            None => captured
                .get(entry.size_id.as_str())
                .copied()
                .unwrap_or(entry.price),
        };

        if !seen_order.contains(&entry.size_id.as_str()) {
            seen_order.push(entry.size_id.as_str());
        }

        lines.push(PlannedLine {
            menu_id: entry.menu_id.clone(),
            size_id: entry.size_id.clone(),
            menu_name: entry.menu_name.clone(),
            size_name: entry.size_name.clone(),
            price,
            quantity: request.quantity,
        });
    }

    let consume = quantities_by_size(lines.iter().map(|l| (l.size_id.as_str(), l.quantity)));

    // First offending size in request order.
    for size_id in seen_order {
        let entry = catalog
            .get(size_id)
            .ok_or_else(|| CoreError::SizeNotFound(size_id.to_string()))?;
        let requested = consume.get(size_id).copied().unwrap_or(0);
        let available = entry
            .stock
            .saturating_add(restore.get(size_id).copied().unwrap_or(0));
        if requested > available {
            return Err(CoreError::StockNotEnough {
                menu_name: entry.menu_name.clone(),
                size_name: entry.size_name.clone(),
                remaining_stock: available,
                requested,
            });
        }
    }

    let total = lines
        .iter()
        .map(PlannedLine::checked_total)
        .try_fold(Money::zero(), |acc, line| acc.checked_add(line?))
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "total".to_string(),
            min: 0,
            max: i64::MAX,
        })?;
    let description = describe(
        lines
            .iter()
            .map(|l| (l.menu_name.as_str(), l.size_name.as_str(), l.quantity)),
    );

    Ok(SalePlan {
        lines,
        total,
        description,
        restore,
        consume,
    })
}

/// Stock given back when a sale is deleted outright.
pub fn restore_for(items: &[SaleItem]) -> BTreeMap<String, i64> {
    quantities_by_size(items.iter().map(|i| (i.size_id.as_str(), i.quantity)))
}

/// Ledger description: `"{menu} ({size}) x{qty}"` per line, comma-joined.
///
/// ## Example
/// ```rust
/// use kulino_core::ledger::describe;
///
/// let text = describe([("Keripik", "Besar", 2), ("Makaroni", "Kecil", 1)]);
/// assert_eq!(text, "Keripik (Besar) x2, Makaroni (Kecil) x1");
/// ```
pub fn describe<'a, I>(lines: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str, i64)>,
{
    lines
        .into_iter()
        .map(|(menu, size, qty)| format!("{} ({}) x{}", menu, size, qty))
        .collect::<Vec<_>>()
        .join(", ")
}

fn quantities_by_size<'a>(pairs: impl Iterator<Item = (&'a str, i64)>) -> BTreeMap<String, i64> {
    let mut totals = BTreeMap::new();
    for (size_id, qty) in pairs {
        let total = totals.entry(size_id.to_string()).or_insert(0i64);
        *total = total.saturating_add(qty);
    }
    totals
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(size_id: &str, menu: &str, size: &str, price: i64, stock: i64) -> CatalogEntry {
        CatalogEntry {
            size_id: size_id.to_string(),
            menu_id: format!("menu-{}", menu),
            menu_name: menu.to_string(),
            size_name: size.to_string(),
            price,
            stock,
        }
    }

    fn catalog(entries: Vec<CatalogEntry>) -> HashMap<String, CatalogEntry> {
        entries
            .into_iter()
            .map(|e| (e.size_id.clone(), e))
            .collect()
    }

    fn request(size_id: &str, quantity: i64, price: Option<i64>) -> SaleItemRequest {
        SaleItemRequest {
            size_id: size_id.to_string(),
            quantity,
            price,
        }
    }

    fn sold(size_id: &str, price: i64, quantity: i64) -> SaleItem {
        SaleItem {
            id: format!("item-{}-{}", size_id, quantity),
            sales_header_id: "h1".to_string(),
            menu_id: "menu-Keripik".to_string(),
            size_id: size_id.to_string(),
            menu_name: "Keripik".to_string(),
            size_name: "Besar".to_string(),
            price,
            quantity,
            total: price * quantity,
            date: Utc::now(),
        }
    }

    #[test]
    fn test_plan_new_sale() {
        let catalog = catalog(vec![
            entry("s1", "Keripik", "Besar", 15_000, 5),
            entry("s2", "Makaroni", "Kecil", 5_000, 10),
        ]);
        let plan = plan_sale(
            &[request("s1", 3, Some(14_000)), request("s2", 2, None)],
            &catalog,
            &[],
        )
        .unwrap();

        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].price, 14_000);
        assert_eq!(plan.lines[1].price, 5_000);
        assert_eq!(plan.total.rupiah(), 3 * 14_000 + 2 * 5_000);
        assert_eq!(plan.description, "Keripik (Besar) x3, Makaroni (Kecil) x2");
        assert_eq!(plan.consume.get("s1"), Some(&3));
        assert!(plan.restore.is_empty());
    }

    #[test]
    fn test_oversized_explicit_price_is_rejected() {
        let catalog = catalog(vec![entry("s1", "Keripik", "Besar", 15_000, 5)]);
        let err = plan_sale(&[request("s1", 3, Some(i64::MAX / 2))], &catalog, &[]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "price"
        ));
    }

    #[test]
    fn test_total_overflow_from_stored_price_is_rejected() {
        // A catalog row written before prices were capped.
        let catalog = catalog(vec![entry("s1", "Keripik", "Besar", i64::MAX / 2, 5)]);
        let err = plan_sale(&[request("s1", 3, None)], &catalog, &[]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "total"
        ));
    }

    #[test]
    fn test_largest_accepted_cart_total_fits() {
        let catalog = catalog(vec![entry("s1", "Keripik", "Besar", 0, i64::MAX)]);
        let requests: Vec<_> = (0..crate::MAX_CART_ITEMS)
            .map(|_| request("s1", crate::MAX_ITEM_QUANTITY, Some(crate::MAX_PRICE)))
            .collect();
        let plan = plan_sale(&requests, &catalog, &[]).unwrap();
        assert_eq!(
            plan.total.rupiah(),
            crate::MAX_PRICE * crate::MAX_ITEM_QUANTITY * crate::MAX_CART_ITEMS as i64
        );
    }

    #[test]
    fn test_unknown_size_aborts() {
        let catalog = catalog(vec![entry("s1", "Keripik", "Besar", 15_000, 5)]);
        let err = plan_sale(
            &[request("s1", 1, None), request("ghost", 1, None)],
            &catalog,
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::SizeNotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_quantities_are_checked_per_size_in_total() {
        let catalog = catalog(vec![entry("s1", "Keripik", "Besar", 15_000, 5)]);
        let err = plan_sale(
            &[request("s1", 3, None), request("s1", 3, None)],
            &catalog,
            &[],
        )
        .unwrap_err();

        match err {
            CoreError::StockNotEnough {
                menu_name,
                size_name,
                remaining_stock,
                requested,
            } => {
                assert_eq!(menu_name, "Keripik");
                assert_eq!(size_name, "Besar");
                assert_eq!(remaining_stock, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("expected StockNotEnough, got {:?}", other),
        }
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let catalog = catalog(vec![entry("s1", "Keripik", "Besar", 15_000, 5)]);
        let err = plan_sale(&[request("s1", 0, None)], &catalog, &[]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_edit_reuses_restored_capacity() {
        // Two lines on one size: 3 were sold, 1 is left on the shelf.
        let catalog = catalog(vec![entry("s1", "Keripik", "Besar", 15_000, 1)]);
        let previous = vec![sold("s1", 15_000, 3)];

        // Lower line A to 1 and add line B with 2: needs 3, has 1 + 3.
        let plan = plan_sale(
            &[request("s1", 1, None), request("s1", 2, None)],
            &catalog,
            &previous,
        )
        .unwrap();
        assert_eq!(plan.restore.get("s1"), Some(&3));
        assert_eq!(plan.consume.get("s1"), Some(&3));

        // Without the restore the same request would not fit.
        assert!(plan_sale(
            &[request("s1", 1, None), request("s1", 2, None)],
            &catalog,
            &[],
        )
        .is_err());
    }

    #[test]
    fn test_edit_shortfall_reports_restored_stock() {
        let catalog = catalog(vec![entry("s1", "Keripik", "Besar", 15_000, 2)]);
        let previous = vec![sold("s1", 15_000, 3)];
        let err = plan_sale(&[request("s1", 6, None)], &catalog, &previous).unwrap_err();
        assert!(matches!(
            err,
            CoreError::StockNotEnough {
                remaining_stock: 5,
                requested: 6,
                ..
            }
        ));
    }

    #[test]
    fn test_edit_keeps_captured_price_and_prices_new_sizes_live() {
        let catalog = catalog(vec![
            entry("s1", "Keripik", "Besar", 20_000, 10),
            entry("s2", "Keripik", "Kecil", 8_000, 10),
        ]);
        let previous = vec![sold("s1", 15_000, 2)];

        let plan = plan_sale(
            &[request("s1", 1, None), request("s2", 1, None)],
            &catalog,
            &previous,
        )
        .unwrap();
        assert_eq!(plan.lines[0].price, 15_000);
        assert_eq!(plan.lines[1].price, 8_000);
        assert_eq!(plan.total.rupiah(), 23_000);
    }

    #[test]
    fn test_restore_for_sums_lines_per_size() {
        let items = vec![sold("s1", 15_000, 2), sold("s1", 15_000, 1)];
        assert_eq!(restore_for(&items).get("s1"), Some(&3));
        assert_eq!(restore_for(&items).len(), 1);
    }
}
