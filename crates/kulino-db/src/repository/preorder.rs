//! # Pre-Order Repository
//!
//! Saved carts. A pre-order never touches stock or the ledger until it is
//! converted; conversion is an ordinary sale plus the removal of the
//! pre-order, in the same unit.
//!
//! ```text
//!   pending ──► confirmed ──┐
//!      │                    ├──► convert() ──► SalesHeader + INCOME
//!      └────────────────────┘         (pre-order deleted in the same unit)
//!      │
//!      └──► cancelled   (cannot be converted)
//! ```

use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::begin_write;
use crate::repository::sale::{create_in, load_detail};
use crate::repository::{new_id, timestamp};
use chrono::{DateTime, Utc};
use kulino_core::{
    CoreError, CoreResult, NewPreOrder, PreOrder, PreOrderCart, PreOrderStatus, PreOrderUpdate,
    SaleDetail,
};

const COLUMNS: &str = "id, buyer_name, total_amount, status, items, created_at, updated_at";

/// Stored shape; the cart is still JSON text here.
#[derive(Debug, FromRow)]
struct PreOrderRow {
    id: String,
    buyer_name: String,
    total_amount: i64,
    status: PreOrderStatus,
    items: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PreOrderRow {
    fn decode(self) -> CoreResult<PreOrder> {
        Ok(PreOrder {
            items: PreOrderCart::decode(&self.items)?,
            id: self.id,
            buyer_name: self.buyer_name,
            total_amount: self.total_amount,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for pre-orders.
#[derive(Debug, Clone)]
pub struct PreOrderRepository {
    pool: SqlitePool,
}

impl PreOrderRepository {
    /// Creates a new PreOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PreOrderRepository { pool }
    }

    /// All pre-orders, newest first. Rows whose cart no longer decodes are
    /// logged and left out.
    pub async fn list(&self) -> DbResult<Vec<PreOrder>> {
        let rows: Vec<PreOrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM preorders ORDER BY created_at DESC, rowid DESC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match row.decode() {
                Ok(order) => orders.push(order),
                Err(e) => warn!(id = %id, error = %e, "Skipping unreadable pre-order"),
            }
        }
        Ok(orders)
    }

    /// Gets one pre-order.
    pub async fn get(&self, id: &str) -> DbResult<PreOrder> {
        Ok(self.row(id).await?.decode()?)
    }

    /// Saves a new pending pre-order.
    pub async fn create(&self, input: &NewPreOrder) -> DbResult<PreOrder> {
        let cart = input.cart()?;
        let id = new_id();
        let now = timestamp();

        sqlx::query(
            "INSERT INTO preorders (id, buyer_name, total_amount, status, items, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&id)
        .bind(input.buyer_name.trim())
        .bind(cart.total().rupiah())
        .bind(PreOrderStatus::Pending)
        .bind(cart.encode())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(id = %id, lines = cart.lines().len(), "Pre-order saved");
        self.get(&id).await
    }

    /// Changes buyer, cart and/or status. No stock or ledger effect.
    pub async fn update(&self, input: &PreOrderUpdate) -> DbResult<PreOrder> {
        let new_cart = input.cart()?;

        let mut tx = begin_write(&self.pool).await?;

        let current: PreOrderRow = sqlx::query_as(&format!(
            "SELECT {} FROM preorders WHERE id = ?1",
            COLUMNS
        ))
        .bind(&input.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Pre-order", &input.id))?;

        let buyer_name = input
            .buyer_name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&current.buyer_name)
            .to_string();
        let status = input.status.unwrap_or(current.status);
        let (items, total) = match &new_cart {
            Some(cart) => (cart.encode(), cart.total().rupiah()),
            None => (current.items.clone(), current.total_amount),
        };

        sqlx::query(
            "UPDATE preorders SET buyer_name = ?2, total_amount = ?3, status = ?4, items = ?5, \
             updated_at = ?6 WHERE id = ?1",
        )
        .bind(&input.id)
        .bind(&buyer_name)
        .bind(total)
        .bind(status)
        .bind(&items)
        .bind(timestamp())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(id = %input.id, %status, "Pre-order updated");
        self.get(&input.id).await
    }

    /// Deletes a pre-order.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let deleted = sqlx::query("DELETE FROM preorders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(DbError::not_found("Pre-order", id));
        }
        info!(id = %id, "Pre-order deleted");
        Ok(())
    }

    /// Turns a pre-order into a sale at the prices quoted in its cart.
    ///
    /// On any rejection (stock, unknown size, cancelled order) the
    /// pre-order is left exactly as it was.
    pub async fn convert(&self, id: &str) -> DbResult<SaleDetail> {
        let mut tx = begin_write(&self.pool).await?;

        let row: PreOrderRow = sqlx::query_as(&format!(
            "SELECT {} FROM preorders WHERE id = ?1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Pre-order", id))?;

        if row.status == PreOrderStatus::Cancelled {
            return Err(CoreError::InvalidPreOrderStatus {
                id: id.to_string(),
                status: row.status.to_string(),
            }
            .into());
        }

        let order = row.decode()?;
        let header_id = create_in(
            &mut tx,
            &order.buyer_name,
            &order.items.to_sale_items(),
            timestamp(),
        )
        .await?;

        sqlx::query("DELETE FROM preorders WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let sale = load_detail(&mut tx, &header_id).await?;
        tx.commit().await?;

        info!(preorder = %id, sale = %header_id, total = sale.header.total_amount, "Pre-order converted");
        Ok(sale)
    }

    async fn row(&self, id: &str) -> DbResult<PreOrderRow> {
        sqlx::query_as(&format!("SELECT {} FROM preorders WHERE id = ?1", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Pre-order", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use kulino_core::cart::CartLine;
    use kulino_core::{Menu, MenuInput, SizeInput};

    async fn setup(stock: i64) -> (Database, Menu) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let menu = db
            .menus()
            .create(&MenuInput {
                id: None,
                name: "Keripik".to_string(),
                image: None,
                sizes: vec![SizeInput {
                    id: None,
                    size: "Besar".to_string(),
                    price: 15_000,
                    stock,
                }],
            })
            .await
            .unwrap();
        (db, menu)
    }

    fn order(menu: &Menu, price: i64, quantity: i64) -> NewPreOrder {
        NewPreOrder {
            buyer_name: "Budi".to_string(),
            items: vec![CartLine {
                menu_id: menu.id.clone(),
                size_id: menu.sizes[0].id.clone(),
                price,
                quantity,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_and_update_have_no_stock_effect() {
        let (db, menu) = setup(5).await;
        let repo = db.preorders();

        let saved = repo.create(&order(&menu, 14_000, 3)).await.unwrap();
        assert_eq!(saved.status, PreOrderStatus::Pending);
        assert_eq!(saved.total_amount, 42_000);

        let updated = repo
            .update(&PreOrderUpdate {
                id: saved.id.clone(),
                buyer_name: Some("Budi S.".to_string()),
                items: None,
                status: Some(PreOrderStatus::Confirmed),
            })
            .await
            .unwrap();
        assert_eq!(updated.buyer_name, "Budi S.");
        assert_eq!(updated.status, PreOrderStatus::Confirmed);
        assert_eq!(updated.items, saved.items);

        assert_eq!(db.menus().get_size(&menu.sizes[0].id).await.unwrap().stock, 5);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_convert_creates_sale_and_removes_order() {
        let (db, menu) = setup(5).await;
        let saved = db.preorders().create(&order(&menu, 14_000, 3)).await.unwrap();

        let sale = db.preorders().convert(&saved.id).await.unwrap();
        assert_eq!(sale.header.buyer_name, "Budi");
        assert_eq!(sale.items[0].price, 14_000);
        assert_eq!(sale.transaction.amount, 42_000);
        assert_eq!(db.menus().get_size(&menu.sizes[0].id).await.unwrap().stock, 2);
        assert!(matches!(
            db.preorders().get(&saved.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_convert_short_stock_leaves_order() {
        let (db, menu) = setup(2).await;
        let saved = db.preorders().create(&order(&menu, 15_000, 3)).await.unwrap();

        let err = db.preorders().convert(&saved.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::StockNotEnough { .. })
        ));
        assert_eq!(db.preorders().get(&saved.id).await.unwrap(), saved);
        assert_eq!(db.menus().get_size(&menu.sizes[0].id).await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_cancelled_cannot_convert() {
        let (db, menu) = setup(5).await;
        let saved = db.preorders().create(&order(&menu, 15_000, 1)).await.unwrap();
        db.preorders()
            .update(&PreOrderUpdate {
                id: saved.id.clone(),
                buyer_name: None,
                items: None,
                status: Some(PreOrderStatus::Cancelled),
            })
            .await
            .unwrap();

        let err = db.preorders().convert(&saved.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::InvalidPreOrderStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_cart_is_reported() {
        let (db, menu) = setup(5).await;
        let saved = db.preorders().create(&order(&menu, 15_000, 1)).await.unwrap();
        sqlx::query("UPDATE preorders SET items = 'oops' WHERE id = ?1")
            .bind(&saved.id)
            .execute(db.pool())
            .await
            .unwrap();

        assert!(matches!(
            db.preorders().get(&saved.id).await,
            Err(DbError::Rejected(CoreError::CorruptCart { .. }))
        ));
        assert!(matches!(
            db.preorders().convert(&saved.id).await,
            Err(DbError::Rejected(CoreError::CorruptCart { .. }))
        ));
        assert!(db.preorders().list().await.unwrap().is_empty());
    }
}
