//! # Sale Repository
//!
//! Sales are the one place where three tables must move together: size
//! stock, the sale header with its items, and the INCOME ledger entry.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE                         BEGIN IMMEDIATE                     │
//! │     ├── read catalog rows          (write lock held from here)         │
//! │     ├── plan_sale(items, [])       ← rejects before any write          │
//! │     ├── stock -= qty               (guarded: stock >= qty)             │
//! │     ├── INSERT header + items                                          │
//! │     └── INSERT INCOME              COMMIT                              │
//! │                                                                         │
//! │  2. EDIT (full replacement)                                            │
//! │     ├── read current items                                             │
//! │     ├── plan_sale(items, current)  ← restore counted before checking   │
//! │     ├── stock += old qty, stock -= new qty                             │
//! │     ├── DELETE old items, INSERT new items                             │
//! │     └── UPDATE header total + INCOME amount/description                │
//! │                                                                         │
//! │  3. DELETE                                                             │
//! │     ├── stock += qty for every line                                    │
//! │     ├── DELETE INCOME                                                  │
//! │     └── DELETE header  (items cascade)                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::begin_write;
use crate::repository::ledger::TRANSACTION_COLUMNS;
use crate::repository::{new_id, timestamp};
use kulino_core::ledger::{plan_sale, restore_for, CatalogEntry, SalePlan};
use kulino_core::{
    CoreError, LedgerTransaction, NewSale, SaleDetail, SaleEdit, SaleItem, SaleItemRequest,
    SalesHeader, TransactionType,
};

const ITEM_COLUMNS: &str = "id, sales_header_id, menu_id, size_id, menu_name, size_name, \
                            price, quantity, total, date";

/// Repository for sale operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its items and INCOME entry.
    pub async fn get(&self, id: &str) -> DbResult<SaleDetail> {
        let mut conn = self.pool.acquire().await?;
        load_detail(&mut conn, id).await
    }

    /// Records a sale.
    ///
    /// ## Errors
    /// - `Rejected(Validation)` for a bad request body
    /// - `Rejected(SizeNotFound)` for an unknown size id
    /// - `Rejected(StockNotEnough)` when any size is short
    ///
    /// Nothing is written in any error case.
    pub async fn create(&self, sale: &NewSale) -> DbResult<SaleDetail> {
        sale.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        let id = create_in(&mut tx, &sale.buyer_name, &sale.items, timestamp()).await?;
        let detail = load_detail(&mut tx, &id).await?;
        tx.commit().await?;

        info!(
            id = %detail.header.id,
            total = detail.header.total_amount,
            items = detail.items.len(),
            "Sale recorded"
        );
        Ok(detail)
    }

    /// Replaces a sale's buyer and item set.
    ///
    /// The original sale date is kept on the header, the new items and the
    /// INCOME entry.
    pub async fn edit(&self, edit: &SaleEdit) -> DbResult<SaleDetail> {
        edit.validate()?;
        let id = edit.sales_header_id.as_str();

        let mut tx = begin_write(&self.pool).await?;

        let header = load_header(&mut tx, id).await?;
        let previous = load_items(&mut tx, id).await?;
        let catalog = load_catalog(&mut tx, &edit.items).await?;

        let plan = plan_sale(&edit.items, &catalog, &previous).map_err(|e| {
            warn!(id = %id, error = %e, "Sale edit rejected");
            e
        })?;

        restore_stock(&mut tx, &plan.restore).await?;
        consume_stock(&mut tx, &plan.consume, &catalog).await?;

        sqlx::query("DELETE FROM sale_items WHERE sales_header_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, id, &plan, header.date).await?;

        sqlx::query("UPDATE sales_headers SET buyer_name = ?2, total_amount = ?3 WHERE id = ?1")
            .bind(id)
            .bind(edit.buyer_name.trim())
            .bind(plan.total.rupiah())
            .execute(&mut *tx)
            .await?;

        let mirrored = sqlx::query(
            "UPDATE ledger_transactions SET amount = ?2, description = ?3 \
             WHERE sales_header_id = ?1",
        )
        .bind(id)
        .bind(plan.total.rupiah())
        .bind(&plan.description)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if mirrored != 1 {
            return Err(DbError::Internal(format!(
                "sale {} has {} income entries",
                id, mirrored
            )));
        }

        let detail = load_detail(&mut tx, id).await?;
        tx.commit().await?;

        info!(id = %id, total = detail.header.total_amount, "Sale edited");
        Ok(detail)
    }

    /// Deletes a sale by header id, giving its stock back.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;
        delete_in(&mut tx, id).await?;
        tx.commit().await?;

        info!(id = %id, "Sale deleted");
        Ok(())
    }
}

// =============================================================================
// Units of Work (shared with the ledger and pre-order repositories)
// =============================================================================

/// Plans and writes a new sale on an open write transaction. Returns the
/// header id.
pub(crate) async fn create_in(
    conn: &mut SqliteConnection,
    buyer_name: &str,
    items: &[SaleItemRequest],
    now: DateTime<Utc>,
) -> DbResult<String> {
    let catalog = load_catalog(conn, items).await?;
    let plan = plan_sale(items, &catalog, &[]).map_err(|e| {
        warn!(error = %e, "Sale rejected");
        e
    })?;

    let id = new_id();
    debug!(id = %id, lines = plan.lines.len(), total = plan.total.rupiah(), "Writing sale");

    consume_stock(conn, &plan.consume, &catalog).await?;

    sqlx::query(
        "INSERT INTO sales_headers (id, buyer_name, total_amount, date, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&id)
    .bind(buyer_name.trim())
    .bind(plan.total.rupiah())
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    insert_items(conn, &id, &plan, now).await?;

    sqlx::query(
        "INSERT INTO ledger_transactions \
         (id, kind, amount, description, date, sales_header_id, raw_material_id, is_manual, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, 0, ?7)",
    )
    .bind(new_id())
    .bind(TransactionType::Income)
    .bind(plan.total.rupiah())
    .bind(&plan.description)
    .bind(now)
    .bind(&id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Removes a sale on an open write transaction, giving its stock back.
pub(crate) async fn delete_in(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    load_header(conn, id).await?;
    let items = load_items(conn, id).await?;
    restore_stock(conn, &restore_for(&items)).await?;

    sqlx::query("DELETE FROM ledger_transactions WHERE sales_header_id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM sales_headers WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    debug!(id = %id, lines = items.len(), "Sale removed");
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Catalog rows for every size the request names. Unknown ids are left out;
/// the planner reports them.
async fn load_catalog(
    conn: &mut SqliteConnection,
    items: &[SaleItemRequest],
) -> DbResult<HashMap<String, CatalogEntry>> {
    let mut catalog = HashMap::new();
    for item in items {
        if catalog.contains_key(&item.size_id) {
            continue;
        }
        let row: Option<(String, String, String, String, i64, i64)> = sqlx::query_as(
            "SELECT s.id, s.menu_id, m.name, s.size, s.price, s.stock \
             FROM sizes s JOIN menus m ON m.id = s.menu_id WHERE s.id = ?1",
        )
        .bind(&item.size_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some((size_id, menu_id, menu_name, size_name, price, stock)) = row {
            catalog.insert(
                size_id.clone(),
                CatalogEntry {
                    size_id,
                    menu_id,
                    menu_name,
                    size_name,
                    price,
                    stock,
                },
            );
        }
    }
    Ok(catalog)
}

async fn restore_stock(
    conn: &mut SqliteConnection,
    restore: &BTreeMap<String, i64>,
) -> DbResult<()> {
    for (size_id, qty) in restore {
        sqlx::query("UPDATE sizes SET stock = stock + ?2 WHERE id = ?1")
            .bind(size_id)
            .bind(qty)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Guarded decrement. The planner already checked every size under the
/// write lock, so a refused row here means the catalog moved underneath us.
async fn consume_stock(
    conn: &mut SqliteConnection,
    consume: &BTreeMap<String, i64>,
    catalog: &HashMap<String, CatalogEntry>,
) -> DbResult<()> {
    for (size_id, qty) in consume {
        let updated = sqlx::query("UPDATE sizes SET stock = stock - ?2 WHERE id = ?1 AND stock >= ?2")
            .bind(size_id)
            .bind(qty)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        if updated == 0 {
            let remaining: Option<i64> = sqlx::query_scalar("SELECT stock FROM sizes WHERE id = ?1")
                .bind(size_id)
                .fetch_optional(&mut *conn)
                .await?;
            let entry = catalog
                .get(size_id)
                .ok_or_else(|| CoreError::SizeNotFound(size_id.clone()))?;
            return Err(CoreError::StockNotEnough {
                menu_name: entry.menu_name.clone(),
                size_name: entry.size_name.clone(),
                remaining_stock: remaining.unwrap_or(0),
                requested: *qty,
            }
            .into());
        }
    }
    Ok(())
}

async fn insert_items(
    conn: &mut SqliteConnection,
    header_id: &str,
    plan: &SalePlan,
    date: DateTime<Utc>,
) -> DbResult<()> {
    for line in &plan.lines {
        sqlx::query(
            "INSERT INTO sale_items \
             (id, sales_header_id, menu_id, size_id, menu_name, size_name, price, quantity, total, date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(new_id())
        .bind(header_id)
        .bind(&line.menu_id)
        .bind(&line.size_id)
        .bind(&line.menu_name)
        .bind(&line.size_name)
        .bind(line.price)
        .bind(line.quantity)
        .bind(line.total().rupiah())
        .bind(date)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn load_header(conn: &mut SqliteConnection, id: &str) -> DbResult<SalesHeader> {
    sqlx::query_as(
        "SELECT id, buyer_name, total_amount, date, created_at FROM sales_headers WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Sale", id))
}

async fn load_items(conn: &mut SqliteConnection, header_id: &str) -> DbResult<Vec<SaleItem>> {
    Ok(sqlx::query_as(&format!(
        "SELECT {} FROM sale_items WHERE sales_header_id = ?1 ORDER BY rowid",
        ITEM_COLUMNS
    ))
    .bind(header_id)
    .fetch_all(&mut *conn)
    .await?)
}

pub(crate) async fn load_detail(conn: &mut SqliteConnection, id: &str) -> DbResult<SaleDetail> {
    let header = load_header(conn, id).await?;
    let items = load_items(conn, id).await?;
    let transaction: LedgerTransaction = sqlx::query_as(&format!(
        "SELECT {} FROM ledger_transactions WHERE sales_header_id = ?1",
        TRANSACTION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Transaction for sale", id))?;

    Ok(SaleDetail {
        header,
        items,
        transaction,
    })
}

/// Sold line items dated in `[start, end)`, newest first.
pub(crate) async fn items_between(
    pool: &SqlitePool,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> DbResult<Vec<SaleItem>> {
    Ok(sqlx::query_as(&format!(
        "SELECT {} FROM sale_items \
         WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date < ?2) \
         ORDER BY date DESC, rowid DESC",
        ITEM_COLUMNS
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?)
}

// =============================================================================
// Unit Tests
// =============================================================================
