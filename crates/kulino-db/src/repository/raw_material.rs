//! # Raw Material Repository
//!
//! Ingredient and packaging purchases. Each purchase owns exactly one
//! EXPENSE entry carrying the same total and date; both are written in one
//! unit, and deleting the purchase cascades to the entry.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::pool::begin_write;
use crate::repository::{new_id, timestamp};
use kulino_core::dates::date_or;
use kulino_core::{RawMaterial, RawMaterialInput, TransactionType, ValidationError};

const COLUMNS: &str = "id, name, unit_price, quantity, unit, total_price, date, created_at";

/// Ledger description of a purchase.
pub fn expense_description(name: &str) -> String {
    format!("Raw material purchase: {}", name.trim())
}

/// Repository for raw material purchases.
#[derive(Debug, Clone)]
pub struct RawMaterialRepository {
    pool: SqlitePool,
}

impl RawMaterialRepository {
    /// Creates a new RawMaterialRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RawMaterialRepository { pool }
    }

    /// All purchases, newest first.
    pub async fn list(&self) -> DbResult<Vec<RawMaterial>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {} FROM raw_materials ORDER BY date DESC, created_at DESC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    /// Gets one purchase.
    pub async fn get(&self, id: &str) -> DbResult<RawMaterial> {
        let mut conn = self.pool.acquire().await?;
        load(&mut conn, id).await
    }

    /// Records a purchase and its EXPENSE entry.
    pub async fn create(&self, input: &RawMaterialInput) -> DbResult<RawMaterial> {
        input.validate()?;

        let id = new_id();
        let now = timestamp();
        let date = date_or("date", input.date.as_deref(), now)?;
        let total = input.total_price()?;

        debug!(id = %id, name = %input.name, total, "Recording purchase");

        let mut tx = begin_write(&self.pool).await?;

        sqlx::query(
            "INSERT INTO raw_materials \
             (id, name, unit_price, quantity, unit, total_price, date, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&id)
        .bind(input.name.trim())
        .bind(input.unit_price)
        .bind(input.quantity)
        .bind(input.unit.trim())
        .bind(total)
        .bind(date)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        insert_expense(&mut tx, &id, &input.name, total, date).await?;

        let material = load(&mut tx, &id).await?;
        tx.commit().await?;

        info!(id = %id, total, "Purchase recorded");
        Ok(material)
    }

    /// Rewrites a purchase and its EXPENSE entry.
    pub async fn update(&self, input: &RawMaterialInput) -> DbResult<RawMaterial> {
        input.validate()?;
        let id = input
            .id
            .as_deref()
            .ok_or_else(|| ValidationError::required("id"))?;

        let date = date_or("date", input.date.as_deref(), timestamp())?;
        let total = input.total_price()?;

        let mut tx = begin_write(&self.pool).await?;

        let updated = sqlx::query(
            "UPDATE raw_materials SET name = ?2, unit_price = ?3, quantity = ?4, unit = ?5, \
             total_price = ?6, date = ?7 WHERE id = ?1",
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.unit_price)
        .bind(input.quantity)
        .bind(input.unit.trim())
        .bind(total)
        .bind(date)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if updated == 0 {
            return Err(DbError::not_found("Raw material", id));
        }

        let mirrored = sqlx::query(
            "UPDATE ledger_transactions SET amount = ?2, description = ?3, date = ?4 \
             WHERE raw_material_id = ?1",
        )
        .bind(id)
        .bind(total)
        .bind(expense_description(&input.name))
        .bind(date)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if mirrored == 0 {
            insert_expense(&mut tx, id, &input.name, total, date).await?;
        }

        let material = load(&mut tx, id).await?;
        tx.commit().await?;

        info!(id = %id, total, "Purchase updated");
        Ok(material)
    }

    /// Deletes a purchase; its EXPENSE entry goes with it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let deleted = sqlx::query("DELETE FROM raw_materials WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(DbError::not_found("Raw material", id));
        }

        info!(id = %id, "Purchase deleted");
        Ok(())
    }
}

async fn insert_expense(
    conn: &mut SqliteConnection,
    raw_material_id: &str,
    name: &str,
    total: i64,
    date: chrono::DateTime<chrono::Utc>,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO ledger_transactions \
         (id, kind, amount, description, date, sales_header_id, raw_material_id, is_manual, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, 0, ?7)",
    )
    .bind(new_id())
    .bind(TransactionType::Expense)
    .bind(total)
    .bind(expense_description(name))
    .bind(date)
    .bind(raw_material_id)
    .bind(timestamp())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn load(conn: &mut SqliteConnection, id: &str) -> DbResult<RawMaterial> {
    sqlx::query_as(&format!("SELECT {} FROM raw_materials WHERE id = ?1", COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Raw material", id))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use kulino_core::{DateRange, TransactionOwner};

    fn input(name: &str, unit_price: i64, quantity: i64, date: Option<&str>) -> RawMaterialInput {
        RawMaterialInput {
            id: None,
            name: name.to_string(),
            unit_price,
            quantity,
            unit: "kg".to_string(),
            date: date.map(str::to_string),
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_pairs_expense() {
        let db = db().await;
        let material = db
            .raw_materials()
            .create(&input("Tepung", 12_000, 5, Some("2024-03-05")))
            .await
            .unwrap();
        assert_eq!(material.total_price, 60_000);

        let summary = db.ledger().list(&DateRange::all(), None).await.unwrap();
        assert_eq!(summary.transactions.len(), 1);
        let entry = &summary.transactions[0];
        assert_eq!(entry.kind, TransactionType::Expense);
        assert_eq!(entry.amount, 60_000);
        assert_eq!(entry.date, material.date);
        assert_eq!(entry.description, "Raw material purchase: Tepung");
        assert_eq!(entry.owner(), TransactionOwner::RawMaterial(&material.id));
    }

    #[tokio::test]
    async fn test_update_rewrites_expense() {
        let db = db().await;
        let repo = db.raw_materials();
        let created = repo
            .create(&input("Tepung", 12_000, 5, None))
            .await
            .unwrap();

        let mut edit = input("Tepung Terigu", 13_000, 2, Some("01/03/2024"));
        edit.id = Some(created.id.clone());
        let updated = repo.update(&edit).await.unwrap();
        assert_eq!(updated.total_price, 26_000);

        let entries = db.ledger().list(&DateRange::all(), None).await.unwrap();
        assert_eq!(entries.transactions.len(), 1);
        assert_eq!(entries.transactions[0].amount, 26_000);
        assert_eq!(entries.transactions[0].date, updated.date);
        assert_eq!(
            entries.transactions[0].description,
            "Raw material purchase: Tepung Terigu"
        );
    }

    #[tokio::test]
    async fn test_delete_cascades_expense() {
        let db = db().await;
        let created = db
            .raw_materials()
            .create(&input("Minyak", 20_000, 1, None))
            .await
            .unwrap();

        db.raw_materials().delete(&created.id).await.unwrap();

        let summary = db.ledger().list(&DateRange::all(), None).await.unwrap();
        assert!(summary.transactions.is_empty());
        assert!(matches!(
            db.raw_materials().delete(&created.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_deleting_expense_removes_purchase() {
        let db = db().await;
        let created = db
            .raw_materials()
            .create(&input("Gula", 15_000, 2, None))
            .await
            .unwrap();
        let entry = db
            .ledger()
            .latest_raw_material_expense("gula")
            .await
            .unwrap()
            .expect("expense for Gula");

        db.ledger().delete(&entry.id).await.unwrap();
        assert!(matches!(
            db.raw_materials().get(&created.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_latest_expense_picks_newest() {
        let db = db().await;
        let repo = db.raw_materials();
        repo.create(&input("Tepung", 11_000, 1, Some("2024-01-01")))
            .await
            .unwrap();
        repo.create(&input("Tepung", 12_500, 1, Some("2024-02-01")))
            .await
            .unwrap();
        repo.create(&input("Gula", 9_000, 1, Some("2024-03-01")))
            .await
            .unwrap();

        let latest = db
            .ledger()
            .latest_raw_material_expense("Tepung")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.amount, 12_500);
        assert!(db
            .ledger()
            .latest_raw_material_expense("Garam")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_rejects_bad_date() {
        let db = db().await;
        let err = db
            .raw_materials()
            .create(&input("Tepung", 12_000, 1, Some("March 5th")))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(_)));
        assert!(db.raw_materials().list().await.unwrap().is_empty());
    }
}
