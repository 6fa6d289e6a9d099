//! # Ledger Repository
//!
//! Income and expense entries, their date-range summaries and the financial
//! report.
//!
//! ## Delete By Owner
//! ```text
//! DELETE /api/transactions?id=
//!        │
//!        ▼
//!   owner()?
//!   ├── Sale(h)          stock += every line of h, DELETE entry, DELETE h
//!   ├── RawMaterial(r)   DELETE r               (entry cascades)
//!   └── Manual           DELETE entry
//! ```
//! Entries owned by a sale or a purchase are only ever edited through that
//! owner; [`LedgerRepository::update_manual`] refuses them.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::begin_write;
use crate::repository::sale::{delete_in, items_between};
use crate::repository::{new_id, timestamp};
use kulino_core::dates::date_or;
use kulino_core::{
    CoreError, DateRange, LedgerTransaction, ManualTransactionInput, Report, TransactionOwner,
    TransactionSummary, TransactionType, ValidationError,
};

pub(crate) const TRANSACTION_COLUMNS: &str = "id, kind, amount, description, date, \
                                              sales_header_id, raw_material_id, is_manual, created_at";

/// Repository for ledger operations.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Entries in `range`, newest first, optionally of one kind.
    ///
    /// `total_income`, `total_expense` and `sales_count` always cover the
    /// whole range, whatever `kind` filters the list to.
    pub async fn list(
        &self,
        range: &DateRange,
        kind: Option<TransactionType>,
    ) -> DbResult<TransactionSummary> {
        let (start, end) = (range.start(), range.end_exclusive());
        debug!(?start, ?end, ?kind, "Listing transactions");

        let in_range = self.between(start, end).await?;
        let (total_income, total_expense) = totals(&in_range);

        let sales_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sale_items \
             WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date < ?2)",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let transactions = match kind {
            Some(kind) => in_range.into_iter().filter(|t| t.kind == kind).collect(),
            None => in_range,
        };

        Ok(TransactionSummary {
            transactions,
            total_income,
            total_expense,
            sales_count,
        })
    }

    /// Gets one entry.
    pub async fn get(&self, id: &str) -> DbResult<LedgerTransaction> {
        sqlx::query_as(&format!(
            "SELECT {} FROM ledger_transactions WHERE id = ?1",
            TRANSACTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Transaction", id))
    }

    /// Records a hand-typed entry.
    pub async fn create_manual(
        &self,
        input: &ManualTransactionInput,
    ) -> DbResult<LedgerTransaction> {
        input.validate()?;

        let id = new_id();
        let now = timestamp();
        let date = date_or("date", input.date.as_deref(), now)?;

        sqlx::query(
            "INSERT INTO ledger_transactions \
             (id, kind, amount, description, date, sales_header_id, raw_material_id, is_manual, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, NULL, 1, ?6)",
        )
        .bind(&id)
        .bind(input.kind)
        .bind(input.amount)
        .bind(input.description.trim())
        .bind(date)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(id = %id, kind = %input.kind, amount = input.amount, "Manual transaction recorded");
        self.get(&id).await
    }

    /// Edits a hand-typed entry. The date is only changed when one is given.
    pub async fn update_manual(
        &self,
        input: &ManualTransactionInput,
    ) -> DbResult<LedgerTransaction> {
        input.validate()?;
        let id = input
            .id
            .as_deref()
            .ok_or_else(|| ValidationError::required("id"))?;

        let mut tx = begin_write(&self.pool).await?;

        let current: LedgerTransaction = sqlx::query_as(&format!(
            "SELECT {} FROM ledger_transactions WHERE id = ?1",
            TRANSACTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Transaction", id))?;

        let owner = current.owner();
        if owner != TransactionOwner::Manual {
            warn!(id = %id, owner = owner.label(), "Refusing direct edit of linked transaction");
            return Err(CoreError::LinkedTransaction {
                id: id.to_string(),
                owner: owner.label().to_string(),
            }
            .into());
        }

        let date = date_or("date", input.date.as_deref(), current.date)?;

        sqlx::query(
            "UPDATE ledger_transactions SET kind = ?2, amount = ?3, description = ?4, date = ?5 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(input.kind)
        .bind(input.amount)
        .bind(input.description.trim())
        .bind(date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(id = %id, "Manual transaction updated");
        self.get(id).await
    }

    /// Deletes an entry together with whatever owns it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        let entry: LedgerTransaction = sqlx::query_as(&format!(
            "SELECT {} FROM ledger_transactions WHERE id = ?1",
            TRANSACTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Transaction", id))?;

        match entry.owner() {
            TransactionOwner::Sale(header_id) => {
                delete_in(&mut tx, header_id).await?;
            }
            TransactionOwner::RawMaterial(raw_id) => {
                sqlx::query("DELETE FROM raw_materials WHERE id = ?1")
                    .bind(raw_id)
                    .execute(&mut *tx)
                    .await?;
            }
            TransactionOwner::Manual => {
                sqlx::query("DELETE FROM ledger_transactions WHERE id = ?1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        info!(id = %id, owner = entry.owner().label(), "Transaction deleted");
        Ok(())
    }

    /// Most recent purchase expense for a raw material of this name
    /// (case-insensitive). Used to prefill the purchase form.
    pub async fn latest_raw_material_expense(
        &self,
        name: &str,
    ) -> DbResult<Option<LedgerTransaction>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::required("name").into());
        }

        Ok(sqlx::query_as(
            "SELECT t.id, t.kind, t.amount, t.description, t.date, \
                    t.sales_header_id, t.raw_material_id, t.is_manual, t.created_at \
             FROM ledger_transactions t \
             JOIN raw_materials r ON r.id = t.raw_material_id \
             WHERE t.kind = 'EXPENSE' AND r.name = ?1 COLLATE NOCASE \
             ORDER BY t.date DESC, t.created_at DESC \
             LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Financial report for `range`.
    pub async fn report(&self, range: &DateRange) -> DbResult<Report> {
        let (start, end) = (range.start(), range.end_exclusive());

        let transactions = self.between(start, end).await?;
        let sales = items_between(&self.pool, start, end).await?;
        let (total_income, total_expense) = totals(&transactions);
        let total_sales: i64 = sales.iter().map(|i| i.quantity).sum();

        debug!(
            entries = transactions.len(),
            items = sales.len(),
            "Report assembled"
        );

        Ok(Report {
            transactions,
            sales,
            total_income,
            total_expense,
            net: total_income - total_expense,
            total_sales,
            date_range: range.display(),
        })
    }

    async fn between(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<LedgerTransaction>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {} FROM ledger_transactions \
             WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date < ?2) \
             ORDER BY date DESC, created_at DESC",
            TRANSACTION_COLUMNS
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?)
    }
}

fn totals(entries: &[LedgerTransaction]) -> (i64, i64) {
    entries.iter().fold((0, 0), |(income, expense), t| match t.kind {
        TransactionType::Income => (income + t.amount, expense),
        TransactionType::Expense => (income, expense + t.amount),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn manual(kind: TransactionType, amount: i64, date: Option<&str>) -> ManualTransactionInput {
        ManualTransactionInput {
            id: None,
            kind,
            amount,
            description: "Gas".to_string(),
            date: date.map(str::to_string),
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_manual_lifecycle() {
        let db = db().await;
        let repo = db.ledger();

        let created = repo
            .create_manual(&manual(TransactionType::Expense, 25_000, Some("2024-03-05")))
            .await
            .unwrap();
        assert!(created.is_manual);
        assert_eq!(created.owner(), TransactionOwner::Manual);
        assert_eq!(created.date.to_rfc3339(), "2024-03-05T00:00:00+00:00");

        let mut edit = manual(TransactionType::Income, 30_000, None);
        edit.id = Some(created.id.clone());
        let updated = repo.update_manual(&edit).await.unwrap();
        assert_eq!(updated.kind, TransactionType::Income);
        assert_eq!(updated.amount, 30_000);
        assert_eq!(updated.date, created.date);

        repo.delete(&created.id).await.unwrap();
        assert!(matches!(
            repo.get(&created.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_manual_amount_must_be_positive() {
        let db = db().await;
        let err = db
            .ledger()
            .create_manual(&manual(TransactionType::Expense, 0, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_filters_by_range_and_kind() {
        let db = db().await;
        let repo = db.ledger();
        for (kind, amount, date) in [
            (TransactionType::Income, 10_000, "2024-03-01"),
            (TransactionType::Expense, 4_000, "31/03/2024"),
            (TransactionType::Income, 7_000, "2024-04-01"),
        ] {
            repo.create_manual(&manual(kind, amount, Some(date)))
                .await
                .unwrap();
        }

        let march = DateRange::parse(Some("2024-03-01"), Some("2024-03-31")).unwrap();
        let summary = repo.list(&march, None).await.unwrap();
        assert_eq!(summary.transactions.len(), 2);
        assert_eq!(summary.total_income, 10_000);
        assert_eq!(summary.total_expense, 4_000);
        assert_eq!(summary.sales_count, 0);
        assert!(summary.transactions[0].date > summary.transactions[1].date);

        let expenses = repo
            .list(&march, Some(TransactionType::Expense))
            .await
            .unwrap();
        assert_eq!(expenses.transactions.len(), 1);
        assert_eq!(expenses.total_income, 10_000);

        let everything = repo.list(&DateRange::all(), None).await.unwrap();
        assert_eq!(everything.transactions.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_unknown() {
        let db = db().await;
        assert!(matches!(
            db.ledger().delete("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_report_net() {
        let db = db().await;
        let repo = db.ledger();
        repo.create_manual(&manual(TransactionType::Income, 50_000, Some("2024-03-02")))
            .await
            .unwrap();
        repo.create_manual(&manual(TransactionType::Expense, 20_000, Some("2024-03-03")))
            .await
            .unwrap();

        let range = DateRange::parse(Some("2024-03-03"), Some("2024-03-03")).unwrap();
        let report = repo.report(&range).await.unwrap();
        assert_eq!(report.transactions.len(), 1);
        assert_eq!(report.net, -20_000);
        assert_eq!(report.date_range.period_label(), "03/03/2024");

        let all = repo.report(&DateRange::all()).await.unwrap();
        assert_eq!(all.net, 30_000);
        assert_eq!(all.total_sales, 0);
    }
}
