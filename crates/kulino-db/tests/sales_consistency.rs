//! End-to-end checks of the stock / sale / ledger consistency rules against
//! a real SQLite database.

use std::time::Duration;

use kulino_core::{
    CoreError, DateRange, MenuInput, NewSale, RawMaterialInput, SaleEdit, SaleItemRequest,
    SizeInput, TransactionType, ValidationError,
};
use kulino_db::{Database, DbConfig, DbError};

// =============================================================================
// Helpers
// =============================================================================

async fn seeded(db: &Database, sizes: &[(&str, i64, i64)]) -> Vec<String> {
    let menu = db
        .menus()
        .create(&MenuInput {
            id: None,
            name: "Keripik".to_string(),
            image: None,
            sizes: sizes
                .iter()
                .map(|(label, price, stock)| SizeInput {
                    id: None,
                    size: label.to_string(),
                    price: *price,
                    stock: *stock,
                })
                .collect(),
        })
        .await
        .unwrap();

    sizes
        .iter()
        .map(|(label, _, _)| {
            menu.sizes
                .iter()
                .find(|s| s.size == *label)
                .unwrap()
                .id
                .clone()
        })
        .collect()
}

fn line(size_id: &str, quantity: i64) -> SaleItemRequest {
    SaleItemRequest {
        size_id: size_id.to_string(),
        quantity,
        price: None,
    }
}

async fn stock(db: &Database, size_id: &str) -> i64 {
    db.menus().get_size(size_id).await.unwrap().stock
}

async fn count(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(db.pool())
        .await
        .unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn create_edit_delete_conserves_stock() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ids = seeded(&db, &[("Besar", 15_000, 5)]).await;
    let size = &ids[0];

    let sale = db
        .sales()
        .create(&NewSale {
            buyer_name: "Sari".to_string(),
            items: vec![line(size, 3)],
        })
        .await
        .unwrap();
    assert_eq!(stock(&db, size).await, 2);

    let edited = db
        .sales()
        .edit(&SaleEdit {
            sales_header_id: sale.header.id.clone(),
            buyer_name: "Sari".to_string(),
            items: vec![line(size, 1)],
        })
        .await
        .unwrap();
    assert_eq!(stock(&db, size).await, 4);
    assert_eq!(edited.header.total_amount, 15_000);
    assert_eq!(edited.transaction.amount, 15_000);
    assert_eq!(edited.transaction.description, "Keripik (Besar) x1");

    db.ledger().delete(&edited.transaction.id).await.unwrap();
    assert_eq!(stock(&db, size).await, 5);
    for table in ["sales_headers", "sale_items", "ledger_transactions"] {
        assert_eq!(count(&db, table).await, 0, "{} not empty", table);
    }
}

#[tokio::test]
async fn edit_reuses_capacity_freed_by_lowered_line() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ids = seeded(&db, &[("Besar", 15_000, 4)]).await;
    let size = &ids[0];

    let sale = db
        .sales()
        .create(&NewSale {
            buyer_name: "Sari".to_string(),
            items: vec![line(size, 3)],
        })
        .await
        .unwrap();
    assert_eq!(stock(&db, size).await, 1);

    // Line A 3 -> 1, new line B asks for 2 more units of the same size:
    // only 1 was spare before the edit.
    let edited = db
        .sales()
        .edit(&SaleEdit {
            sales_header_id: sale.header.id.clone(),
            buyer_name: "Sari".to_string(),
            items: vec![line(size, 1), line(size, 2)],
        })
        .await
        .unwrap();

    assert_eq!(edited.items.len(), 2);
    assert_eq!(stock(&db, size).await, 1);
    assert_eq!(edited.transaction.amount, 45_000);
}

#[tokio::test]
async fn failed_edit_leaves_sale_untouched() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ids = seeded(&db, &[("Besar", 15_000, 5), ("Kecil", 5_000, 1)]).await;

    let sale = db
        .sales()
        .create(&NewSale {
            buyer_name: "Sari".to_string(),
            items: vec![line(&ids[0], 2)],
        })
        .await
        .unwrap();

    let err = db
        .sales()
        .edit(&SaleEdit {
            sales_header_id: sale.header.id.clone(),
            buyer_name: "Sari".to_string(),
            items: vec![line(&ids[0], 1), line(&ids[1], 2)],
        })
        .await
        .unwrap_err();
    match err {
        DbError::Rejected(CoreError::StockNotEnough {
            size_name,
            remaining_stock,
            ..
        }) => {
            assert_eq!(size_name, "Kecil");
            assert_eq!(remaining_stock, 1);
        }
        other => panic!("expected StockNotEnough, got {:?}", other),
    }

    assert_eq!(db.sales().get(&sale.header.id).await.unwrap().items, sale.items);
    assert_eq!(stock(&db, &ids[0]).await, 3);
    assert_eq!(stock(&db, &ids[1]).await, 1);
}

#[tokio::test]
async fn failure_before_ledger_insert_rolls_back_everything() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ids = seeded(&db, &[("Besar", 15_000, 5)]).await;

    sqlx::query(
        "CREATE TRIGGER fail_ledger BEFORE INSERT ON ledger_transactions \
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let err = db
        .sales()
        .create(&NewSale {
            buyer_name: "Sari".to_string(),
            items: vec![line(&ids[0], 3)],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::QueryFailed(_)), "got {:?}", err);

    assert_eq!(stock(&db, &ids[0]).await, 5);
    assert_eq!(count(&db, "sales_headers").await, 0);
    assert_eq!(count(&db, "sale_items").await, 0);
}

#[tokio::test]
async fn oversized_amounts_are_rejected_without_writes() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ids = seeded(&db, &[("Besar", 15_000, 5)]).await;

    let err = db
        .sales()
        .create(&NewSale {
            buyer_name: "Sari".to_string(),
            items: vec![SaleItemRequest {
                size_id: ids[0].clone(),
                quantity: 3,
                price: Some(i64::MAX / 2),
            }],
        })
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            DbError::Rejected(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ),
        "got {:?}",
        err
    );

    let err = db
        .raw_materials()
        .create(&RawMaterialInput {
            id: None,
            name: "Tepung".to_string(),
            unit_price: i64::MAX / 2,
            quantity: 3,
            unit: "kg".to_string(),
            date: None,
        })
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            DbError::Rejected(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ),
        "got {:?}",
        err
    );

    assert_eq!(stock(&db, &ids[0]).await, 5);
    assert_eq!(count(&db, "sales_headers").await, 0);
    assert_eq!(count(&db, "raw_materials").await, 0);
    assert_eq!(count(&db, "ledger_transactions").await, 0);
}

#[tokio::test]
async fn delete_by_header_matches_delete_by_transaction() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ids = seeded(&db, &[("Besar", 15_000, 5)]).await;

    let sale = db
        .sales()
        .create(&NewSale {
            buyer_name: "Sari".to_string(),
            items: vec![line(&ids[0], 2), line(&ids[0], 1)],
        })
        .await
        .unwrap();

    db.sales().delete(&sale.header.id).await.unwrap();
    assert_eq!(stock(&db, &ids[0]).await, 5);
    assert!(matches!(
        db.ledger().get(&sale.transaction.id).await,
        Err(DbError::NotFound { .. })
    ));
}

#[tokio::test]
async fn sizes_with_sales_cannot_be_removed() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ids = seeded(&db, &[("Besar", 15_000, 5)]).await;
    let menu_id = db.menus().get_size(&ids[0]).await.unwrap().menu_id;

    db.sales()
        .create(&NewSale {
            buyer_name: "Sari".to_string(),
            items: vec![line(&ids[0], 1)],
        })
        .await
        .unwrap();

    assert!(matches!(
        db.menus().delete(&menu_id).await,
        Err(DbError::ForeignKeyViolation { .. })
    ));
    assert_eq!(stock(&db, &ids[0]).await, 4);
}

#[tokio::test]
async fn report_counts_sold_items() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ids = seeded(&db, &[("Besar", 15_000, 10), ("Kecil", 5_000, 10)]).await;

    db.sales()
        .create(&NewSale {
            buyer_name: "Sari".to_string(),
            items: vec![line(&ids[0], 2), line(&ids[1], 3)],
        })
        .await
        .unwrap();

    let report = db.ledger().report(&DateRange::all()).await.unwrap();
    assert_eq!(report.total_income, 45_000);
    assert_eq!(report.total_sales, 5);
    assert_eq!(report.sales.len(), 2);
    assert_eq!(report.transactions[0].kind, TransactionType::Income);

    let summary = db.ledger().list(&DateRange::all(), None).await.unwrap();
    assert_eq!(summary.sales_count, 2);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_sales_cannot_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(
        DbConfig::new(dir.path().join("kulino.db"))
            .max_connections(4)
            .busy_timeout(Duration::from_secs(10)),
    )
    .await
    .unwrap();
    let ids = seeded(&db, &[("Besar", 15_000, 2)]).await;

    let sale = |buyer: &str| NewSale {
        buyer_name: buyer.to_string(),
        items: vec![line(&ids[0], 2)],
    };
    let (first, second) = (sale("Sari"), sale("Budi"));
    let (sales_a, sales_b) = (db.sales(), db.sales());
    let (a, b) = tokio::join!(sales_a.create(&first), sales_b.create(&second));

    let results = [a, b];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let shortfalls = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(DbError::Rejected(CoreError::StockNotEnough {
                    remaining_stock: 0,
                    ..
                }))
            )
        })
        .count();

    assert_eq!(successes, 1);
    assert_eq!(shortfalls, 1);
    assert_eq!(stock(&db, &ids[0]).await, 0);
    assert_eq!(count(&db, "ledger_transactions").await, 1);

    db.close().await;
}
