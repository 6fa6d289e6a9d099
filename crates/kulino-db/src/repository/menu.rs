//! # Menu Repository
//!
//! The catalog: menus and their sized variants.
//!
//! ## Full-Replace Update
//! ```text
//! PUT /api/menus { id, name, image, sizes: [...] }
//!
//!   BEGIN IMMEDIATE
//!   ├── UPDATE menus
//!   ├── DELETE sizes of this menu not listed   (FK error if sales use them)
//!   ├── UPDATE sizes listed with an id of this menu
//!   ├── INSERT sizes listed without one
//!   └── COMMIT
//! ```
//! Sizes referenced by historical sale items cannot be removed; the whole
//! update is refused with a foreign-key violation instead.

use std::collections::{HashMap, HashSet};

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::pool::begin_write;
use crate::repository::{new_id, timestamp};
use kulino_core::{Menu, MenuInput, Size};

/// Repository for catalog operations.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    /// Creates a new MenuRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    /// All menus by name, each with its sizes ordered by label.
    pub async fn list(&self) -> DbResult<Vec<Menu>> {
        let mut menus: Vec<Menu> = sqlx::query_as(
            "SELECT id, name, image, created_at FROM menus ORDER BY name COLLATE NOCASE, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let sizes: Vec<Size> = sqlx::query_as(
            "SELECT id, menu_id, size, price, stock FROM sizes ORDER BY size COLLATE NOCASE, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_menu: HashMap<String, Vec<Size>> = HashMap::new();
        for size in sizes {
            by_menu.entry(size.menu_id.clone()).or_default().push(size);
        }
        for menu in &mut menus {
            menu.sizes = by_menu.remove(&menu.id).unwrap_or_default();
        }

        debug!(count = menus.len(), "Listed menus");
        Ok(menus)
    }

    /// Gets a menu with its sizes.
    pub async fn get(&self, id: &str) -> DbResult<Menu> {
        let mut conn = self.pool.acquire().await?;
        load_menu(&mut conn, id).await
    }

    /// Gets a single size.
    pub async fn get_size(&self, id: &str) -> DbResult<Size> {
        sqlx::query_as("SELECT id, menu_id, size, price, stock FROM sizes WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Size", id))
    }

    /// Creates a menu and all of its sizes in one unit.
    pub async fn create(&self, input: &MenuInput) -> DbResult<Menu> {
        input.validate()?;

        let id = new_id();
        let now = timestamp();
        debug!(id = %id, name = %input.name, sizes = input.sizes.len(), "Creating menu");

        let mut tx = begin_write(&self.pool).await?;

        sqlx::query("INSERT INTO menus (id, name, image, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&id)
            .bind(input.name.trim())
            .bind(&input.image)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        for size in &input.sizes {
            insert_size(&mut tx, &id, size).await?;
        }

        let menu = load_menu(&mut tx, &id).await?;
        tx.commit().await?;

        info!(id = %menu.id, name = %menu.name, "Menu created");
        Ok(menu)
    }

    /// Replaces a menu's fields and size list.
    pub async fn update(&self, input: &MenuInput) -> DbResult<Menu> {
        input.validate()?;
        let id = input
            .id
            .as_deref()
            .ok_or_else(|| kulino_core::ValidationError::required("id"))?;

        debug!(id = %id, sizes = input.sizes.len(), "Updating menu");

        let mut tx = begin_write(&self.pool).await?;

        let updated = sqlx::query("UPDATE menus SET name = ?2, image = ?3 WHERE id = ?1")
            .bind(id)
            .bind(input.name.trim())
            .bind(&input.image)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(DbError::not_found("Menu", id));
        }

        let existing: Vec<(String,)> = sqlx::query_as("SELECT id FROM sizes WHERE menu_id = ?1")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
        let existing: HashSet<String> = existing.into_iter().map(|(s,)| s).collect();

        let kept: HashSet<&str> = input
            .sizes
            .iter()
            .filter_map(|s| s.id.as_deref())
            .filter(|s| existing.contains(*s))
            .collect();

        for stale in existing.iter().filter(|s| !kept.contains(s.as_str())) {
            sqlx::query("DELETE FROM sizes WHERE id = ?1")
                .bind(stale)
                .execute(&mut *tx)
                .await?;
            debug!(size_id = %stale, "Size removed");
        }

        for size in &input.sizes {
            match size.id.as_deref().filter(|s| kept.contains(s)) {
                Some(size_id) => {
                    sqlx::query(
                        "UPDATE sizes SET size = ?2, price = ?3, stock = ?4 WHERE id = ?1",
                    )
                    .bind(size_id)
                    .bind(size.size.trim())
                    .bind(size.price)
                    .bind(size.stock)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    insert_size(&mut tx, id, size).await?;
                }
            }
        }

        let menu = load_menu(&mut tx, id).await?;
        tx.commit().await?;

        info!(id = %menu.id, sizes = menu.sizes.len(), "Menu updated");
        Ok(menu)
    }

    /// Deletes a menu and its sizes.
    ///
    /// Fails with [`DbError::ForeignKeyViolation`] when sales reference it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        let deleted = sqlx::query("DELETE FROM menus WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(DbError::not_found("Menu", id));
        }

        tx.commit().await?;
        info!(id = %id, "Menu deleted");
        Ok(())
    }
}

async fn insert_size(
    conn: &mut SqliteConnection,
    menu_id: &str,
    size: &kulino_core::SizeInput,
) -> DbResult<()> {
    sqlx::query("INSERT INTO sizes (id, menu_id, size, price, stock) VALUES (?1, ?2, ?3, ?4, ?5)")
        .bind(new_id())
        .bind(menu_id)
        .bind(size.size.trim())
        .bind(size.price)
        .bind(size.stock)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn load_menu(conn: &mut SqliteConnection, id: &str) -> DbResult<Menu> {
    let mut menu: Menu =
        sqlx::query_as("SELECT id, name, image, created_at FROM menus WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Menu", id))?;

    menu.sizes = sqlx::query_as(
        "SELECT id, menu_id, size, price, stock FROM sizes WHERE menu_id = ?1 \
         ORDER BY size COLLATE NOCASE, id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(menu)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use kulino_core::SizeInput;

    fn size(label: &str, price: i64, stock: i64) -> SizeInput {
        SizeInput {
            id: None,
            size: label.to_string(),
            price,
            stock,
        }
    }

    fn menu(name: &str, sizes: Vec<SizeInput>) -> MenuInput {
        MenuInput {
            id: None,
            name: name.to_string(),
            image: None,
            sizes,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let db = db().await;
        let repo = db.menus();

        repo.create(&menu("Makaroni", vec![size("Kecil", 5_000, 10)]))
            .await
            .unwrap();
        let keripik = repo
            .create(&menu(
                "Keripik",
                vec![size("Sedang", 10_000, 3), size("Besar", 15_000, 5)],
            ))
            .await
            .unwrap();

        assert_eq!(keripik.sizes.len(), 2);
        assert_eq!(keripik.sizes[0].size, "Besar");

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Keripik");
        assert_eq!(all[0].sizes.len(), 2);
        assert_eq!(all[1].sizes[0].stock, 10);
    }

    #[tokio::test]
    async fn test_create_requires_sizes() {
        let db = db().await;
        let err = db.menus().create(&menu("Kosong", vec![])).await.unwrap_err();
        assert!(matches!(err, DbError::Rejected(_)));
        assert!(db.menus().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_sizes() {
        let db = db().await;
        let repo = db.menus();
        let created = repo
            .create(&menu(
                "Keripik",
                vec![size("Besar", 15_000, 5), size("Kecil", 5_000, 5)],
            ))
            .await
            .unwrap();
        let besar = created.sizes.iter().find(|s| s.size == "Besar").unwrap();

        let mut input = menu(
            "Keripik Pedas",
            vec![
                SizeInput {
                    id: Some(besar.id.clone()),
                    size: "Besar".to_string(),
                    price: 16_000,
                    stock: 7,
                },
                size("Jumbo", 25_000, 2),
            ],
        );
        input.id = Some(created.id.clone());

        let updated = repo.update(&input).await.unwrap();
        assert_eq!(updated.name, "Keripik Pedas");
        assert_eq!(updated.sizes.len(), 2);

        let kept = updated.sizes.iter().find(|s| s.size == "Besar").unwrap();
        assert_eq!(kept.id, besar.id);
        assert_eq!(kept.price, 16_000);
        assert_eq!(kept.stock, 7);
        assert!(updated.sizes.iter().all(|s| s.size != "Kecil"));
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_menu() {
        let db = db().await;
        let mut input = menu("Ghost", vec![size("Kecil", 1_000, 1)]);
        input.id = Some("missing".to_string());

        assert!(matches!(
            db.menus().update(&input).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.menus().delete("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_sizes() {
        let db = db().await;
        let created = db
            .menus()
            .create(&menu("Keripik", vec![size("Besar", 15_000, 5)]))
            .await
            .unwrap();
        let size_id = created.sizes[0].id.clone();

        db.menus().delete(&created.id).await.unwrap();

        assert!(matches!(
            db.menus().get_size(&size_id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
