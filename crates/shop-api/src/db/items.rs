//! Item repository.

use sqlx::{FromRow, PgConnection, PgPool};

use shop_core::{Currency, Item, ItemId, ItemPatch, NewItem, Price};

use super::RepositoryError;

const ITEM_COLUMNS: &str = "id, name, description, price_cents";

#[derive(Debug, FromRow)]
pub(crate) struct ItemRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
}

impl ItemRow {
    pub(crate) fn into_item(self, currency: Currency) -> Item {
        Item {
            id: self.id,
            name: self.name,
            description: self.description,
            price: Price::from_cents(self.price_cents, currency),
        }
    }
}

/// Insert an item on an existing connection.
pub(crate) async fn insert(conn: &mut PgConnection, item: &NewItem) -> Result<Item, RepositoryError> {
    let row: ItemRow = sqlx::query_as(&format!(
        "INSERT INTO items (name, description, price_cents) VALUES ($1, $2, $3) RETURNING {ITEM_COLUMNS}"
    ))
    .bind(&item.name)
    .bind(&item.description)
    .bind(item.price.amount)
    .fetch_one(conn)
    .await?;

    Ok(row.into_item(item.price.currency))
}

/// Repository for catalog items.
pub struct ItemRepository<'a> {
    pool: &'a PgPool,
    currency: Currency,
}

impl<'a> ItemRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, currency: Currency) -> Self {
        Self { pool, currency }
    }

    pub async fn create(&self, item: &NewItem) -> Result<Item, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, item).await
    }

    /// Apply a partial update. Returns `None` when the item does not exist.
    pub async fn update(&self, id: ItemId, patch: &ItemPatch) -> Result<Option<Item>, RepositoryError> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            r#"
            UPDATE items
            SET name        = COALESCE($2, name),
                description = COALESCE($3, description),
                price_cents = COALESCE($4, price_cents),
                updated_at  = now()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.price.map(|p| p.amount))
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| r.into_item(self.currency)))
    }

    /// Returns `false` when nothing was deleted.
    pub async fn delete(&self, id: ItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let row: Option<ItemRow> =
            sqlx::query_as(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(|r| r.into_item(self.currency)))
    }

    /// Case-insensitive substring match on name or description.
    pub async fn search(&self, query: &str) -> Result<Vec<Item>, RepositoryError> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ITEM_COLUMNS} FROM items
            WHERE strpos(lower(name), lower($1)) > 0
               OR strpos(lower(description), lower($1)) > 0
            ORDER BY id
            "#
        ))
        .bind(query)
        .fetch_all(self.pool)
        .await?;

        Ok(self.into_items(rows))
    }

    pub async fn list(&self) -> Result<Vec<Item>, RepositoryError> {
        let rows: Vec<ItemRow> =
            sqlx::query_as(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id"))
                .fetch_all(self.pool)
                .await?;

        Ok(self.into_items(rows))
    }

    pub async fn random(&self) -> Result<Option<Item>, RepositoryError> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM items ORDER BY random() LIMIT 1"
        ))
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| r.into_item(self.currency)))
    }

    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    fn into_items(&self, rows: Vec<ItemRow>) -> Vec<Item> {
        rows.into_iter().map(|r| r.into_item(self.currency)).collect()
    }
}
