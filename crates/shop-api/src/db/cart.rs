//! Cart repository.

use sqlx::{FromRow, PgConnection, PgPool};

use shop_core::{AccountId, CartLine, Currency, ItemId};

use super::items::ItemRow;
use super::{map_insert_error, RepositoryError};

#[derive(Debug, FromRow)]
struct CartLineRow {
    #[sqlx(flatten)]
    item: ItemRow,
    quantity: i32,
}

impl CartLineRow {
    fn into_line(self, currency: Currency) -> Result<CartLine, RepositoryError> {
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative quantity {} for item {}",
                self.quantity, self.item.id
            ))
        })?;
        Ok(CartLine::new(self.item.into_item(currency), quantity))
    }
}

/// Cart lines joined with current item data, oldest item id first.
pub(crate) async fn lines_in(
    conn: &mut PgConnection,
    account_id: AccountId,
    currency: Currency,
) -> Result<Vec<CartLine>, RepositoryError> {
    let rows: Vec<CartLineRow> = sqlx::query_as(
        r#"
        SELECT i.id, i.name, i.description, i.price_cents, c.quantity
        FROM cart_entries c
        JOIN items i ON i.id = c.item_id
        WHERE c.account_id = $1
        ORDER BY i.id
        "#,
    )
    .bind(account_id)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(|r| r.into_line(currency)).collect()
}

/// Delete every cart row of an account; returns the number of removed lines.
pub(crate) async fn clear_in(
    conn: &mut PgConnection,
    account_id: AccountId,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM cart_entries WHERE account_id = $1")
        .bind(account_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Repository for shopping carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
    currency: Currency,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, currency: Currency) -> Self {
        Self { pool, currency }
    }

    /// Put an item in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the item is already in the cart.
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn add(
        &self,
        account_id: AccountId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let quantity = i32::try_from(quantity)
            .map_err(|_| RepositoryError::DataCorruption(format!("quantity {quantity} too large")))?;

        sqlx::query("INSERT INTO cart_entries (account_id, item_id, quantity) VALUES ($1, $2, $3)")
            .bind(account_id)
            .bind(item_id)
            .bind(quantity)
            .execute(self.pool)
            .await
            .map_err(|e| map_insert_error(e, "item is already in the cart", "item"))?;
        Ok(())
    }

    /// Returns `false` when the item was not in the cart.
    pub async fn remove(&self, account_id: AccountId, item_id: ItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_entries WHERE account_id = $1 AND item_id = $2")
            .bind(account_id)
            .bind(item_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn lines(&self, account_id: AccountId) -> Result<Vec<CartLine>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        lines_in(&mut conn, account_id, self.currency).await
    }

    /// Sum of quantities (0 for an empty cart).
    pub async fn count(&self, account_id: AccountId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM cart_entries WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Returns the number of removed lines.
    pub async fn clear(&self, account_id: AccountId) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        clear_in(&mut conn, account_id).await
    }
}
