//! Wishlist and comparison list.
//!
//! Both are plain `(account, item)` membership sets and share one repository.

use sqlx::PgPool;

use shop_core::{AccountId, Currency, Item, ItemId};

use super::items::ItemRow;
use super::{map_insert_error, RepositoryError};

/// Which saved list an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedList {
    Wishlist,
    Comparison,
}

impl SavedList {
    fn table(self) -> &'static str {
        match self {
            SavedList::Wishlist => "wishlist_entries",
            SavedList::Comparison => "comparison_entries",
        }
    }

    /// Human-readable name used in error messages
    pub fn label(self) -> &'static str {
        match self {
            SavedList::Wishlist => "wishlist",
            SavedList::Comparison => "comparison list",
        }
    }
}

/// Repository for one saved list.
pub struct SavedListRepository<'a> {
    pool: &'a PgPool,
    list: SavedList,
    currency: Currency,
}

impl<'a> SavedListRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, list: SavedList, currency: Currency) -> Self {
        Self {
            pool,
            list,
            currency,
        }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the item is already saved.
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn add(&self, account_id: AccountId, item_id: ItemId) -> Result<(), RepositoryError> {
        let conflict = format!("item is already in the {}", self.list.label());

        sqlx::query(&format!(
            "INSERT INTO {} (account_id, item_id) VALUES ($1, $2)",
            self.list.table()
        ))
        .bind(account_id)
        .bind(item_id)
        .execute(self.pool)
        .await
        .map_err(|e| map_insert_error(e, &conflict, "item"))?;
        Ok(())
    }

    /// The saved item, if it is on the list.
    pub async fn get(&self, account_id: AccountId, item_id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            r#"
            SELECT i.id, i.name, i.description, i.price_cents
            FROM {} s
            JOIN items i ON i.id = s.item_id
            WHERE s.account_id = $1 AND s.item_id = $2
            "#,
            self.list.table()
        ))
        .bind(account_id)
        .bind(item_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| r.into_item(self.currency)))
    }

    /// Saved items in the order they were added.
    pub async fn items(&self, account_id: AccountId) -> Result<Vec<Item>, RepositoryError> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            r#"
            SELECT i.id, i.name, i.description, i.price_cents
            FROM {} s
            JOIN items i ON i.id = s.item_id
            WHERE s.account_id = $1
            ORDER BY s.added_at, i.id
            "#,
            self.list.table()
        ))
        .bind(account_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_item(self.currency)).collect())
    }

    /// Returns `false` when the item was not on the list.
    pub async fn remove(&self, account_id: AccountId, item_id: ItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE account_id = $1 AND item_id = $2",
            self.list.table()
        ))
        .bind(account_id)
        .bind(item_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns the number of removed entries.
    pub async fn clear(&self, account_id: AccountId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE account_id = $1", self.list.table()))
            .bind(account_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_use_separate_tables() {
        assert_ne!(SavedList::Wishlist.table(), SavedList::Comparison.table());
        assert_eq!(SavedList::Comparison.label(), "comparison list");
    }
}
