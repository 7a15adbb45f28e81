//! PostgreSQL persistence.
//!
//! # Tables
//!
//! - `accounts` - signup data, account type and loyalty points
//! - `items` - the catalog (prices in smallest currency unit)
//! - `cart_entries` - `(account, item) -> quantity`
//! - `coupons` - single-use discounts, unique code
//! - `wishlist_entries`, `comparison_entries` - saved item lists
//!
//! Migrations live in `crates/shop-api/migrations/` and run at startup.
//!
//! Repositories borrow the pool. Functions that take a `&mut PgConnection`
//! are the building blocks of the checkout transaction.

pub mod accounts;
pub mod cart;
pub mod coupons;
pub mod items;
pub mod saved_lists;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use shop_core::NewItem;

pub use accounts::AccountRepository;
pub use cart::CartRepository;
pub use coupons::CouponRepository;
pub use items::ItemRepository;
pub use saved_lists::{SavedList, SavedListRepository};

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A referenced row does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Constraint violation (e.g., unique email).
    #[error("{0}")]
    Conflict(String),
}

/// Map unique and foreign-key violations of an insert to domain errors.
pub(crate) fn map_insert_error(
    err: sqlx::Error,
    conflict: &str,
    missing: &str,
) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound(missing.to_owned());
        }
    }
    RepositoryError::Database(err)
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply embedded migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Insert the seed catalog when the items table is empty.
///
/// Returns the number of inserted items.
pub async fn seed_catalog(pool: &PgPool, catalog: &[NewItem]) -> Result<usize, RepositoryError> {
    if catalog.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        return Ok(0);
    }

    for item in catalog {
        items::insert(&mut *tx, item).await?;
    }
    tx.commit().await?;

    info!("Seeded {} catalog items", catalog.len());
    Ok(catalog.len())
}
