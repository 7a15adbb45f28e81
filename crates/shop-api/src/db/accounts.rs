//! Account repository.
//!
//! Password hashes are only ever read by [`AccountRepository::get_credentials`].

use sqlx::{FromRow, PgConnection, PgPool};

use shop_core::{Account, AccountId, AccountType, NewAccount};

use super::{map_insert_error, RepositoryError};

const ACCOUNT_COLUMNS: &str = "id, name, email, account_type, points";

#[derive(Debug, FromRow)]
struct AccountRow {
    id: i64,
    name: String,
    email: String,
    account_type: i16,
    points: i64,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let account_type = AccountType::from_i16(row.account_type).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "invalid account type {} for account {}",
                row.account_type, row.id
            ))
        })?;

        Ok(Account {
            id: row.id,
            name: row.name,
            email: row.email,
            account_type,
            points: row.points,
        })
    }
}

#[derive(Debug, FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    account: AccountRow,
    password_hash: String,
}

/// Lock an account row for the rest of the transaction.
pub(crate) async fn lock_for_update(
    conn: &mut PgConnection,
    id: AccountId,
) -> Result<Option<Account>, RepositoryError> {
    let row: Option<AccountRow> = sqlx::query_as(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(Account::try_from).transpose()
}

/// Credit loyalty points; returns the new balance.
pub(crate) async fn add_points(
    conn: &mut PgConnection,
    id: AccountId,
    points: i64,
) -> Result<i64, RepositoryError> {
    let balance: Option<i64> =
        sqlx::query_scalar("UPDATE accounts SET points = points + $2 WHERE id = $1 RETURNING points")
            .bind(id)
            .bind(points)
            .fetch_optional(conn)
            .await?;

    balance.ok_or_else(|| RepositoryError::NotFound("account".to_owned()))
}

/// Repository for accounts.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Register an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create(&self, account: &NewAccount) -> Result<Account, RepositoryError> {
        let row: AccountRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO accounts (name, email, password_hash, account_type)
            VALUES ($1, $2, $3, $4)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.account_type.as_i16())
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_insert_error(e, "email already registered", "account"))?;

        Account::try_from(row)
    }

    pub async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(Account::try_from).transpose()
    }

    /// Account and stored password hash for a login attempt.
    pub async fn get_credentials(
        &self,
        email: &str,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        let row: Option<CredentialsRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS}, password_hash FROM accounts WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((Account::try_from(r.account)?, r.password_hash))),
            None => Ok(None),
        }
    }

    pub async fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        let rows: Vec<AccountRow> =
            sqlx::query_as(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"))
                .fetch_all(self.pool)
                .await?;

        rows.into_iter().map(Account::try_from).collect()
    }
}
