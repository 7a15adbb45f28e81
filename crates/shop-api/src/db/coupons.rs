//! Coupon repository.

use chrono::NaiveDate;
use sqlx::{FromRow, PgConnection, PgPool};

use shop_core::{AccountId, Coupon, NewCoupon};

use super::{map_insert_error, RepositoryError};

const COUPON_COLUMNS: &str = "id, account_id, code, discount_percent, expires_on, used";

#[derive(Debug, FromRow)]
struct CouponRow {
    id: i64,
    account_id: i64,
    code: String,
    discount_percent: i16,
    expires_on: NaiveDate,
    used: bool,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let discount_percent = u8::try_from(row.discount_percent)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "invalid discount {} for coupon {}",
                    row.discount_percent, row.id
                ))
            })?;

        Ok(Coupon {
            id: row.id,
            account_id: row.account_id,
            code: row.code,
            discount_percent,
            expires_on: row.expires_on,
            used: row.used,
        })
    }
}

async fn find_active(
    conn: &mut PgConnection,
    account_id: AccountId,
    today: NaiveDate,
    lock: bool,
) -> Result<Option<Coupon>, RepositoryError> {
    let row: Option<CouponRow> = sqlx::query_as(&format!(
        r#"
        SELECT {COUPON_COLUMNS} FROM coupons
        WHERE account_id = $1 AND NOT used AND expires_on > $2
        ORDER BY id
        LIMIT 1
        {}
        "#,
        if lock { "FOR UPDATE" } else { "" }
    ))
    .bind(account_id)
    .bind(today)
    .fetch_optional(conn)
    .await?;

    row.map(Coupon::try_from).transpose()
}

/// Active coupon of an account, locked for the rest of the transaction.
pub(crate) async fn lock_active(
    conn: &mut PgConnection,
    account_id: AccountId,
    today: NaiveDate,
) -> Result<Option<Coupon>, RepositoryError> {
    find_active(conn, account_id, today, true).await
}

pub(crate) async fn mark_used(conn: &mut PgConnection, coupon_id: i64) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE coupons SET used = TRUE WHERE id = $1 AND NOT used")
        .bind(coupon_id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(format!(
            "coupon {coupon_id} was already used"
        )));
    }
    Ok(())
}

/// Repository for coupons.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a coupon for an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code exists or the account
    /// already holds an active coupon.
    pub async fn apply(
        &self,
        account_id: AccountId,
        coupon: &NewCoupon,
        today: NaiveDate,
    ) -> Result<Coupon, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // serializes concurrent applies for the same account
        let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(account_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound("account".to_owned()));
        }

        if find_active(&mut *tx, account_id, today, false).await?.is_some() {
            return Err(RepositoryError::Conflict(
                "an active coupon is already applied".to_owned(),
            ));
        }

        let row: CouponRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO coupons (account_id, code, discount_percent, expires_on)
            VALUES ($1, $2, $3, $4)
            RETURNING {COUPON_COLUMNS}
            "#
        ))
        .bind(account_id)
        .bind(&coupon.code)
        .bind(i16::from(coupon.discount_percent))
        .bind(coupon.expires_on)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, "coupon code already exists", "account"))?;

        tx.commit().await?;
        Coupon::try_from(row)
    }

    /// Returns `false` when the account has no coupon with that code.
    pub async fn remove(&self, account_id: AccountId, code: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM coupons WHERE account_id = $1 AND code = $2")
            .bind(account_id)
            .bind(code)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn active(
        &self,
        account_id: AccountId,
        today: NaiveDate,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        find_active(&mut conn, account_id, today, false).await
    }
}
