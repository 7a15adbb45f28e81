//! # Checkout
//!
//! Turns an account's cart into a payment intent in one transaction:
//!
//! ```text
//! lock account ─▶ read cart ─▶ lock active coupon ─▶ quote
//!      ─▶ payment intent (total > 0) ─▶ empty cart ─▶ use coupon
//!      ─▶ credit points ─▶ commit
//! ```
//!
//! The account row lock serializes concurrent checkouts of one account,
//! so a second request sees an empty cart. Any failure, including the
//! payment provider's, rolls back.
//!
//! A checkout keeps its pooled connection for up to two Stripe calls
//! (`STRIPE_TIMEOUT_SECS` each, 10 s by default). Size
//! `DATABASE_MAX_CONNECTIONS` above the number of concurrent checkouts
//! expected, or other requests queue behind them.

use chrono::NaiveDate;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use shop_core::{
    Account, AccountId, Cart, CheckoutQuote, Currency, PaymentError, PaymentIntent,
    PaymentProvider, PaymentRequest, ShopError,
};

use crate::db::{self, RepositoryError};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("account not found")]
    AccountNotFound,

    #[error(transparent)]
    Shop(#[from] ShopError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Repository(err.into())
    }
}

/// Result of a committed checkout
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    /// Account as it was locked (points before the credit)
    pub account: Account,
    pub quote: CheckoutQuote,
    /// `None` when nothing had to be charged
    pub payment_intent: Option<PaymentIntent>,
}

pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    payments: &'a dyn PaymentProvider,
    currency: Currency,
    points_per_unit: i64,
}

impl<'a> CheckoutService<'a> {
    pub fn new(
        pool: &'a PgPool,
        payments: &'a dyn PaymentProvider,
        currency: Currency,
        points_per_unit: i64,
    ) -> Self {
        Self {
            pool,
            payments,
            currency,
            points_per_unit,
        }
    }

    /// Price the cart without changing anything.
    pub async fn quote(
        &self,
        account_id: AccountId,
        today: NaiveDate,
    ) -> Result<CheckoutQuote, CheckoutError> {
        let mut conn = self.pool.acquire().await?;

        let lines = db::cart::lines_in(&mut conn, account_id, self.currency).await?;
        let cart = Cart::with_lines(account_id, self.currency, lines);
        if cart.is_empty() {
            return Err(ShopError::EmptyCart.into());
        }

        let coupon = db::CouponRepository::new(self.pool)
            .active(account_id, today)
            .await?;

        Ok(CheckoutQuote::for_cart(
            &cart,
            coupon.as_ref(),
            today,
            self.points_per_unit,
        )?)
    }

    /// Charge the cart.
    #[instrument(skip(self), fields(provider = self.payments.provider_name()))]
    pub async fn checkout(
        &self,
        account_id: AccountId,
        today: NaiveDate,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let account = db::accounts::lock_for_update(&mut *tx, account_id)
            .await?
            .ok_or(CheckoutError::AccountNotFound)?;

        let lines = db::cart::lines_in(&mut *tx, account_id, self.currency).await?;
        let cart = Cart::with_lines(account_id, self.currency, lines);
        if cart.is_empty() {
            return Err(ShopError::EmptyCart.into());
        }

        let coupon = db::coupons::lock_active(&mut *tx, account_id, today).await?;
        let quote = CheckoutQuote::for_cart(&cart, coupon.as_ref(), today, self.points_per_unit)?;

        let payment_intent = if quote.is_free() {
            None
        } else {
            let request = PaymentRequest::new(
                quote.total,
                &account.email,
                uuid::Uuid::new_v4().to_string(),
            )
            .with_description(format!("Order for {}", account.email))
            .with_metadata("account_id", account.id.to_string());

            Some(self.payments.create_payment_intent(&request).await?)
        };

        db::cart::clear_in(&mut *tx, account_id).await?;
        if let Some(coupon_id) = quote.coupon_id {
            db::coupons::mark_used(&mut *tx, coupon_id).await?;
        }
        db::accounts::add_points(&mut *tx, account_id, quote.points).await?;

        tx.commit().await?;

        info!(
            "Checkout committed: account={}, total={}, points={}, intent={:?}",
            account_id,
            quote.total.display(),
            quote.points,
            payment_intent.as_ref().map(|i| i.id.as_str())
        );

        Ok(CheckoutReceipt {
            account,
            quote,
            payment_intent,
        })
    }
}
