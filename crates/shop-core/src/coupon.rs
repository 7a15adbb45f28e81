//! # Coupons
//!
//! A coupon is a single-use percentage discount owned by one account.
//! It stays usable while unused and `expires_on` is still in the future;
//! the one such coupon an account holds is its active coupon.

use crate::account::AccountId;
use crate::error::{ShopError, ShopResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A stored coupon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: i64,
    pub account_id: AccountId,
    pub code: String,
    /// Percentage taken off the cart price (1..=100)
    pub discount_percent: u8,
    /// First day on which the coupon is no longer accepted
    pub expires_on: NaiveDate,
    pub used: bool,
}

impl Coupon {
    /// Unused and not yet expired
    pub fn is_active(&self, today: NaiveDate) -> bool {
        !self.used && self.expires_on > today
    }
}

/// A validated coupon that can be stored for an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCoupon {
    pub code: String,
    pub discount_percent: u8,
    pub expires_on: NaiveDate,
}

impl NewCoupon {
    /// Validate raw coupon fields.
    ///
    /// Rejects blank codes, discounts outside `1..=100` and expiration
    /// dates that are not after `today`.
    pub fn parse(
        code: &str,
        discount_percent: i64,
        expires_on: NaiveDate,
        today: NaiveDate,
    ) -> ShopResult<Self> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ShopError::EmptyCouponCode);
        }

        if !(1..=100).contains(&discount_percent) {
            return Err(ShopError::DiscountOutOfRange {
                percent: discount_percent,
            });
        }

        if expires_on <= today {
            return Err(ShopError::CouponExpired {
                code: code.to_string(),
            });
        }

        Ok(Self {
            code: code.to_string(),
            discount_percent: discount_percent as u8,
            expires_on,
        })
    }
}
