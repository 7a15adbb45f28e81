//! # Cart & Quotes
//!
//! A cart is the set of `(item, quantity)` lines an account has collected.
//! Pricing a cart for checkout produces a [`CheckoutQuote`]: subtotal,
//! the active coupon's discount, the amount to charge and the loyalty
//! points that purchase earns.

use crate::account::AccountId;
use crate::coupon::Coupon;
use crate::error::{ShopError, ShopResult};
use crate::item::Item;
use crate::price::{Currency, Price};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default loyalty points per whole currency unit paid
pub const DEFAULT_POINTS_PER_UNIT: i64 = 10;

/// Largest quantity a cart line can hold (the column is a 32-bit integer)
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// Validate a requested quantity (1..=MAX_QUANTITY)
pub fn validate_quantity(quantity: i64) -> ShopResult<u32> {
    match u32::try_from(quantity) {
        Ok(q) if (1..=MAX_QUANTITY).contains(&q) => Ok(q),
        _ => Err(ShopError::InvalidQuantity(quantity)),
    }
}

/// A line in a cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item: Item,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(item: Item, quantity: u32) -> Self {
        Self { item, quantity }
    }

    /// Unit price times quantity
    pub fn total(&self) -> ShopResult<Price> {
        self.item.price.times(self.quantity)
    }
}

/// An account's cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub account_id: AccountId,
    pub currency: Currency,
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(account_id: AccountId, currency: Currency) -> Self {
        Self {
            account_id,
            currency,
            lines: Vec::new(),
        }
    }

    pub fn with_lines(account_id: AccountId, currency: Currency, lines: Vec<CartLine>) -> Self {
        Self {
            account_id,
            currency,
            lines,
        }
    }

    pub fn add_line(&mut self, line: CartLine) {
        self.lines.push(line);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Cart price: sum of price x quantity over all lines
    pub fn subtotal(&self) -> ShopResult<Price> {
        self.lines
            .iter()
            .try_fold(Price::zero(self.currency), |acc, line| {
                acc.checked_add(&line.total()?)
            })
    }
}

/// Priced cart, ready to be charged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutQuote {
    pub subtotal: Price,
    /// Discount taken off by the active coupon, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<u8>,
    /// Coupon consumed by this purchase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_id: Option<i64>,
    /// Amount to charge
    pub total: Price,
    /// Loyalty points credited for `total`
    pub points: i64,
    /// Number of units purchased
    pub item_count: u64,
}

impl CheckoutQuote {
    /// Price a cart.
    ///
    /// A coupon that is used or expired on `today` is ignored and the full
    /// price applies. An empty cart cannot be priced.
    pub fn for_cart(
        cart: &Cart,
        coupon: Option<&Coupon>,
        today: NaiveDate,
        points_per_unit: i64,
    ) -> ShopResult<Self> {
        if cart.is_empty() {
            return Err(ShopError::EmptyCart);
        }

        let subtotal = cart.subtotal()?;
        let coupon = coupon.filter(|c| c.is_active(today));

        let total = match coupon {
            Some(c) => subtotal.discounted(c.discount_percent)?,
            None => subtotal,
        };

        Ok(Self {
            subtotal,
            discount_percent: coupon.map(|c| c.discount_percent),
            coupon_id: coupon.map(|c| c.id),
            total,
            points: total.loyalty_points(points_per_unit)?,
            item_count: cart.item_count(),
        })
    }

    /// Nothing left to pay (e.g. a 100% coupon)
    pub fn is_free(&self) -> bool {
        self.total.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, cents: i64) -> Item {
        Item {
            id,
            name: format!("Item {}", id),
            description: String::new(),
            price: Price::from_cents(cents, Currency::BGN),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
    }

    fn coupon(percent: u8, expires_on: NaiveDate, used: bool) -> Coupon {
        Coupon {
            id: 42,
            account_id: 1,
            code: "SAVE".into(),
            discount_percent: percent,
            expires_on,
            used,
        }
    }

    fn sample_cart() -> Cart {
        let mut cart = Cart::new(1, Currency::BGN);
        cart.add_line(CartLine::new(item(1, 1000), 2)); // 20.00
        cart.add_line(CartLine::new(item(2, 2500), 1)); // 25.00
        cart
    }

    #[test]
    fn test_validate_quantity() {
        assert_eq!(validate_quantity(1).unwrap(), 1);
        assert_eq!(validate_quantity(0), Err(ShopError::InvalidQuantity(0)));
        assert_eq!(validate_quantity(-4), Err(ShopError::InvalidQuantity(-4)));
        assert_eq!(validate_quantity(2_147_483_647).unwrap(), MAX_QUANTITY);
        assert_eq!(
            validate_quantity(3_000_000_000),
            Err(ShopError::InvalidQuantity(3_000_000_000))
        );
    }

    #[test]
    fn test_cart_subtotal_sums_every_line() {
        let cart = sample_cart();
        assert_eq!(cart.subtotal().unwrap().amount, 4500);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_oversized_cart_is_rejected() {
        let mut cart = Cart::new(1, Currency::BGN);
        cart.add_line(CartLine::new(item(1, 5_000_000_000), 2_000_000_000));

        assert_eq!(cart.subtotal(), Err(ShopError::PriceOverflow));
        assert_eq!(
            CheckoutQuote::for_cart(&cart, None, today(), 10),
            Err(ShopError::PriceOverflow)
        );
    }

    #[test]
    fn test_quote_without_coupon_charges_full_price() {
        let quote = CheckoutQuote::for_cart(&sample_cart(), None, today(), 10).unwrap();

        assert_eq!(quote.subtotal.amount, 4500);
        assert_eq!(quote.total.amount, 4500);
        assert_eq!(quote.discount_percent, None);
        assert_eq!(quote.points, 450);
    }

    #[test]
    fn test_quote_with_active_coupon() {
        let c = coupon(20, NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(), false);
        let quote = CheckoutQuote::for_cart(&sample_cart(), Some(&c), today(), 10).unwrap();

        assert_eq!(quote.total.amount, 3600);
        assert_eq!(quote.discount_percent, Some(20));
        assert_eq!(quote.coupon_id, Some(42));
        assert_eq!(quote.points, 360);
    }

    #[test]
    fn test_quote_ignores_expired_or_used_coupon() {
        let expired = coupon(50, today(), false);
        let quote = CheckoutQuote::for_cart(&sample_cart(), Some(&expired), today(), 10).unwrap();
        assert_eq!(quote.total.amount, 4500);
        assert_eq!(quote.coupon_id, None);

        let used = coupon(50, NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(), true);
        let quote = CheckoutQuote::for_cart(&sample_cart(), Some(&used), today(), 10).unwrap();
        assert_eq!(quote.total.amount, 4500);
    }

    #[test]
    fn test_full_discount_is_free() {
        let c = coupon(100, NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(), false);
        let quote = CheckoutQuote::for_cart(&sample_cart(), Some(&c), today(), 10).unwrap();

        assert!(quote.is_free());
        assert_eq!(quote.points, 0);
    }

    #[test]
    fn test_empty_cart_cannot_be_quoted() {
        let cart = Cart::new(1, Currency::BGN);
        assert_eq!(
            CheckoutQuote::for_cart(&cart, None, today(), 10),
            Err(ShopError::EmptyCart)
        );
    }
}
