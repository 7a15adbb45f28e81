//! # Prices
//!
//! Money is kept in the smallest currency unit (stotinki, cents) so that
//! cart totals, discounts and loyalty points are exact integer arithmetic.

use crate::error::{ShopError, ShopResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Largest catalog price, in smallest units (10,000,000.00)
pub const MAX_PRICE_AMOUNT: i64 = 1_000_000_000;

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    BGN,
    EUR,
    USD,
    GBP,
    JPY,
}

impl Currency {
    /// Returns the lowercase ISO 4217 code (the form Stripe expects)
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::BGN => "bgn",
            Currency::EUR => "eur",
            Currency::USD => "usd",
            Currency::GBP => "gbp",
            Currency::JPY => "jpy",
        }
    }

    /// Number of decimal places of the smallest unit
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Smallest units per whole unit (100 for cents, 1 for yen)
    pub fn minor_per_unit(&self) -> i64 {
        10_i64.pow(self.decimal_places() as u32)
    }

    /// Convert a decimal amount to the smallest currency unit.
    ///
    /// Returns `None` for NaN, infinities and amounts outside `i64`.
    pub fn to_smallest_unit(&self, amount: f64) -> Option<i64> {
        let scaled = (amount * self.minor_per_unit() as f64).round();
        // i64::MAX as f64 rounds up to 2^63
        if !scaled.is_finite() || scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
            return None;
        }
        Some(scaled as i64)
    }

    /// Convert from smallest unit back to decimal
    pub fn from_smallest_unit(&self, amount: i64) -> f64 {
        amount as f64 / self.minor_per_unit() as f64
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::BGN
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

impl FromStr for Currency {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bgn" => Ok(Currency::BGN),
            "eur" => Ok(Currency::EUR),
            "usd" => Ok(Currency::USD),
            "gbp" => Ok(Currency::GBP),
            "jpy" => Ok(Currency::JPY),
            other => Err(ShopError::UnsupportedCurrency {
                currency: other.to_string(),
            }),
        }
    }
}

/// Price with amount in smallest currency unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in smallest currency unit
    pub amount: i64,
    /// Currency
    pub currency: Currency,
}

impl Price {
    /// Parse a decimal amount coming from a request body.
    ///
    /// Rejects NaN, infinities, negative amounts and amounts above
    /// [`MAX_PRICE_AMOUNT`].
    pub fn from_decimal(amount: f64, currency: Currency) -> ShopResult<Self> {
        if !amount.is_finite() {
            return Err(ShopError::InvalidPrice {
                message: "price must be a finite number".to_string(),
            });
        }
        if amount < 0.0 {
            return Err(ShopError::InvalidPrice {
                message: format!("price must not be negative, got {}", amount),
            });
        }
        let amount = currency
            .to_smallest_unit(amount)
            .filter(|cents| *cents <= MAX_PRICE_AMOUNT)
            .ok_or_else(|| ShopError::InvalidPrice {
                message: format!(
                    "price must not exceed {}",
                    Price::from_cents(MAX_PRICE_AMOUNT, currency).display()
                ),
            })?;
        Ok(Self { amount, currency })
    }

    /// Create a price from smallest unit
    pub fn from_cents(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: 0,
            currency,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Get the decimal amount
    pub fn as_decimal(&self) -> f64 {
        self.currency.from_smallest_unit(self.amount)
    }

    /// Unit price times a quantity
    pub fn times(&self, quantity: u32) -> ShopResult<Self> {
        let amount = self
            .amount
            .checked_mul(i64::from(quantity))
            .ok_or(ShopError::PriceOverflow)?;
        Ok(Self {
            amount,
            currency: self.currency,
        })
    }

    /// Add two prices of the same currency
    pub fn checked_add(&self, other: &Price) -> ShopResult<Self> {
        if self.currency != other.currency {
            return Err(ShopError::CurrencyMismatch {
                expected: self.currency.to_string(),
                got: other.currency.to_string(),
            });
        }
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(ShopError::PriceOverflow)?;
        Ok(Self {
            amount,
            currency: self.currency,
        })
    }

    /// `price * (1 - percent / 100)`, rounded half up to the smallest unit.
    ///
    /// `percent` is clamped to 100.
    pub fn discounted(&self, percent: u8) -> ShopResult<Self> {
        let keep = 100 - i128::from(percent.min(100));
        let amount = (i128::from(self.amount) * keep + 50) / 100;
        Ok(Self {
            amount: i64::try_from(amount).map_err(|_| ShopError::PriceOverflow)?,
            currency: self.currency,
        })
    }

    /// Loyalty points earned for paying this price:
    /// `floor(decimal_amount * points_per_unit)`.
    pub fn loyalty_points(&self, points_per_unit: i64) -> ShopResult<i64> {
        if self.amount <= 0 {
            return Ok(0);
        }
        let points = i128::from(self.amount) * i128::from(points_per_unit)
            / i128::from(self.currency.minor_per_unit());
        i64::try_from(points).map_err(|_| ShopError::PriceOverflow)
    }

    /// Format for display (e.g., "$10.00", "12.50 лв")
    pub fn display(&self) -> String {
        match self.currency {
            Currency::BGN => format!("{:.2} лв", self.as_decimal()),
            Currency::EUR => format!("€{:.2}", self.as_decimal()),
            Currency::USD => format!("${:.2}", self.as_decimal()),
            Currency::GBP => format!("£{:.2}", self.as_decimal()),
            Currency::JPY => format!("¥{}", self.amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_conversion() {
        let bgn = Currency::BGN;
        assert_eq!(bgn.to_smallest_unit(10.99), Some(1099));
        assert_eq!(bgn.from_smallest_unit(1099), 10.99);

        let jpy = Currency::JPY;
        assert_eq!(jpy.to_smallest_unit(1000.0), Some(1000));
        assert_eq!(jpy.minor_per_unit(), 1);
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("BGN".parse::<Currency>().unwrap(), Currency::BGN);
        assert_eq!(" usd ".parse::<Currency>().unwrap(), Currency::USD);
        assert!(matches!(
            "xyz".parse::<Currency>(),
            Err(ShopError::UnsupportedCurrency { .. })
        ));
    }

    #[test]
    fn test_from_decimal_rejects_bad_amounts() {
        assert!(Price::from_decimal(-1.0, Currency::BGN).is_err());
        assert!(Price::from_decimal(f64::NAN, Currency::BGN).is_err());
        assert_eq!(
            Price::from_decimal(12.5, Currency::BGN).unwrap().amount,
            1250
        );
    }

    #[test]
    fn test_from_decimal_rejects_amounts_that_do_not_fit() {
        assert!(matches!(
            Price::from_decimal(1e30, Currency::BGN),
            Err(ShopError::InvalidPrice { .. })
        ));
        assert!(Price::from_decimal(f64::INFINITY, Currency::BGN).is_err());
        assert!(Price::from_decimal(10_000_000.01, Currency::BGN).is_err());
        assert_eq!(
            Price::from_decimal(10_000_000.0, Currency::BGN).unwrap().amount,
            MAX_PRICE_AMOUNT
        );
        assert_eq!(Currency::BGN.to_smallest_unit(1e30), None);
    }

    #[test]
    fn test_arithmetic_overflow_is_an_error() {
        let price = Price::from_cents(5_000_000_000, Currency::BGN);
        assert_eq!(price.times(2_000_000_000), Err(ShopError::PriceOverflow));
        assert_eq!(price.times(3).unwrap().amount, 15_000_000_000);

        let big = Price::from_cents(i64::MAX - 1, Currency::BGN);
        assert_eq!(
            big.checked_add(&Price::from_cents(2, Currency::BGN)),
            Err(ShopError::PriceOverflow)
        );
        assert_eq!(big.discounted(10).unwrap().amount, 8_301_034_833_169_298_225);
        assert_eq!(big.loyalty_points(1_000), Err(ShopError::PriceOverflow));
    }

    #[test]
    fn test_discount_rounding() {
        let price = Price::from_cents(2000, Currency::BGN);
        assert_eq!(price.discounted(25).unwrap().amount, 1500);
        assert_eq!(price.discounted(0).unwrap().amount, 2000);
        assert_eq!(price.discounted(100).unwrap().amount, 0);

        // 999 * 0.67 = 669.33 -> 669
        assert_eq!(Price::from_cents(999, Currency::BGN).discounted(33).unwrap().amount, 669);
        // 5 * 0.5 = 2.5 -> 3
        assert_eq!(Price::from_cents(5, Currency::BGN).discounted(50).unwrap().amount, 3);
    }

    #[test]
    fn test_loyalty_points_floor() {
        // 12.34 * 10 = 123.4 -> 123
        assert_eq!(Price::from_cents(1234, Currency::BGN).loyalty_points(10).unwrap(), 123);
        assert_eq!(Price::from_cents(9, Currency::BGN).loyalty_points(10).unwrap(), 0);
        assert_eq!(Price::from_cents(500, Currency::JPY).loyalty_points(10).unwrap(), 5000);
        assert_eq!(Price::zero(Currency::BGN).loyalty_points(10).unwrap(), 0);
    }

    #[test]
    fn test_checked_add_currency_mismatch() {
        let a = Price::from_cents(100, Currency::BGN);
        let b = Price::from_cents(100, Currency::EUR);
        assert!(a.checked_add(&b).is_err());
        assert_eq!(a.checked_add(&a).unwrap().amount, 200);
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_cents(2999, Currency::USD).display(), "$29.99");
        assert_eq!(Price::from_cents(1250, Currency::BGN).display(), "12.50 лв");
        assert_eq!(Price::from_cents(1000, Currency::JPY).display(), "¥1000");
    }
}
