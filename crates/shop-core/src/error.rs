//! # Error Types
//!
//! Typed errors for the storefront domain and for payment providers.
//! Both carry the HTTP status the API layer should answer with.

use thiserror::Error;

/// Domain rule violations (pricing, coupons, cart contents)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShopError {
    /// Checkout or pricing was requested for an empty cart
    #[error("There are no items in your cart")]
    EmptyCart,

    /// Quantity must be a positive integer
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Price must be a finite, non-negative amount
    #[error("Invalid price: {message}")]
    InvalidPrice { message: String },

    /// Coupon expiration date is today or in the past
    #[error("Coupon {code} has expired")]
    CouponExpired { code: String },

    /// Coupon discount outside 1..=100
    #[error("Coupon discount must be between 1 and 100 percent, got {percent}")]
    DiscountOutOfRange { percent: i64 },

    /// Coupon code missing or blank
    #[error("Coupon code must not be empty")]
    EmptyCouponCode,

    /// Cart total does not fit the amount type
    #[error("Cart total is too large")]
    PriceOverflow,

    /// Unknown currency code
    #[error("Unsupported currency: {currency}")]
    UnsupportedCurrency { currency: String },

    /// Mixed currencies in one calculation
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },
}

impl ShopError {
    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::EmptyCart => 404,
            ShopError::InvalidQuantity(_) => 400,
            ShopError::InvalidPrice { .. } => 400,
            ShopError::CouponExpired { .. } => 400,
            ShopError::DiscountOutOfRange { .. } => 400,
            ShopError::EmptyCouponCode => 400,
            ShopError::PriceOverflow => 400,
            ShopError::UnsupportedCurrency { .. } => 400,
            ShopError::CurrencyMismatch { .. } => 500,
        }
    }
}

/// Result type alias for domain operations
pub type ShopResult<T> = Result<T, ShopError>;

/// Errors raised by payment providers
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParseError(String),

    /// Payment was declined
    #[error("Payment declined: {reason}")]
    PaymentDeclined { reason: String },

    /// Rate limited by provider
    #[error("Rate limited by {provider}, retry after {retry_after_secs} seconds")]
    RateLimited {
        provider: String,
        retry_after_secs: u64,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaymentError {
    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::ProviderError { .. } => 502,
            PaymentError::NetworkError(_) => 503,
            PaymentError::WebhookVerificationFailed(_) => 401,
            PaymentError::WebhookParseError(_) => 400,
            PaymentError::PaymentDeclined { .. } => 402,
            PaymentError::RateLimited { .. } => 429,
            PaymentError::Serialization(_) => 500,
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;
