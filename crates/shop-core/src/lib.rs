//! # shop-core
//!
//! Core types and rules for the storefront backend.
//!
//! This crate provides:
//! - `Price` and `Currency` with exact smallest-unit arithmetic
//! - `Item` and `ItemCatalog` for the catalog and its seed file
//! - `Account` and `AccountType` for profiles
//! - `Coupon` validation and activity rules
//! - `Cart` and `CheckoutQuote` for pricing a purchase
//! - `PaymentProvider` trait for implementing payment processors
//! - `ShopError` and `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{Cart, CartLine, CheckoutQuote, Currency, PaymentRequest};
//!
//! let mut cart = Cart::new(account.id, Currency::BGN);
//! cart.add_line(CartLine::new(item, 2));
//!
//! let quote = CheckoutQuote::for_cart(&cart, coupon.as_ref(), today, 10)?;
//! let request = PaymentRequest::new(quote.total, &account.email, idempotency_key);
//! let intent = provider.create_payment_intent(&request).await?;
//!
//! // hand intent.client_secret to the storefront
//! ```

pub mod account;
pub mod cart;
pub mod coupon;
pub mod error;
pub mod item;
pub mod payment;
pub mod price;

// Re-exports for convenience
pub use account::{Account, AccountId, AccountType, NewAccount};
pub use cart::{
    validate_quantity, Cart, CartLine, CheckoutQuote, DEFAULT_POINTS_PER_UNIT, MAX_QUANTITY,
};
pub use coupon::{Coupon, NewCoupon};
pub use error::{PaymentError, PaymentResult, ShopError, ShopResult};
pub use item::{CatalogItem, Item, ItemCatalog, ItemId, ItemPatch, NewItem};
pub use payment::{
    BoxedPaymentProvider, PaymentIntent, PaymentProvider, PaymentRequest, WebhookEvent,
    WebhookEventType,
};
pub use price::{Currency, Price, MAX_PRICE_AMOUNT};
