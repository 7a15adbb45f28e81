//! # shop-stripe
//!
//! Stripe payment provider for the storefront backend.
//!
//! Checkout runs on the Payment Intents API:
//!
//! 1. A Stripe customer is created for the buyer's email
//! 2. A payment intent is created for the cart total with automatic
//!    payment methods enabled
//! 3. The intent's `client_secret` is returned to the storefront, which
//!    confirms the payment with Stripe.js
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_stripe::StripePaymentIntentProvider;
//! use shop_core::{PaymentProvider, PaymentRequest};
//!
//! let provider = StripePaymentIntentProvider::from_env()?;
//! let intent = provider
//!     .create_payment_intent(&PaymentRequest::new(total, "ana@example.com", key))
//!     .await?;
//!
//! // Return intent.client_secret to the client
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use shop_stripe::{dispatch_webhook_event, LoggingWebhookHandler};
//!
//! let event = provider.verify_webhook(payload, signature).await?;
//! dispatch_webhook_event(&LoggingWebhookHandler, event)?;
//! ```

pub mod config;
pub mod payment_intent;
pub mod webhook;

// Re-exports
pub use config::StripeConfig;
pub use payment_intent::{sign_payload, StripePaymentIntentProvider};
pub use webhook::{
    dispatch_webhook_event, LoggingWebhookHandler, PaymentIntentEventData, WebhookHandler,
    REQUIRED_WEBHOOK_EVENTS,
};
