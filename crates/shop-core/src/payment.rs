//! # Payment Provider Trait
//!
//! Checkout does not talk to a payment processor directly. It asks a
//! [`PaymentProvider`] for a payment intent and hands the returned client
//! secret to the storefront, which confirms the payment in the browser.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  PaymentProvider (trait)                    │
//! │  ├── create_payment_intent()                                │
//! │  ├── verify_webhook()                                       │
//! │  └── provider_name()                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                  ┌─────────┴──────────┐
//!                  │StripePaymentIntent │
//!                  │     Provider       │
//!                  └────────────────────┘
//! ```

use crate::error::PaymentResult;
use crate::price::{Currency, Price};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// What to charge and on whose behalf
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Amount to charge (must be positive)
    pub amount: Price,
    /// Buyer's email, used to create the provider-side customer
    pub customer_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Retried requests with the same key are not charged twice
    pub idempotency_key: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentRequest {
    pub fn new(
        amount: Price,
        customer_email: impl Into<String>,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            customer_email: customer_email.into(),
            description: None,
            idempotency_key: idempotency_key.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Payment intent as returned by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Provider intent id (e.g. `pi_...`)
    pub id: String,
    /// Secret the client uses to confirm the payment
    pub client_secret: String,
    /// Amount in smallest currency unit
    pub amount: i64,
    pub currency: Currency,
    /// Provider status (`requires_payment_method`, `succeeded`, ...)
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Webhook event types we care about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    /// Payment intent succeeded
    PaymentSucceeded,
    /// Payment attempt failed
    PaymentFailed,
    /// Payment intent canceled
    PaymentCanceled,
    /// Unknown event (passthrough)
    Unknown(String),
}

/// A verified, parsed webhook event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event ID from provider
    pub event_id: String,
    pub event_type: WebhookEventType,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    /// Amount (in smallest unit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    /// Metadata attached when the intent was created
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Raw event data (for debugging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// Core trait for payment provider implementations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a payment intent for `request.amount`.
    async fn create_payment_intent(&self, request: &PaymentRequest)
        -> PaymentResult<PaymentIntent>;

    /// Verify a webhook signature and parse the event.
    async fn verify_webhook(&self, payload: &[u8], signature: &str)
        -> PaymentResult<WebhookEvent>;

    /// Get the provider name (for logging and routing).
    fn provider_name(&self) -> &'static str;

    /// Webhook endpoint path for this provider.
    /// Default: `/webhook/{provider_name}`
    fn webhook_path(&self) -> String {
        format!("/webhook/{}", self.provider_name())
    }
}

/// Type alias for a shared payment provider (dynamic dispatch)
pub type BoxedPaymentProvider = Arc<dyn PaymentProvider>;
