//! # Stripe Webhook Handling
//!
//! Stripe reports the outcome of a payment intent asynchronously. Verified
//! events are dispatched to a [`WebhookHandler`]; the default handler only
//! logs them, since checkout has already emptied the cart and credited
//! points by the time the buyer pays.

use shop_core::{
    AccountId, Currency, PaymentError, PaymentResult, WebhookEvent, WebhookEventType,
};
use tracing::{debug, info, warn};

/// Data of a `payment_intent.*` event
#[derive(Debug, Clone)]
pub struct PaymentIntentEventData {
    pub payment_intent_id: String,
    pub amount: i64,
    pub currency: Option<Currency>,
    pub customer_email: Option<String>,
    pub metadata: std::collections::HashMap<String, String>,
}

impl PaymentIntentEventData {
    /// Parse from a webhook event
    pub fn from_event(event: &WebhookEvent) -> PaymentResult<Self> {
        let payment_intent_id = event.payment_intent_id.clone().ok_or_else(|| {
            PaymentError::WebhookParseError("Missing payment intent id".to_string())
        })?;

        Ok(Self {
            payment_intent_id,
            amount: event.amount.unwrap_or(0),
            currency: event.currency,
            customer_email: event.customer_email.clone(),
            metadata: event.metadata.clone(),
        })
    }

    /// Account that checked out, from the intent metadata
    pub fn account_id(&self) -> Option<AccountId> {
        self.metadata.get("account_id").and_then(|s| s.parse().ok())
    }
}

/// Webhook event handler trait
///
/// Implement this trait to react to payment outcomes.
#[allow(unused_variables)]
pub trait WebhookHandler: Send + Sync {
    /// Called when a payment succeeds
    fn on_payment_succeeded(&self, data: PaymentIntentEventData) -> PaymentResult<()> {
        info!(
            "Payment succeeded: intent={}, amount={}, account={:?}",
            data.payment_intent_id,
            data.amount,
            data.account_id()
        );
        Ok(())
    }

    /// Called when a payment attempt fails
    fn on_payment_failed(&self, data: PaymentIntentEventData) -> PaymentResult<()> {
        warn!(
            "Payment failed: intent={}, account={:?}",
            data.payment_intent_id,
            data.account_id()
        );
        Ok(())
    }

    /// Called when a payment intent is canceled
    fn on_payment_canceled(&self, data: PaymentIntentEventData) -> PaymentResult<()> {
        warn!(
            "Payment canceled: intent={}, account={:?}",
            data.payment_intent_id,
            data.account_id()
        );
        Ok(())
    }

    /// Called for unknown/unhandled events
    fn on_unknown_event(&self, event: &WebhookEvent) -> PaymentResult<()> {
        debug!("Unhandled webhook event: {:?}", event.event_type);
        Ok(())
    }
}

/// Default webhook handler (just logs events)
pub struct LoggingWebhookHandler;

impl WebhookHandler for LoggingWebhookHandler {}

/// Dispatch a webhook event to the appropriate handler method
pub fn dispatch_webhook_event(
    handler: &dyn WebhookHandler,
    event: WebhookEvent,
) -> PaymentResult<()> {
    match &event.event_type {
        WebhookEventType::PaymentSucceeded => {
            handler.on_payment_succeeded(PaymentIntentEventData::from_event(&event)?)
        }
        WebhookEventType::PaymentFailed => {
            handler.on_payment_failed(PaymentIntentEventData::from_event(&event)?)
        }
        WebhookEventType::PaymentCanceled => {
            handler.on_payment_canceled(PaymentIntentEventData::from_event(&event)?)
        }
        WebhookEventType::Unknown(_) => handler.on_unknown_event(&event),
    }
}

/// Events to enable on the Stripe webhook endpoint
pub const REQUIRED_WEBHOOK_EVENTS: &[&str] = &[
    "payment_intent.succeeded",
    "payment_intent.payment_failed",
    "payment_intent.canceled",
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn event(event_type: WebhookEventType, intent: Option<&str>) -> WebhookEvent {
        WebhookEvent {
            event_id: "evt_test".to_string(),
            event_type,
            provider: "stripe".to_string(),
            payment_intent_id: intent.map(String::from),
            customer_email: Some("test@example.com".to_string()),
            amount: Some(4500),
            currency: Some(Currency::BGN),
            metadata: [("account_id".to_string(), "7".to_string())].into(),
            raw_data: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_parse_payment_intent_data() {
        let data =
            PaymentIntentEventData::from_event(&event(WebhookEventType::PaymentSucceeded, Some("pi_1")))
                .unwrap();

        assert_eq!(data.payment_intent_id, "pi_1");
        assert_eq!(data.amount, 4500);
        assert_eq!(data.account_id(), Some(7));
    }

    #[test]
    fn test_missing_intent_id_is_a_parse_error() {
        let err = dispatch_webhook_event(
            &LoggingWebhookHandler,
            event(WebhookEventType::PaymentFailed, None),
        )
        .unwrap_err();
        assert!(matches!(err, PaymentError::WebhookParseError(_)));
    }

    #[test]
    fn test_dispatch_webhook() {
        struct TestHandler {
            called: AtomicBool,
        }

        impl WebhookHandler for TestHandler {
            fn on_payment_succeeded(&self, _data: PaymentIntentEventData) -> PaymentResult<()> {
                self.called.store(true, Ordering::SeqCst);
                Ok(())
            }
        }

        let handler = TestHandler {
            called: AtomicBool::new(false),
        };

        dispatch_webhook_event(&handler, event(WebhookEventType::PaymentSucceeded, Some("pi_1")))
            .unwrap();
        assert!(handler.called.load(Ordering::SeqCst));

        // unknown events never fail
        dispatch_webhook_event(
            &LoggingWebhookHandler,
            event(WebhookEventType::Unknown("charge.refunded".into()), None),
        )
        .unwrap();
    }
}
