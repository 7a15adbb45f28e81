//! # Stripe Payment Intents
//!
//! Checkout creates a Stripe customer for the buyer's email and a payment
//! intent for the cart total. The intent's client secret goes back to the
//! storefront, which confirms the payment with Stripe.js.

use crate::config::StripeConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use shop_core::{
    Currency, PaymentError, PaymentIntent, PaymentProvider, PaymentRequest, PaymentResult,
    WebhookEvent, WebhookEventType,
};
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "stripe";

/// Maximum age of a signed webhook, in seconds
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// Stripe Payment Intents provider
pub struct StripePaymentIntentProvider {
    config: StripeConfig,
    client: Client,
}

impl StripePaymentIntentProvider {
    /// Create a new provider
    pub fn new(config: StripeConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PaymentError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// POST form params to a Stripe endpoint and decode the JSON answer
    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
        idempotency_key: &str,
    ) -> PaymentResult<T> {
        let url = format!("{}{}", self.config.api_base_url, path);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .header("Idempotency-Key", idempotency_key)
            .form(params)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: path={}, status={}, body={}", path, status, body);

            if status.as_u16() == 429 {
                return Err(PaymentError::RateLimited {
                    provider: PROVIDER.to_string(),
                    retry_after_secs: 1,
                });
            }

            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                if error_response.error.error_type.as_deref() == Some("card_error") {
                    return Err(PaymentError::PaymentDeclined {
                        reason: error_response.error.message,
                    });
                }
                return Err(PaymentError::ProviderError {
                    provider: PROVIDER.to_string(),
                    message: error_response.error.message,
                });
            }

            return Err(PaymentError::ProviderError {
                provider: PROVIDER.to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })
    }

    async fn create_customer(&self, email: &str, idempotency_key: &str) -> PaymentResult<String> {
        let params = vec![("email".to_string(), email.to_string())];
        let customer: StripeCustomerResponse = self
            .post_form(
                "/v1/customers",
                &params,
                &format!("{}-customer", idempotency_key),
            )
            .await?;

        debug!("Created Stripe customer: id={}", customer.id);
        Ok(customer.id)
    }
}

/// Form params for `POST /v1/payment_intents`
fn payment_intent_params(request: &PaymentRequest, customer_id: &str) -> Vec<(String, String)> {
    let mut params = vec![
        ("amount".to_string(), request.amount.amount.to_string()),
        (
            "currency".to_string(),
            request.amount.currency.as_str().to_string(),
        ),
        ("customer".to_string(), customer_id.to_string()),
        (
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string(),
        ),
        ("receipt_email".to_string(), request.customer_email.clone()),
    ];

    if let Some(ref description) = request.description {
        params.push(("description".to_string(), description.clone()));
    }

    let mut metadata: Vec<_> = request.metadata.iter().collect();
    metadata.sort();
    for (key, value) in metadata {
        params.push((format!("metadata[{}]", key), value.clone()));
    }

    params
}

#[async_trait]
impl PaymentProvider for StripePaymentIntentProvider {
    #[instrument(skip(self, request), fields(amount = request.amount.amount))]
    async fn create_payment_intent(
        &self,
        request: &PaymentRequest,
    ) -> PaymentResult<PaymentIntent> {
        if request.amount.amount <= 0 {
            return Err(PaymentError::InvalidRequest(
                "Payment amount must be positive".to_string(),
            ));
        }

        let customer_id = self
            .create_customer(&request.customer_email, &request.idempotency_key)
            .await?;

        let params = payment_intent_params(request, &customer_id);
        let intent: StripePaymentIntentResponse = self
            .post_form("/v1/payment_intents", &params, &request.idempotency_key)
            .await?;

        info!(
            "Created Stripe payment intent: id={}, status={}",
            intent.id, intent.status
        );

        let client_secret = intent.client_secret.ok_or_else(|| {
            PaymentError::Serialization("Payment intent has no client_secret".to_string())
        })?;

        Ok(PaymentIntent {
            id: intent.id,
            client_secret,
            amount: intent.amount,
            currency: intent
                .currency
                .parse()
                .unwrap_or(request.amount.currency),
            status: intent.status,
            customer_id: intent.customer.or(Some(customer_id)),
            created_at: DateTime::from_timestamp(intent.created, 0).unwrap_or_else(Utc::now),
        })
    }

    #[instrument(skip(self, payload, signature))]
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> PaymentResult<WebhookEvent> {
        let secret = self.config.webhook_secret.as_deref().ok_or_else(|| {
            PaymentError::Configuration("STRIPE_WEBHOOK_SECRET not set".to_string())
        })?;

        verify_signature(secret, payload, signature, Utc::now().timestamp())?;

        let event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            PaymentError::WebhookParseError(format!("Failed to parse webhook: {}", e))
        })?;

        debug!("Verified Stripe webhook: type={}", event.event_type);
        Ok(event.into_webhook_event())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeCustomerResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntentResponse {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    amount: i64,
    currency: String,
    status: String,
    #[serde(default)]
    customer: Option<String>,
    created: i64,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Map<String, serde_json::Value>,
}

impl StripeWebhookEvent {
    fn into_webhook_event(self) -> WebhookEvent {
        let event_type = match self.event_type.as_str() {
            "payment_intent.succeeded" => WebhookEventType::PaymentSucceeded,
            "payment_intent.payment_failed" => WebhookEventType::PaymentFailed,
            "payment_intent.canceled" => WebhookEventType::PaymentCanceled,
            other => WebhookEventType::Unknown(other.to_string()),
        };

        let obj = &self.data.object;
        let is_intent = obj.get("object").and_then(|v| v.as_str()) == Some("payment_intent");

        let payment_intent_id = if is_intent {
            obj.get("id").and_then(|v| v.as_str()).map(String::from)
        } else {
            obj.get("payment_intent")
                .and_then(|v| v.as_str())
                .map(String::from)
        };

        let customer_email = obj
            .get("receipt_email")
            .and_then(|v| v.as_str())
            .map(String::from);

        let amount = obj.get("amount").and_then(|v| v.as_i64());

        let currency = obj
            .get("currency")
            .and_then(|v| v.as_str())
            .and_then(|c| c.parse::<Currency>().ok());

        let metadata: HashMap<String, String> = obj
            .get("metadata")
            .and_then(|m| m.as_object())
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        WebhookEvent {
            event_id: self.id,
            event_type,
            provider: PROVIDER.to_string(),
            payment_intent_id,
            customer_email,
            amount,
            currency,
            metadata,
            raw_data: Some(serde_json::Value::Object(self.data.object)),
            timestamp: DateTime::from_timestamp(self.created, 0).unwrap_or_else(Utc::now),
        }
    }
}

// =============================================================================
// Webhook Signature Verification
// =============================================================================

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> PaymentResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        PaymentError::WebhookVerificationFailed("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(PaymentError::WebhookVerificationFailed(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn signed_payload_mac(secret: &str, timestamp: i64, payload: &[u8]) -> PaymentResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Configuration(format!("Invalid webhook secret: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Check a `Stripe-Signature` header against the raw payload
fn verify_signature(secret: &str, payload: &[u8], header: &str, now: i64) -> PaymentResult<()> {
    let sig = parse_signature_header(header)?;

    if (now - sig.timestamp).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err(PaymentError::WebhookVerificationFailed(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    // verify_slice compares in constant time
    let valid = sig.signatures.iter().any(|candidate| {
        let Ok(bytes) = hex::decode(candidate) else {
            return false;
        };
        signed_payload_mac(secret, sig.timestamp, payload)
            .map(|mac| mac.verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if !valid {
        return Err(PaymentError::WebhookVerificationFailed(
            "Signature mismatch".to_string(),
        ));
    }

    Ok(())
}

/// Build a `Stripe-Signature` header value (used by tests and local tooling)
pub fn sign_payload(secret: &str, payload: &[u8], timestamp: i64) -> PaymentResult<String> {
    let mac = signed_payload_mac(secret, timestamp, payload)?;
    Ok(format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    ))
}
