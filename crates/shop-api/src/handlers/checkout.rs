//! Cart pricing and checkout.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::{instrument, warn};

use shop_core::CheckoutQuote;

use super::{today, TokenRequest};
use crate::checkout::{CheckoutReceipt, CheckoutService};
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::mail::EmailMessage;
use crate::state::AppState;

/// Checkout response
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Payment intent client secret; `null` when nothing was charged
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publishable_key: Option<String>,
    pub subtotal: f64,
    pub discount_percent: Option<u8>,
    pub total: f64,
    pub points_earned: i64,
}

impl CheckoutResponse {
    fn from_receipt(receipt: &CheckoutReceipt, publishable_key: Option<String>) -> Self {
        let intent = receipt.payment_intent.as_ref();
        Self {
            secret: intent.map(|i| i.client_secret.clone()),
            payment_intent_id: intent.map(|i| i.id.clone()),
            publishable_key,
            subtotal: receipt.quote.subtotal.as_decimal(),
            discount_percent: receipt.quote.discount_percent,
            total: receipt.quote.total.as_decimal(),
            points_earned: receipt.quote.points,
        }
    }
}

/// Cart price response
#[derive(Debug, Serialize)]
pub struct CartPriceResponse {
    pub subtotal: f64,
    pub discount_percent: Option<u8>,
    /// Amount checkout would charge
    pub price: f64,
}

impl From<&CheckoutQuote> for CartPriceResponse {
    fn from(quote: &CheckoutQuote) -> Self {
        Self {
            subtotal: quote.subtotal.as_decimal(),
            discount_percent: quote.discount_percent,
            price: quote.total.as_decimal(),
        }
    }
}

fn service(state: &AppState) -> CheckoutService<'_> {
    CheckoutService::new(
        &state.pool,
        state.payments.as_ref(),
        state.config.currency,
        state.config.points_per_unit,
    )
}

/// Charge the caller's cart
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TokenRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;

    let receipt = service(&state).checkout(claims.account_id(), today()).await?;

    if let Some(mailer) = state.mailer.clone() {
        let message = EmailMessage::receipt(&receipt.account, &receipt.quote);
        tokio::spawn(async move {
            if let Err(e) = mailer.send(message).await {
                warn!("Failed to send order receipt: {}", e);
            }
        });
    }

    Ok(Json(CheckoutResponse::from_receipt(
        &receipt,
        state.config.publishable_key.clone(),
    )))
}

/// Price the caller's cart without buying it
pub async fn cart_price(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TokenRequest>,
) -> Result<Json<CartPriceResponse>, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;

    let quote = service(&state).quote(claims.account_id(), today()).await?;
    Ok(Json(CartPriceResponse::from(&quote)))
}
