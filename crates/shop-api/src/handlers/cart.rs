//! Cart endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use shop_core::{validate_quantity, CartLine, ItemId, ShopError};

use super::{ItemRequest, TokenRequest};
use crate::db::CartRepository;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(alias = "itemID")]
    pub item_id: ItemId,
    /// Defaults to 1
    #[serde(default)]
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart: Vec<CartLine>,
}

#[derive(Debug, Serialize)]
pub struct CartCountResponse {
    pub count: i64,
}

#[instrument(skip(state, request), fields(item_id = request.item_id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AddToCartRequest>,
) -> Result<StatusCode, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;
    let quantity = validate_quantity(request.quantity.unwrap_or(1))?;

    CartRepository::new(&state.pool, state.config.currency)
        .add(claims.account_id(), request.item_id, quantity)
        .await?;

    Ok(StatusCode::OK)
}

#[instrument(skip(state, request), fields(item_id = request.item_id))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ItemRequest>,
) -> Result<StatusCode, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;

    let removed = CartRepository::new(&state.pool, state.config.currency)
        .remove(claims.account_id(), request.item_id)
        .await?;
    if !removed {
        return Err(ApiError::not_found("cart item"));
    }

    Ok(StatusCode::OK)
}

/// Cart contents with quantities
pub async fn list_cart(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TokenRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;

    let cart = CartRepository::new(&state.pool, state.config.currency)
        .lines(claims.account_id())
        .await?;

    Ok(Json(CartResponse { cart }))
}

/// Number of units in the cart
pub async fn count_cart(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TokenRequest>,
) -> Result<Json<CartCountResponse>, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;

    let count = CartRepository::new(&state.pool, state.config.currency)
        .count(claims.account_id())
        .await?;

    Ok(Json(CartCountResponse { count }))
}

#[instrument(skip_all)]
pub async fn clear_cart(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TokenRequest>,
) -> Result<StatusCode, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;

    let removed = CartRepository::new(&state.pool, state.config.currency)
        .clear(claims.account_id())
        .await?;
    if removed == 0 {
        return Err(ShopError::EmptyCart.into());
    }

    info!("Cleared {} cart lines for account {}", removed, claims.account_id());
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_to_cart_rejects_zero_quantity() {
        let app = TestApp::new();

        let response = app
            .server
            .post("/api/v1/cart/item")
            .json(&json!({ "token": app.user_token(), "item_id": 1, "quantity": 0 }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Invalid quantity: 0");
    }

    #[tokio::test]
    async fn test_add_to_cart_rejects_quantity_beyond_column_range() {
        let app = TestApp::new();

        let response = app
            .server
            .post("/api/v1/cart/item")
            .json(&json!({ "token": app.user_token(), "item_id": 1, "quantity": 3_000_000_000u64 }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Invalid quantity: 3000000000");
    }

    #[tokio::test]
    async fn test_add_to_cart_requires_item_id() {
        let app = TestApp::new();

        app.server
            .post("/api/v1/cart/item")
            .json(&json!({ "token": app.user_token() }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cart_endpoints_require_token() {
        let app = TestApp::new();

        for path in ["/api/v1/cart/items", "/api/v1/cart/item/count"] {
            app.server
                .post(path)
                .json(&json!({}))
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }

        app.server
            .delete("/api/v1/cart/all")
            .json(&json!({ "token": "expired" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
