//! Wishlist and comparison endpoints.

use axum::{extract::State, http::StatusCode, Json};
use tracing::instrument;

use super::items::{ItemResponse, ItemsResponse};
use super::{ItemRequest, TokenRequest};
use crate::db::{SavedList, SavedListRepository};
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

fn repository(state: &AppState, list: SavedList) -> SavedListRepository<'_> {
    SavedListRepository::new(&state.pool, list, state.config.currency)
}

async fn add(state: &AppState, list: SavedList, request: ItemRequest) -> Result<StatusCode, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;
    repository(state, list)
        .add(claims.account_id(), request.item_id)
        .await?;
    Ok(StatusCode::OK)
}

async fn remove(
    state: &AppState,
    list: SavedList,
    request: ItemRequest,
) -> Result<StatusCode, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;
    let removed = repository(state, list)
        .remove(claims.account_id(), request.item_id)
        .await?;
    if !removed {
        return Err(ApiError::not_found(format!("item in {}", list.label())));
    }
    Ok(StatusCode::OK)
}

async fn items(
    state: &AppState,
    list: SavedList,
    request: TokenRequest,
) -> Result<Json<ItemsResponse>, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;
    let items = repository(state, list).items(claims.account_id()).await?;
    Ok(Json(ItemsResponse { items }))
}

#[instrument(skip(state, request), fields(item_id = request.item_id))]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ItemRequest>,
) -> Result<StatusCode, ApiError> {
    add(&state, SavedList::Wishlist, request).await
}

pub async fn get_wishlist_item(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ItemRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;

    let item = repository(&state, SavedList::Wishlist)
        .get(claims.account_id(), request.item_id)
        .await?
        .ok_or_else(|| ApiError::not_found("item in wishlist"))?;

    Ok(Json(ItemResponse { item }))
}

pub async fn list_wishlist(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TokenRequest>,
) -> Result<Json<ItemsResponse>, ApiError> {
    items(&state, SavedList::Wishlist, request).await
}

#[instrument(skip(state, request), fields(item_id = request.item_id))]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ItemRequest>,
) -> Result<StatusCode, ApiError> {
    remove(&state, SavedList::Wishlist, request).await
}

#[instrument(skip(state, request), fields(item_id = request.item_id))]
pub async fn add_to_comparison(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ItemRequest>,
) -> Result<StatusCode, ApiError> {
    add(&state, SavedList::Comparison, request).await
}

/// Items the caller is comparing
pub async fn compare(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TokenRequest>,
) -> Result<Json<ItemsResponse>, ApiError> {
    items(&state, SavedList::Comparison, request).await
}

#[instrument(skip(state, request), fields(item_id = request.item_id))]
pub async fn remove_from_comparison(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ItemRequest>,
) -> Result<StatusCode, ApiError> {
    remove(&state, SavedList::Comparison, request).await
}

#[instrument(skip_all)]
pub async fn clear_comparison(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TokenRequest>,
) -> Result<StatusCode, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;
    repository(&state, SavedList::Comparison)
        .clear(claims.account_id())
        .await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_saved_lists_require_token() {
        let app = TestApp::new();

        for path in ["/api/v1/wishlist", "/api/v1/wishlist/item", "/api/v1/compare/item"] {
            app.server
                .post(path)
                .json(&json!({ "item_id": 1 }))
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }

        for path in ["/api/v1/wishlist/items", "/api/v1/compare"] {
            app.server
                .post(path)
                .json(&json!({ "token": "" }))
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }

        app.server
            .delete("/api/v1/compare/items")
            .json(&json!({}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_item_id_accepts_legacy_name() {
        let app = TestApp::new();

        // decodes, then fails on the token rather than on the body
        app.server
            .delete("/api/v1/wishlist/item")
            .json(&json!({ "itemID": 4, "token": "bad" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
