//! Catalog endpoints. Reads are public, mutations are admin-only.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use shop_core::{Item, ItemId, ItemPatch, NewItem, Price};

use super::not_blank;
use crate::db::ItemRepository;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[validate(length(max = 200), custom = "not_blank")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Decimal price in the store currency
    pub price: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub token: Option<String>,
    pub id: ItemId,
    #[validate(length(max = 200), custom = "not_blank")]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ItemIdRequest {
    #[serde(default)]
    pub token: Option<String>,
    pub id: ItemId,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1))]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub item: Item,
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub items: Vec<Item>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// Add an item to the catalog
#[instrument(skip(state, request), fields(name = %request.name))]
pub async fn create_item(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;
    claims.require_admin("create items")?;
    request.validate()?;

    let item = NewItem {
        name: request.name.trim().to_string(),
        description: request.description,
        price: Price::from_decimal(request.price, state.config.currency)?,
    };

    let item = ItemRepository::new(&state.pool, state.config.currency)
        .create(&item)
        .await?;

    info!("Created item {}: {} at {}", item.id, item.name, item.price.display());
    Ok((StatusCode::CREATED, Json(ItemResponse { item })))
}

/// Change some fields of an item
#[instrument(skip(state, request), fields(id = request.id))]
pub async fn update_item(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;
    claims.require_admin("update items")?;
    request.validate()?;

    let patch = ItemPatch {
        name: request.name.map(|n| n.trim().to_string()),
        description: request.description,
        price: request
            .price
            .map(|p| Price::from_decimal(p, state.config.currency))
            .transpose()?,
    };
    if patch.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".to_string()));
    }

    let item = ItemRepository::new(&state.pool, state.config.currency)
        .update(request.id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("item"))?;

    Ok(Json(ItemResponse { item }))
}

/// Remove an item from the catalog
#[instrument(skip(state, request), fields(id = request.id))]
pub async fn delete_item(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ItemIdRequest>,
) -> Result<StatusCode, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;
    claims.require_admin("delete items")?;

    let deleted = ItemRepository::new(&state.pool, state.config.currency)
        .delete(request.id)
        .await?;
    if !deleted {
        return Err(ApiError::not_found("item"));
    }

    info!("Deleted item {}", request.id);
    Ok(StatusCode::OK)
}

pub async fn get_item(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ItemIdRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = ItemRepository::new(&state.pool, state.config.currency)
        .get(request.id)
        .await?
        .ok_or_else(|| ApiError::not_found("item"))?;

    Ok(Json(ItemResponse { item }))
}

/// Case-insensitive search over names and descriptions
#[instrument(skip(state, request), fields(query = %request.query))]
pub async fn search_items(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SearchRequest>,
) -> Result<Json<ItemsResponse>, ApiError> {
    request.validate()?;

    let items = ItemRepository::new(&state.pool, state.config.currency)
        .search(request.query.trim())
        .await?;

    Ok(Json(ItemsResponse { items }))
}

pub async fn list_items(State(state): State<AppState>) -> Result<Json<ItemsResponse>, ApiError> {
    let items = ItemRepository::new(&state.pool, state.config.currency)
        .list()
        .await?;

    Ok(Json(ItemsResponse { items }))
}

pub async fn random_item(State(state): State<AppState>) -> Result<Json<ItemResponse>, ApiError> {
    let item = ItemRepository::new(&state.pool, state.config.currency)
        .random()
        .await?
        .ok_or_else(|| ApiError::not_found("item"))?;

    Ok(Json(ItemResponse { item }))
}

pub async fn count_items(State(state): State<AppState>) -> Result<Json<CountResponse>, ApiError> {
    let count = ItemRepository::new(&state.pool, state.config.currency)
        .count()
        .await?;

    Ok(Json(CountResponse { count }))
}
