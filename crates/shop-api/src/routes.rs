//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - `/api/v1` - accounts, catalog, cart, wishlist, comparison, coupons,
///   checkout and email (JSON bodies, token in the body)
/// - `POST /webhook/stripe` - Stripe webhook handler
/// - `GET /health`, `GET /` - health check
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let account_routes = Router::new()
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/profile", post(handlers::profile))
        .route("/profiles", post(handlers::profiles));

    let item_routes = Router::new()
        .route(
            "/item",
            post(handlers::create_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/item/get", post(handlers::get_item))
        .route("/item/search", post(handlers::search_items))
        .route("/items", get(handlers::list_items))
        .route("/item/rand", get(handlers::random_item))
        .route("/item/count", get(handlers::count_items));

    let cart_routes = Router::new()
        .route(
            "/cart/item",
            post(handlers::add_to_cart).delete(handlers::remove_from_cart),
        )
        .route("/cart/items", post(handlers::list_cart))
        .route("/cart/item/count", post(handlers::count_cart))
        .route("/cart/pay", post(handlers::checkout))
        .route("/cart/all", delete(handlers::clear_cart))
        .route("/cart/price", post(handlers::cart_price))
        .route(
            "/coupon",
            post(handlers::apply_coupon).delete(handlers::remove_coupon),
        );

    let saved_list_routes = Router::new()
        .route("/wishlist", post(handlers::add_to_wishlist))
        .route(
            "/wishlist/item",
            post(handlers::get_wishlist_item).delete(handlers::remove_from_wishlist),
        )
        .route("/wishlist/items", post(handlers::list_wishlist))
        .route("/compare", post(handlers::compare))
        .route(
            "/compare/item",
            post(handlers::add_to_comparison).delete(handlers::remove_from_comparison),
        )
        .route("/compare/items", delete(handlers::clear_comparison));

    let api_routes = Router::new()
        .merge(account_routes)
        .merge(item_routes)
        .merge(cart_routes)
        .merge(saved_list_routes)
        .route("/email", post(handlers::send_email));

    // Webhooks verify the raw body, so no JSON extraction here
    let webhook_routes = Router::new().route("/stripe", post(handlers::stripe_webhook));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .nest("/webhook", webhook_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
