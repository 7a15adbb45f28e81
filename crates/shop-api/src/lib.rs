//! # shop-api
//!
//! HTTP API layer for storefront-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - PostgreSQL repositories and the checkout transaction
//! - Session tokens, password hashing and SMTP email
//! - Webhook handler for payment events
//!
//! ## Endpoints
//!
//! All API routes live under `/api/v1` and take JSON bodies. Authenticated
//! routes expect the session token in the `token` field.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/signup`, `/login` | Register, obtain a token |
//! | POST | `/profile`, `/profiles` | Own profile, all profiles (admin) |
//! | POST/PUT/DELETE | `/item` | Create, update, delete an item (admin) |
//! | POST | `/item/get`, `/item/search` | Item by id, search |
//! | GET | `/items`, `/item/rand`, `/item/count` | List, random item, count |
//! | POST/DELETE | `/cart/item` | Add to / remove from the cart |
//! | POST | `/cart/items`, `/cart/item/count` | Cart contents, unit count |
//! | POST | `/cart/price`, `/cart/pay` | Price the cart, checkout |
//! | DELETE | `/cart/all` | Empty the cart |
//! | POST/DELETE | `/coupon` | Apply, remove a coupon |
//! | POST | `/wishlist`, `/wishlist/item`, `/wishlist/items` | Add, get one, list |
//! | DELETE | `/wishlist/item` | Remove from the wishlist |
//! | POST | `/compare/item`, `/compare` | Add to comparison, list it |
//! | DELETE | `/compare/item`, `/compare/items` | Remove one, remove all |
//! | POST | `/email` | Email the caller |
//! | POST | `/webhook/stripe` | Stripe webhook (outside `/api/v1`) |

pub mod auth;
pub mod checkout;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod mail;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
pub use state::{AppConfig, AppState};
