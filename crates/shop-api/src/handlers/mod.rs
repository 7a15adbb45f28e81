//! # Request Handlers
//!
//! Axum request handlers, one module per resource. Authenticated
//! endpoints read the session token from the `token` field of the JSON
//! body. Mutations answer `200` with an empty body.

mod accounts;
mod cart;
mod checkout;
mod coupons;
mod email;
mod health;
mod items;
mod saved_lists;
mod webhook;

pub use accounts::*;
pub use cart::*;
pub use checkout::*;
pub use coupons::*;
pub use email::*;
pub use health::*;
pub use items::*;
pub use saved_lists::*;
pub use webhook::*;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use validator::ValidationError;

use shop_core::ItemId;

/// Body of endpoints that only need the caller's identity
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// Body of endpoints that act on one item for the caller
#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(alias = "itemID")]
    pub item_id: ItemId,
}

/// Current UTC calendar date, used for coupon expiry
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Reject strings that are empty once surrounding whitespace is removed
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
