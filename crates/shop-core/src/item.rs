//! # Catalog Items
//!
//! Items are admin-managed. A seed catalog can be shipped as
//! `config/items.toml` and is inserted when the store starts empty.

use crate::error::ShopResult;
use crate::price::{Currency, Price};
use serde::{Deserialize, Serialize};

pub type ItemId = i64;

/// An item in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub price: Price,
}

/// Fields of an item that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub price: Price,
}

/// Partial update of an item; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
}

impl ItemPatch {
    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.price.is_none()
    }
}

/// One entry of the seed catalog file; prices are decimal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
}

impl CatalogItem {
    pub fn to_new_item(&self, currency: Currency) -> ShopResult<NewItem> {
        Ok(NewItem {
            name: self.name.clone(),
            description: self.description.clone(),
            price: Price::from_decimal(self.price, currency)?,
        })
    }
}

/// Seed catalog (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemCatalog {
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Convert every entry, failing on the first invalid price
    pub fn to_new_items(&self, currency: Currency) -> ShopResult<Vec<NewItem>> {
        self.items
            .iter()
            .map(|item| item.to_new_item(currency))
            .collect()
    }
}
