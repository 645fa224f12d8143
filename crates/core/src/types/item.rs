//! Catalog items and stock availability.

use serde::{Deserialize, Serialize};

use super::{ItemId, Price};

/// A catalog item as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock_quantity: u32,
    /// Only present on listings fetched with a session.
    #[serde(default)]
    pub is_favorite: Option<bool>,
}

impl Item {
    /// Whether the listing shows any stock at all.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

/// Result of `GET /items/{id}/availability`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub available_quantity: u32,
}

impl Availability {
    /// Whether `quantity` units can be reserved right now.
    #[must_use]
    pub const fn covers(&self, quantity: u32) -> bool {
        self.in_stock && self.available_quantity >= quantity
    }
}
