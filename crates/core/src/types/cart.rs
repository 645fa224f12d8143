//! Cart snapshot types.

use serde::{Deserialize, Serialize};

use super::{Item, ItemId, Price};

/// Maximum units of a single item a cart may hold.
///
/// This is client-side policy; the cart types do not enforce it.
pub const MAX_QUANTITY_PER_ITEM: u32 = 2;

/// One line of the server-side cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item: Item,
    #[serde(default)]
    pub quantity: u32,
}

impl CartLine {
    /// Line price (unit price times quantity).
    #[must_use]
    pub fn line_price(&self) -> Price {
        self.item.price * self.quantity
    }
}

/// Client-held copy of the server's cart contents and computed total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub total: Price,
}

impl CartSnapshot {
    /// Build a snapshot from the raw `GET /cart` and `GET /cart/total` bodies.
    ///
    /// The cart body is either `{"items": [...]}` or a bare array; any other
    /// shape is an empty cart. A total that is not a number counts as zero.
    #[must_use]
    pub fn from_bodies(cart: serde_json::Value, total: &serde_json::Value) -> Self {
        let items = match cart {
            serde_json::Value::Object(mut map) => map.remove("items"),
            array @ serde_json::Value::Array(_) => Some(array),
            _ => None,
        };

        let lines = items
            .and_then(|items| serde_json::from_value::<Vec<CartLine>>(items).ok())
            .unwrap_or_default();

        let total = match total {
            serde_json::Value::Number(_) => Price::from_json(total).unwrap_or_default(),
            _ => Price::ZERO,
        };

        Self { lines, total }
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Quantity currently held for `item_id` (zero when absent).
    #[must_use]
    pub fn quantity_of(&self, item_id: ItemId) -> u32 {
        self.lines
            .iter()
            .find(|line| line.item.id == item_id)
            .map_or(0, |line| line.quantity)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
