//! Orders and order lines.

use core::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{ItemId, OrderId, OrderItemId, Price};

/// Order lifecycle status as reported by the backend.
///
/// Only `TEMP` (still being assembled) and `CLOSED` (placed) are acted on by
/// the client; other statuses (e.g. `Delivered`) are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Temp,
    Closed,
    Other(String),
}

impl OrderStatus {
    /// Whether items may still be added, changed or removed.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Temp)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Temp => "TEMP",
            Self::Closed => "CLOSED",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "TEMP" => Self::Temp,
            "CLOSED" => Self::Closed,
            _ => Self::Other(s),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(s) => s,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    #[serde(default)]
    pub item_id: Option<ItemId>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub quantity: u32,
}

impl OrderItem {
    /// Line price (unit price times quantity).
    #[must_use]
    pub fn line_price(&self) -> Price {
        self.price * self.quantity
    }
}

/// An order as returned by `GET /orders/{id}` and the order listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub order_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub total_price: Price,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

/// Accept `2024-03-01T10:15:00`, RFC 3339 with an offset, or anything else as `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::String(s)) = raw else {
        return Ok(None);
    };
    Ok(s.parse::<NaiveDateTime>().ok().or_else(|| {
        chrono::DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.naive_utc())
    }))
}

/// Body of `POST /orders/create-from-cart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_id: OrderId,
}
