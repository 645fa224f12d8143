//! Core types for Marketstall.
//!
//! This module provides type-safe wrappers for common domain concepts and the
//! records exchanged with the storefront backend.

pub mod auth;
pub mod cart;
pub mod email;
pub mod id;
pub mod item;
pub mod order;
pub mod page;
pub mod price;
pub mod profile;

pub use auth::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest};
pub use cart::{CartLine, CartSnapshot, MAX_QUANTITY_PER_ITEM};
pub use email::{Email, EmailError};
pub use id::*;
pub use item::{Availability, Item};
pub use order::{CreatedOrder, Order, OrderItem, OrderStatus};
pub use page::PageRequest;
pub use price::Price;
pub use profile::UserProfile;
