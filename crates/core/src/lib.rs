//! Marketstall Core - Shared types library.
//!
//! This crate provides the domain types used across all Marketstall components:
//! - `storefront` - API client, token storage and client-side state mirrors
//! - `cli` - Terminal front end over the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Every type
//! mirrors the backend's JSON representation (camelCase field names) so the
//! storefront client can deserialize responses directly into it.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, prices, and the catalog/cart/order/profile records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
