//! Marketstall storefront client library.
//!
//! An authenticated REST client for the storefront backend plus thin
//! client-side mirrors of server state (session, cart, favorites). Front ends
//! (the `ms-cli` binary, tests) drive everything through [`Storefront`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod favorites;
pub mod orders;
pub mod search;
pub mod session;
pub mod state;
pub mod token;

pub use api::{ApiClient, ApiError, ClientEvent, RetryBudget};
pub use cart::{CartAction, CartError, CartMirror, CartState};
pub use config::{ConfigError, LogFormat, StorefrontConfig};
pub use error::StorefrontError;
pub use favorites::{FavoritesError, FavoritesMirror};
pub use orders::{OrderError, OrderService};
pub use search::{CatalogSearch, SearchOutcome};
pub use session::{SessionError, SessionMirror, SessionState};
pub use state::{Storefront, SyncTasks};
pub use token::{FileTokenStore, MemoryTokenStore, TokenKey, TokenStore, TokenStoreError};
