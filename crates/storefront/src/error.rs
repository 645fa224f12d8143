//! Unified error type for front ends built on the library.
//!
//! Each service keeps its own error enum; [`StorefrontError`] gathers them so a
//! front end can hold one `Result` type and still show the per-service
//! user-facing message.

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::config::ConfigError;
use crate::favorites::FavoritesError;
use crate::orders::OrderError;
use crate::session::SessionError;
use crate::token::TokenStoreError;

/// Any error the storefront library can raise.
#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Token storage error: {0}")]
    TokenStore(#[from] TokenStoreError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Favorites error: {0}")]
    Favorites(#[from] FavoritesError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// A value supplied by the user was rejected before any call was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StorefrontError {
    /// Message suitable for showing to the user.
    ///
    /// Internal details (URLs, status lines) are kept out of it.
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.is_session_expired() {
            return "Your session has expired. Please log in again.".to_string();
        }
        match self {
            Self::Config(err) => err.to_string(),
            Self::TokenStore(_) => "Could not access stored credentials.".to_string(),
            Self::Api(err) => err
                .server_message()
                .unwrap_or_else(|| "Something went wrong. Please try again later.".to_string()),
            Self::Session(err) => err.user_message(),
            Self::Cart(err) => err.user_message(),
            Self::Favorites(err) => err.user_message(),
            Self::Order(err) => err.user_message(),
            Self::InvalidInput(msg) => msg.clone(),
        }
    }

    /// Whether the error ended the session (the refresh failed).
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_session_expired)
    }

    /// Whether the error is worth reporting to error tracking.
    ///
    /// Policy rejections and user mistakes are not.
    #[must_use]
    pub fn is_reportable(&self) -> bool {
        match self {
            Self::Config(_) | Self::InvalidInput(_) => false,
            Self::TokenStore(_) => true,
            _ => self
                .api_error()
                .is_some_and(|err| err.status().is_none_or(|status| status.is_server_error())),
        }
    }

    fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err)
            | Self::Session(SessionError::Api(err))
            | Self::Favorites(FavoritesError::Api(err))
            | Self::Order(OrderError::Api(err)) => Some(err),
            Self::Cart(err) => err.api_error(),
            _ => None,
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;
