//! API client error types.

use reqwest::{Method, StatusCode};
use thiserror::Error;

use crate::token::TokenStoreError;

/// Errors that can occur when talking to the storefront backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{method} {path} failed ({status}): {body}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
        body: String,
    },

    /// The access token could not be refreshed; the session is over.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[source] Box<ApiError>),

    /// A refresh was needed but no refresh token is stored.
    #[error("No refresh token found")]
    MissingRefreshToken,

    /// Registration was refused because the email is taken.
    #[error("Email already exists")]
    EmailTaken,

    /// The response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The endpoint path could not be joined onto the base URL.
    #[error("Invalid endpoint {path}: {source}")]
    InvalidUrl {
        path: String,
        #[source]
        source: url::ParseError,
    },

    /// Reading or writing the credential store failed.
    #[error("Token storage error: {0}")]
    TokenStore(#[from] TokenStoreError),
}

impl ApiError {
    /// HTTP status of an error response, if this is one.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the session ended because the refresh failed.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::RefreshFailed(_))
    }

    /// The backend's `message` field, when the error body carries one.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        let Self::Status { body, .. } = self else {
            return None;
        };
        serde_json::from_str::<serde_json::Value>(body)
            .ok()?
            .get("message")?
            .as_str()
            .map(str::to_owned)
    }
}
