//! Authentication endpoints and credential refresh.

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};

use marketstall_core::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest};

use super::{ApiClient, ApiError};
use crate::token::TokenKey;

impl ApiClient {
    /// Exchange credentials for a token pair (`POST /auth/login`).
    ///
    /// The tokens are returned as received; persisting them is the caller's
    /// decision.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects the login.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post("/auth/login", Some(request)).await
    }

    /// Create an account (`POST /auth/register`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::EmailTaken`] on `409 Conflict`, otherwise the
    /// underlying request error.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        match self
            .request_discard(Method::POST, "/auth/register", Some(request))
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if err.status() == Some(StatusCode::CONFLICT) => Err(ApiError::EmailTaken),
            Err(err) => Err(err),
        }
    }

    /// Obtain a new access token with the stored refresh token.
    ///
    /// The refresh call carries no bearer header and is never itself retried.
    /// On success the new access token replaces the stored one. On any
    /// failure, including a failure to store the new token, both tokens are
    /// removed from the store.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::RefreshFailed`] wrapping the cause.
    #[instrument(skip(self))]
    pub async fn refresh_credential(&self) -> Result<(), ApiError> {
        let refreshed = match self.exchange_refresh_token().await {
            Ok(token) => self
                .inner
                .tokens
                .set(TokenKey::Access, token)
                .map_err(ApiError::from),
            Err(err) => Err(err),
        };

        match refreshed {
            Ok(()) => {
                debug!("Access token refreshed");
                Ok(())
            }
            Err(err) => {
                if let Err(clear_err) = self.inner.tokens.clear() {
                    warn!(error = %clear_err, "Failed to clear credentials after refresh failure");
                }
                Err(ApiError::RefreshFailed(Box::new(err)))
            }
        }
    }

    async fn exchange_refresh_token(&self) -> Result<SecretString, ApiError> {
        let refresh_token = self
            .inner
            .tokens
            .get(TokenKey::Refresh)
            .ok_or(ApiError::MissingRefreshToken)?;

        let url = self.url("/refresh-token")?;
        let body = RefreshRequest {
            refresh_token: refresh_token.expose_secret().to_owned(),
        };

        let response = self.inner.http.post(url.clone()).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                method: reqwest::Method::POST,
                path: url.path().to_string(),
                status,
                body,
            });
        }

        let refreshed: RefreshResponse = serde_json::from_slice(&response.bytes().await?)?;
        Ok(SecretString::from(refreshed.token))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use marketstall_core::Email;
    use url::Url;
    use wiremock::matchers::{body_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::token::{MemoryTokenStore, TokenStore};

    fn client_for(server: &MockServer, store: MemoryTokenStore) -> (ApiClient, Arc<dyn TokenStore>) {
        let base = Url::parse(&format!("{}/api", server.uri())).unwrap();
        let tokens: Arc<dyn TokenStore> = Arc::new(store);
        let client = ApiClient::new(&StorefrontConfig::new(base), Arc::clone(&tokens)).unwrap();
        (client, tokens)
    }

    #[tokio::test]
    async fn test_refresh_stores_new_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/refresh-token"))
            .and(body_json(serde_json::json!({ "refreshToken": "r-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "a-2" })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, tokens) = client_for(&server, MemoryTokenStore::with_tokens(Some("a-1"), Some("r-1")));
        client.refresh_credential().await.unwrap();

        assert_eq!(tokens.get(TokenKey::Access).unwrap().expose_secret(), "a-2");
        assert_eq!(tokens.get(TokenKey::Refresh).unwrap().expose_secret(), "r-1");
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_clears_store() {
        let server = MockServer::start().await;
        let (client, tokens) = client_for(&server, MemoryTokenStore::with_tokens(Some("a-1"), None));

        let err = client.refresh_credential().await.unwrap_err();

        assert!(matches!(err, ApiError::RefreshFailed(ref cause) if matches!(**cause, ApiError::MissingRefreshToken)));
        assert!(tokens.get(TokenKey::Access).is_none());
    }

    #[tokio::test]
    async fn test_refresh_rejected_clears_store() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/refresh-token"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let (client, tokens) = client_for(&server, MemoryTokenStore::with_tokens(Some("a-1"), Some("r-1")));
        let err = client.refresh_credential().await.unwrap_err();

        assert!(err.is_session_expired());
        assert!(tokens.get(TokenKey::Access).is_none());
        assert!(tokens.get(TokenKey::Refresh).is_none());
    }

    /// Accepts reads and clears but refuses every write.
    struct ReadOnlyStore(MemoryTokenStore);

    impl TokenStore for ReadOnlyStore {
        fn get(&self, key: TokenKey) -> Option<SecretString> {
            self.0.get(key)
        }

        fn set(&self, _key: TokenKey, _value: SecretString) -> Result<(), crate::token::TokenStoreError> {
            Err(crate::token::TokenStoreError::Io {
                path: "credentials.json".into(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }

        fn remove(&self, key: TokenKey) -> Result<(), crate::token::TokenStoreError> {
            self.0.remove(key)
        }

        fn clear(&self) -> Result<(), crate::token::TokenStoreError> {
            self.0.clear()
        }
    }

    #[tokio::test]
    async fn test_unstorable_refreshed_token_ends_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/refresh-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "a-2" })))
            .expect(1)
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/api", server.uri())).unwrap();
        let tokens: Arc<dyn TokenStore> = Arc::new(ReadOnlyStore(MemoryTokenStore::with_tokens(
            Some("a-1"),
            Some("r-1"),
        )));
        let client = ApiClient::new(&StorefrontConfig::new(base), Arc::clone(&tokens)).unwrap();

        let err = client.refresh_credential().await.unwrap_err();

        assert!(matches!(err, ApiError::RefreshFailed(ref cause) if matches!(**cause, ApiError::TokenStore(_))));
        assert!(tokens.get(TokenKey::Access).is_none());
        assert!(tokens.get(TokenKey::Refresh).is_none());
    }

    #[tokio::test]
    async fn test_refresh_sends_no_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/refresh-token"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/refresh-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "a-2" })))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server, MemoryTokenStore::with_tokens(Some("a-1"), Some("r-1")));
        client.refresh_credential().await.unwrap();
    }

    #[tokio::test]
    async fn test_register_conflict_is_email_taken() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .respond_with(ResponseTemplate::new(409).set_body_string("exists"))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server, MemoryTokenStore::new());
        let request = RegisterRequest {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: Email::parse("ada@example.com").unwrap(),
            password: "pw".to_owned(),
            phone: None,
            country: None,
            city: None,
        };

        assert!(matches!(client.register(&request).await, Err(ApiError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_register_accepts_text_acknowledgement() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .respond_with(ResponseTemplate::new(201).set_body_string("User registered successfully"))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server, MemoryTokenStore::new());
        let request = RegisterRequest {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: Email::parse("ada@example.com").unwrap(),
            password: "pw".to_owned(),
            phone: None,
            country: None,
            city: None,
        };

        client.register(&request).await.unwrap();
    }

    #[tokio::test]
    async fn test_login_returns_tokens_without_storing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "a-1",
                "refreshToken": "r-1"
            })))
            .mount(&server)
            .await;

        let (client, tokens) = client_for(&server, MemoryTokenStore::new());
        let response = client
            .login(&LoginRequest {
                email: Email::parse("ada@example.com").unwrap(),
                password: "pw".to_owned(),
            })
            .await
            .unwrap();

        assert_eq!(response.token.as_deref(), Some("a-1"));
        assert!(!tokens.has_access_token());
    }
}
