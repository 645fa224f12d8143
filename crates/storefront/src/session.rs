//! Client-side mirror of the authentication state.
//!
//! The mirror is re-derived on every start ([`SessionMirror::initialize`]) and
//! after every credential mutation. State changes are published on a
//! `tokio::sync::watch` channel so any number of observers can follow them.
//!
//! Only one of `initialize`, `login` and `register` may run at a time; a second
//! one started while another is in flight fails with
//! [`SessionError::AuthInProgress`] instead of racing on the token store.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use marketstall_core::{Email, LoginRequest, RegisterRequest, UserProfile};

use crate::api::{ApiClient, ApiError, ClientEvent};
use crate::token::{TokenKey, TokenStoreError};

/// Authentication status as last derived by the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Startup or an authentication call in flight.
    Loading,
    Unauthenticated,
    Authenticated(UserProfile),
}

impl SessionState {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The signed-in user's profile, if any.
    #[must_use]
    pub const fn profile(&self) -> Option<&UserProfile> {
        match self {
            Self::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }
}

/// Errors raised by [`SessionMirror`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Another sign-in is already in progress")]
    AuthInProgress,

    #[error("No token received from server")]
    NoTokenReceived,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),
}

impl SessionError {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthInProgress => "Please wait for the current sign-in to finish.".to_string(),
            Self::NoTokenReceived => "Login failed: no token received from server.".to_string(),
            Self::NotAuthenticated => "Please log in first.".to_string(),
            Self::Api(ApiError::EmailTaken) => "An account with this email already exists.".to_string(),
            Self::Api(err) if err.is_session_expired() => {
                "Your session has expired. Please log in again.".to_string()
            }
            Self::Api(err) => err
                .server_message()
                .unwrap_or_else(|| "Login failed. Please check your credentials.".to_string()),
            Self::TokenStore(_) => "Could not save your credentials.".to_string(),
        }
    }
}

/// Shared handle to the session state.
#[derive(Clone)]
pub struct SessionMirror {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: ApiClient,
    state: watch::Sender<SessionState>,
    auth_guard: Mutex<()>,
}

impl SessionMirror {
    /// Create a mirror in the [`SessionState::Loading`] state.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                api,
                state: watch::Sender::new(SessionState::Loading),
                auth_guard: Mutex::new(()),
            }),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Follow state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// The signed-in user's profile, if any.
    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        self.inner.state.borrow().profile().cloned()
    }

    /// Derive the session from stored credentials.
    ///
    /// Without an access token the mirror settles unauthenticated with no
    /// network call. Otherwise the profile is fetched; if that fails for any
    /// reason both tokens are cleared.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AuthInProgress`] if another authentication
    /// operation is running. A failed profile fetch is not an error.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<SessionState, SessionError> {
        let _guard = self
            .inner
            .auth_guard
            .try_lock()
            .map_err(|_| SessionError::AuthInProgress)?;

        if !self.inner.api.tokens().has_access_token() {
            debug!("No stored access token");
            self.publish(SessionState::Unauthenticated);
            return Ok(SessionState::Unauthenticated);
        }

        self.publish(SessionState::Loading);
        let state = match self.inner.api.get_profile().await {
            Ok(profile) => {
                info!(email = %profile.email, "Session restored");
                SessionState::Authenticated(profile)
            }
            Err(err) => {
                warn!(error = %err, "Stored credentials rejected, signing out");
                self.clear_tokens();
                SessionState::Unauthenticated
            }
        };
        self.publish(state.clone());
        Ok(state)
    }

    /// Sign in and fetch the profile.
    ///
    /// Nothing from a failed attempt is retained: the tokens are cleared and
    /// the mirror settles unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoTokenReceived`] if the backend accepted the
    /// login without issuing a token, [`SessionError::AuthInProgress`] on
    /// contention, or the underlying API error.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(&self, email: Email, password: SecretString) -> Result<UserProfile, SessionError> {
        let _guard = self
            .inner
            .auth_guard
            .try_lock()
            .map_err(|_| SessionError::AuthInProgress)?;

        self.login_locked(email, password).await
    }

    /// Create an account, then sign in with the same credentials.
    ///
    /// # Errors
    ///
    /// Returns the registration or login error; a taken email surfaces as
    /// [`ApiError::EmailTaken`].
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile, SessionError> {
        let _guard = self
            .inner
            .auth_guard
            .try_lock()
            .map_err(|_| SessionError::AuthInProgress)?;

        self.inner.api.register(&request).await?;
        info!("Account created");

        self.login_locked(request.email, SecretString::from(request.password))
            .await
    }

    /// Forget the credentials and settle unauthenticated.
    ///
    /// Synchronous and local: no network call is made.
    pub fn logout(&self) {
        self.clear_tokens();
        self.publish(SessionState::Unauthenticated);
        info!("Signed out");
    }

    /// Replace the profile and keep the version the backend returns.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotAuthenticated`] without a session, or the
    /// underlying API error.
    #[instrument(skip_all)]
    pub async fn update_profile(&self, profile: &UserProfile) -> Result<UserProfile, SessionError> {
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        let updated = self.inner.api.update_profile(profile).await?;
        self.publish(SessionState::Authenticated(updated.clone()));
        Ok(updated)
    }

    /// Delete the account, then sign out.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotAuthenticated`] without a session, or the
    /// underlying API error (the session is kept in that case).
    #[instrument(skip(self))]
    pub async fn delete_account(&self) -> Result<(), SessionError> {
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        self.inner.api.delete_profile().await?;
        self.logout();
        Ok(())
    }

    /// Settle unauthenticated whenever the client reports that the session
    /// could not be refreshed.
    pub fn watch_client_events(&self) -> JoinHandle<()> {
        let mut events = self.inner.api.subscribe();
        let mirror = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ClientEvent::LoginRequired { login_path }) => {
                        debug!(%login_path, "Login required");
                        mirror.publish(SessionState::Unauthenticated);
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn login_locked(
        &self,
        email: Email,
        password: SecretString,
    ) -> Result<UserProfile, SessionError> {
        self.publish(SessionState::Loading);
        let request = LoginRequest {
            email,
            password: password.expose_secret().to_owned(),
        };

        match self.authenticate(&request).await {
            Ok(profile) => {
                info!(email = %profile.email, "Signed in");
                self.publish(SessionState::Authenticated(profile.clone()));
                Ok(profile)
            }
            Err(err) => {
                warn!(error = %err, "Login failed");
                self.clear_tokens();
                self.publish(SessionState::Unauthenticated);
                Err(err)
            }
        }
    }

    async fn authenticate(&self, request: &LoginRequest) -> Result<UserProfile, SessionError> {
        let response = self.inner.api.login(request).await?;
        let token = response
            .token
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::NoTokenReceived)?;

        let tokens = self.inner.api.tokens();
        tokens.set(TokenKey::Access, SecretString::from(token))?;
        if let Some(refresh) = response.refresh_token.filter(|token| !token.is_empty()) {
            tokens.set(TokenKey::Refresh, SecretString::from(refresh))?;
        }

        Ok(self.inner.api.get_profile().await?)
    }

    fn clear_tokens(&self) {
        if let Err(err) = self.inner.api.tokens().clear() {
            warn!(error = %err, "Failed to clear stored credentials");
        }
    }

    fn publish(&self, state: SessionState) {
        self.inner.state.send_replace(state);
    }
}
