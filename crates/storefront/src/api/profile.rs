//! Profile endpoints (`/users/profile`).

use reqwest::Method;
use tracing::instrument;

use marketstall_core::UserProfile;

use super::{ApiClient, ApiError, NO_BODY};

impl ApiClient {
    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a profile.
    #[instrument(skip(self))]
    pub async fn get_profile(&self) -> Result<UserProfile, ApiError> {
        self.get("/users/profile").await
    }

    /// Replace the signed-in user's profile and return the stored version.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a profile.
    #[instrument(skip_all)]
    pub async fn update_profile(&self, profile: &UserProfile) -> Result<UserProfile, ApiError> {
        self.put("/users/profile", profile).await
    }

    /// Delete the signed-in user's account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_profile(&self) -> Result<(), ApiError> {
        self.request_discard(Method::DELETE, "/users/profile", NO_BODY)
            .await
    }
}
