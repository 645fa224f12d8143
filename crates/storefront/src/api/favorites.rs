//! Favorites endpoints (`/favorites`).

use reqwest::Method;
use tracing::instrument;

use marketstall_core::{Item, ItemId, PageRequest};

use super::{ApiClient, ApiError, NO_BODY};

impl ApiClient {
    /// Favorited items (`GET /favorites?page=&limit=`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not an item list.
    #[instrument(skip(self))]
    pub async fn get_favorites(&self, page: PageRequest) -> Result<Vec<Item>, ApiError> {
        let url = self.url_with_query(
            "/favorites",
            &[("page", page.page.to_string()), ("limit", page.limit.to_string())],
        )?;
        self.execute(Method::GET, url, NO_BODY).await
    }

    /// Mark an item as favorite (`POST /favorites/{id}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn add_favorite(&self, item_id: ItemId) -> Result<(), ApiError> {
        self.request_discard(Method::POST, &format!("/favorites/{item_id}"), NO_BODY)
            .await
    }

    /// Unmark a favorite (`DELETE /favorites/{id}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn remove_favorite(&self, item_id: ItemId) -> Result<(), ApiError> {
        self.request_discard(Method::DELETE, &format!("/favorites/{item_id}"), NO_BODY)
            .await
    }
}
