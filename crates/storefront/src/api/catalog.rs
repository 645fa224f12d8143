//! Catalog endpoints: listings, search and stock availability.

use reqwest::Method;
use tracing::instrument;

use marketstall_core::{Availability, Item, ItemId, PageRequest};

use super::{ApiClient, ApiError, NO_BODY};

fn page_query(page: PageRequest) -> [(&'static str, String); 2] {
    [("page", page.page.to_string()), ("limit", page.limit.to_string())]
}

impl ApiClient {
    /// List catalog items (`GET /items?page=&limit=`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not an item list.
    #[instrument(skip(self))]
    pub async fn get_items(&self, page: PageRequest) -> Result<Vec<Item>, ApiError> {
        let url = self.url_with_query("/items", &page_query(page))?;
        self.execute(Method::GET, url, NO_BODY).await
    }

    /// Search catalog items by name (`GET /items/search?query=&page=&limit=`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not an item list.
    #[instrument(skip(self))]
    pub async fn search_items(&self, query: &str, page: PageRequest) -> Result<Vec<Item>, ApiError> {
        let [page_pair, limit_pair] = page_query(page);
        let url = self.url_with_query(
            "/items/search",
            &[("query", query.to_owned()), page_pair, limit_pair],
        )?;
        self.execute(Method::GET, url, NO_BODY).await
    }

    /// Current stock for one item (`GET /items/{id}/availability`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body has the wrong shape.
    #[instrument(skip(self))]
    pub async fn check_availability(&self, item_id: ItemId) -> Result<Availability, ApiError> {
        self.get(&format!("/items/{item_id}/availability")).await
    }
}
