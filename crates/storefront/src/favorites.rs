//! Client-side set of favorited items.
//!
//! The local set changes only after the backend accepted the change.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use marketstall_core::{Item, ItemId, PageRequest};

use crate::api::{ApiClient, ApiError};
use crate::session::SessionMirror;

/// Errors raised by [`FavoritesMirror`] operations.
#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl FavoritesError {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Please log in to manage your favorites.".to_string(),
            Self::Api(_) => "Failed to update favorites. Please try again.".to_string(),
        }
    }
}

/// Shared handle to the favorites set.
#[derive(Clone)]
pub struct FavoritesMirror {
    inner: Arc<FavoritesInner>,
}

struct FavoritesInner {
    api: ApiClient,
    session: SessionMirror,
    ids: watch::Sender<BTreeSet<ItemId>>,
}

impl FavoritesMirror {
    #[must_use]
    pub fn new(api: ApiClient, session: SessionMirror) -> Self {
        Self {
            inner: Arc::new(FavoritesInner {
                api,
                session,
                ids: watch::Sender::new(BTreeSet::new()),
            }),
        }
    }

    /// Fetch a page of favorites.
    ///
    /// The first page replaces the local set; later pages extend it.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::NotAuthenticated`] without a session, or the
    /// underlying API error.
    #[instrument(skip(self))]
    pub async fn load(&self, page: PageRequest) -> Result<Vec<Item>, FavoritesError> {
        self.require_session()?;
        let items = self.inner.api.get_favorites(page).await?;

        self.inner.ids.send_modify(|ids| {
            if page.page <= 1 {
                ids.clear();
            }
            ids.extend(items.iter().map(|item| item.id));
        });
        Ok(items)
    }

    /// Flip an item's favorite status. Returns whether it is now a favorite.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::NotAuthenticated`] without a session, or the
    /// underlying API error (the local set is left unchanged).
    #[instrument(skip(self))]
    pub async fn toggle(&self, item_id: ItemId) -> Result<bool, FavoritesError> {
        self.require_session()?;

        if self.is_favorite(item_id) {
            self.inner.api.remove_favorite(item_id).await?;
            self.inner.ids.send_modify(|ids| {
                ids.remove(&item_id);
            });
            info!(%item_id, "Removed from favorites");
            Ok(false)
        } else {
            self.inner.api.add_favorite(item_id).await?;
            self.inner.ids.send_modify(|ids| {
                ids.insert(item_id);
            });
            info!(%item_id, "Added to favorites");
            Ok(true)
        }
    }

    #[must_use]
    pub fn is_favorite(&self, item_id: ItemId) -> bool {
        self.inner.ids.borrow().contains(&item_id)
    }

    /// Every favorited item ID known locally.
    #[must_use]
    pub fn ids(&self) -> BTreeSet<ItemId> {
        self.inner.ids.borrow().clone()
    }

    /// Follow changes to the set.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BTreeSet<ItemId>> {
        self.inner.ids.subscribe()
    }

    /// Seed the set from listing flags (`isFavorite`) without a network call.
    pub fn absorb(&self, items: &[Item]) {
        self.inner.ids.send_modify(|ids| {
            for item in items {
                match item.is_favorite {
                    Some(true) => {
                        ids.insert(item.id);
                    }
                    Some(false) => {
                        ids.remove(&item.id);
                    }
                    None => {}
                }
            }
        });
    }

    /// Forget the set whenever the session ends.
    pub fn spawn_session_sync(&self) -> JoinHandle<()> {
        let mut session = self.inner.session.subscribe();
        let favorites = self.clone();
        tokio::spawn(async move {
            while session.changed().await.is_ok() {
                let signed_out = {
                    let state = session.borrow_and_update();
                    !state.is_authenticated() && !state.is_loading()
                };
                if signed_out {
                    debug!("Session ended, forgetting favorites");
                    favorites.reset();
                }
            }
        })
    }

    fn reset(&self) {
        self.inner.ids.send_if_modified(|ids| {
            let changed = !ids.is_empty();
            ids.clear();
            changed
        });
    }

    fn require_session(&self) -> Result<(), FavoritesError> {
        if self.inner.session.is_authenticated() {
            Ok(())
        } else {
            Err(FavoritesError::NotAuthenticated)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use url::Url;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers::method};

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::token::MemoryTokenStore;

    fn item(id: i64, favorite: Option<bool>) -> Item {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Item {id}"),
            "isFavorite": favorite
        }))
        .unwrap()
    }

    fn mirror(server: &MockServer) -> FavoritesMirror {
        let base = Url::parse(&format!("{}/api", server.uri())).unwrap();
        let api = ApiClient::new(&StorefrontConfig::new(base), Arc::new(MemoryTokenStore::new())).unwrap();
        let session = SessionMirror::new(api.clone());
        FavoritesMirror::new(api, session)
    }

    #[tokio::test]
    async fn test_toggle_requires_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let favorites = mirror(&server);
        assert!(matches!(
            favorites.toggle(ItemId::new(1)).await,
            Err(FavoritesError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_absorb_listing_flags() {
        let server = MockServer::start().await;
        let favorites = mirror(&server);

        favorites.absorb(&[item(1, Some(true)), item(2, Some(false)), item(3, None)]);
        assert!(favorites.is_favorite(ItemId::new(1)));
        assert!(!favorites.is_favorite(ItemId::new(2)));

        favorites.absorb(&[item(1, Some(false))]);
        assert!(favorites.ids().is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_forgets_favorites() {
        let server = MockServer::start().await;
        let favorites = mirror(&server);
        let sync = favorites.spawn_session_sync();
        favorites.absorb(&[item(5, Some(true))]);

        let mut ids = favorites.subscribe();
        favorites.inner.session.logout();

        tokio::time::timeout(std::time::Duration::from_secs(2), ids.wait_for(BTreeSet::is_empty))
            .await
            .unwrap()
            .unwrap();
        assert!(!favorites.is_favorite(ItemId::new(5)));
        sync.abort();
    }
}
