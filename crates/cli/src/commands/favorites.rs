//! Favorites commands.

use marketstall_core::{ItemId, PageRequest};
use marketstall_storefront::{Storefront, StorefrontError};

use super::{line, print_items, restore_session};

pub async fn list(storefront: &Storefront, page: u32, limit: u32) -> Result<(), StorefrontError> {
    restore_session(storefront).await?;
    let items = storefront
        .favorites()
        .load(PageRequest::new(page, limit))
        .await?;
    print_items(&items);
    Ok(())
}

pub async fn toggle(storefront: &Storefront, item_id: ItemId) -> Result<(), StorefrontError> {
    restore_session(storefront).await?;
    // Load the set first so the toggle knows the current status
    storefront.favorites().load(PageRequest::default()).await?;
    if storefront.favorites().toggle(item_id).await? {
        line(&format!("Added item {item_id} to favorites."));
    } else {
        line(&format!("Removed item {item_id} from favorites."));
    }
    Ok(())
}
