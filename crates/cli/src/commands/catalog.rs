//! Catalog browsing.

use marketstall_core::{ItemId, PageRequest};
use marketstall_storefront::{SearchOutcome, Storefront, StorefrontError};

use super::{line, print_items, restore_session};

pub async fn items(storefront: &Storefront, page: u32, limit: u32) -> Result<(), StorefrontError> {
    // Listings carry favorite flags only for signed-in users
    restore_session(storefront).await?;
    let items = storefront
        .api()
        .get_items(PageRequest::new(page, limit))
        .await?;
    print_items(&items);
    Ok(())
}

pub async fn search(storefront: &Storefront, query: &str) -> Result<(), StorefrontError> {
    restore_session(storefront).await?;
    match storefront.search().search(query).await? {
        SearchOutcome::Results(items) => print_items(&items),
        SearchOutcome::Superseded => line("Search cancelled."),
    }
    Ok(())
}

pub async fn availability(storefront: &Storefront, item_id: ItemId) -> Result<(), StorefrontError> {
    let availability = storefront.api().check_availability(item_id).await?;
    if availability.in_stock {
        line(&format!(
            "Item {item_id}: {} available.",
            availability.available_quantity
        ));
    } else {
        line(&format!("Item {item_id}: out of stock."));
    }
    Ok(())
}
