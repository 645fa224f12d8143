//! Cart commands.
//!
//! Each command restores the session, loads the cart so local policy checks
//! see the current quantities, then runs the mirror operation.

use marketstall_core::ItemId;
use marketstall_storefront::{Storefront, StorefrontError};

use super::{line, print_cart, restore_session};

async fn load(storefront: &Storefront) -> Result<(), StorefrontError> {
    restore_session(storefront).await?;
    storefront.cart().refresh().await?;
    Ok(())
}

pub async fn show(storefront: &Storefront) -> Result<(), StorefrontError> {
    load(storefront).await?;
    print_cart(&storefront.cart().snapshot());
    Ok(())
}

pub async fn add(storefront: &Storefront, item_id: ItemId, quantity: u32) -> Result<(), StorefrontError> {
    load(storefront).await?;
    let snapshot = storefront.cart().add(item_id, quantity).await?;
    print_cart(&snapshot);
    Ok(())
}

pub async fn set(storefront: &Storefront, item_id: ItemId, quantity: u32) -> Result<(), StorefrontError> {
    load(storefront).await?;
    let snapshot = storefront.cart().set_quantity(item_id, quantity).await?;
    print_cart(&snapshot);
    Ok(())
}

pub async fn remove(storefront: &Storefront, item_id: ItemId) -> Result<(), StorefrontError> {
    load(storefront).await?;
    let snapshot = storefront.cart().remove(item_id).await?;
    print_cart(&snapshot);
    Ok(())
}

pub async fn clear(storefront: &Storefront) -> Result<(), StorefrontError> {
    load(storefront).await?;
    storefront.cart().clear().await?;
    line("Cart cleared.");
    Ok(())
}

pub async fn checkout(storefront: &Storefront) -> Result<(), StorefrontError> {
    load(storefront).await?;
    let order_id = storefront.cart().checkout().await?;
    line(&format!("Order {order_id} created. Run `ms-cli orders show {order_id}` to review it."));
    Ok(())
}
