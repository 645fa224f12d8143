//! Order commands.

use marketstall_core::{OrderId, OrderItemId};
use marketstall_storefront::{Storefront, StorefrontError};

use super::{line, print_order, print_orders, restore_session};

pub async fn list(storefront: &Storefront) -> Result<(), StorefrontError> {
    restore_session(storefront).await?;
    print_orders(&storefront.orders().list().await?);
    Ok(())
}

pub async fn show(storefront: &Storefront, order_id: OrderId) -> Result<(), StorefrontError> {
    restore_session(storefront).await?;
    print_order(&storefront.orders().get(order_id).await?);
    Ok(())
}

pub async fn history(storefront: &Storefront) -> Result<(), StorefrontError> {
    restore_session(storefront).await?;
    print_orders(&storefront.orders().history().await?);
    Ok(())
}

pub async fn pending(storefront: &Storefront) -> Result<(), StorefrontError> {
    restore_session(storefront).await?;
    match storefront.orders().pending().await? {
        Some(order) => print_order(&order),
        None => line("No pending order."),
    }
    Ok(())
}

pub async fn close(storefront: &Storefront, order_id: OrderId) -> Result<(), StorefrontError> {
    restore_session(storefront).await?;
    let order = storefront.orders().close(order_id).await?;
    line(&format!("Order {order_id} closed."));
    print_order(&order);
    Ok(())
}

pub async fn remove_item(
    storefront: &Storefront,
    order_id: OrderId,
    order_item_id: OrderItemId,
) -> Result<(), StorefrontError> {
    restore_session(storefront).await?;
    let order = storefront
        .orders()
        .remove_item(order_id, order_item_id)
        .await?;
    print_order(&order);
    Ok(())
}
