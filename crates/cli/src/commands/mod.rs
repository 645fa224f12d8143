//! CLI command implementations.
//!
//! Commands print results to stdout; notices and errors go to stderr.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod favorites;
pub mod orders;
pub mod profile;

use std::io::BufRead;
use std::process::ExitCode;

use marketstall_core::{CartSnapshot, Item, Order, UserProfile};
use marketstall_storefront::{SessionState, Storefront, StorefrontError};
use secrecy::SecretString;

// =============================================================================
// Session
// =============================================================================

/// Restore the stored session before a command that needs it.
pub async fn restore_session(storefront: &Storefront) -> Result<SessionState, StorefrontError> {
    Ok(storefront.session().initialize().await?)
}

/// Use `given`, or read the password from the first line of stdin.
pub fn read_password(given: Option<String>) -> Result<SecretString, StorefrontError> {
    if let Some(password) = given {
        return Ok(SecretString::from(password));
    }

    notice("Password:");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| StorefrontError::InvalidInput(format!("could not read password: {e}")))?;

    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(StorefrontError::InvalidInput("password must not be empty".to_string()));
    }
    Ok(SecretString::from(password))
}

// =============================================================================
// Output
// =============================================================================

#[allow(clippy::print_stdout)]
pub fn line(text: &str) {
    println!("{text}");
}

#[allow(clippy::print_stderr)]
pub fn notice(text: &str) {
    eprintln!("{text}");
}

/// Print the user-facing message for `err` and pick the exit status.
#[allow(clippy::print_stderr)]
pub fn fail(err: &StorefrontError) -> ExitCode {
    eprintln!("Error: {}", err.user_message());
    ExitCode::FAILURE
}

pub fn print_items(items: &[Item]) {
    if items.is_empty() {
        line("No items found.");
        return;
    }
    for item in items {
        let favorite = if item.is_favorite == Some(true) { " *" } else { "" };
        let stock = if item.in_stock() {
            format!("{} in stock", item.stock_quantity)
        } else {
            "out of stock".to_string()
        };
        line(&format!(
            "{:>6}  {:<40} {:>10}  {stock}{favorite}",
            item.id,
            item.name,
            item.price.to_string()
        ));
    }
}

pub fn print_cart(snapshot: &CartSnapshot) {
    if snapshot.is_empty() {
        line("Your cart is empty.");
        return;
    }
    for cart_line in &snapshot.lines {
        line(&format!(
            "{:>6}  {:<40} x{}  {:>10}",
            cart_line.item.id,
            cart_line.item.name,
            cart_line.quantity,
            cart_line.line_price().to_string()
        ));
    }
    line(&format!(
        "{} item(s), total {}",
        snapshot.item_count(),
        snapshot.total
    ));
}

pub fn print_order(order: &Order) {
    let date = order
        .order_date
        .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string());
    line(&format!(
        "Order {}  [{}]  {}  total {}",
        order.id, order.status, date, order.total_price
    ));
    if let Some(address) = &order.shipping_address {
        line(&format!("  Ship to: {address}"));
    }
    for item in &order.order_items {
        let name = item.item_name.as_deref().unwrap_or("(unnamed item)");
        line(&format!(
            "  {:>6}  {:<38} x{}  {:>10}",
            item.id,
            name,
            item.quantity,
            item.line_price().to_string()
        ));
    }
}

pub fn print_orders(orders: &[Order]) {
    if orders.is_empty() {
        line("No orders found.");
        return;
    }
    for order in orders {
        print_order(order);
    }
}

pub fn print_profile(profile: &UserProfile) {
    line(&profile.display_name());
    line(&format!("  Email:   {}", profile.email));
    if let Some(phone) = &profile.phone {
        line(&format!("  Phone:   {phone}"));
    }
    let place: Vec<&str> = [profile.city.as_deref(), profile.country.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !place.is_empty() {
        line(&format!("  Address: {}", place.join(", ")));
    }
}
