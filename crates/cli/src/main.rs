//! Marketstall CLI - terminal front end for the storefront.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password is read from stdin when --password is omitted)
//! ms-cli login -e ada@example.com
//!
//! # Browse and search the catalog
//! ms-cli items --page 2
//! ms-cli search "espresso cup"
//!
//! # Work with the cart
//! ms-cli cart add 5 --quantity 2
//! ms-cli cart set 5 0
//! ms-cli cart checkout
//!
//! # Orders and favorites
//! ms-cli orders history
//! ms-cli favorites toggle 5
//! ```
//!
//! Configuration comes from the environment (see `marketstall_storefront::config`).
//! Credentials are kept in `STOREFRONT_TOKEN_PATH`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use marketstall_core::{Email, ItemId, OrderId, OrderItemId};
use marketstall_storefront::{ClientEvent, LogFormat, Storefront, StorefrontConfig, StorefrontError};
use sentry::integrations::tracing as sentry_tracing;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "ms-cli")]
#[command(author, version, about = "Marketstall storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the credentials
    Login {
        #[arg(short, long)]
        email: Email,

        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(short, long)]
        email: Email,

        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        country: Option<String>,

        #[arg(long)]
        city: Option<String>,
    },
    /// Forget the stored credentials
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Manage the profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// List catalog items
    Items {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Search the catalog by name
    Search {
        /// Search terms (blank lists all items)
        #[arg(num_args = 0..)]
        query: Vec<String>,
    },
    /// Check stock for an item
    Availability { item_id: ItemId },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Change profile fields (omitted fields keep their value)
    Update {
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        country: Option<String>,

        #[arg(long)]
        city: Option<String>,
    },
    /// Delete the account
    Delete {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add units of an item
    Add {
        item_id: ItemId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a line (0 removes it)
    Set { item_id: ItemId, quantity: u32 },
    /// Remove a line
    Remove { item_id: ItemId },
    /// Empty the cart
    Clear,
    /// Turn the cart into an order
    Checkout,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List all orders
    List,
    /// Show one order
    Show { order_id: OrderId },
    /// List placed orders
    History,
    /// Show the order being assembled
    Pending,
    /// Close an order
    Close { order_id: OrderId },
    /// Remove a line from an order
    RemoveItem {
        order_id: OrderId,
        order_item_id: OrderItemId,
    },
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// List favorites
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Add or remove an item
    Toggle { item_id: ItemId },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::debug!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Log to stderr so stdout carries only command output.
fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketstall_storefront=info,marketstall_cli=info".into());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => return commands::fail(&StorefrontError::from(e)),
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(config.log_format);

    let storefront = match Storefront::open(config) {
        Ok(storefront) => storefront,
        Err(e) => return commands::fail(&e),
    };
    let mut events = storefront.api().subscribe();

    let result = run(&storefront, cli).await;

    report_login_required(&mut events);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_reportable() {
                let event_id = sentry::capture_error(&e);
                tracing::error!(error = %e, sentry_event_id = %event_id, "Command failed");
            }
            commands::fail(&e)
        }
    }
}

async fn run(storefront: &Storefront, cli: Cli) -> Result<(), StorefrontError> {
    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(storefront, email, password).await?;
        }
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            phone,
            country,
            city,
        } => {
            let details = commands::auth::Registration {
                first_name,
                last_name,
                email,
                phone,
                country,
                city,
            };
            commands::auth::register(storefront, details, password).await?;
        }
        Commands::Logout => commands::auth::logout(storefront),
        Commands::Whoami => commands::auth::whoami(storefront).await?,
        Commands::Profile { action } => match action {
            ProfileAction::Update {
                first_name,
                last_name,
                phone,
                country,
                city,
            } => {
                let changes = commands::profile::ProfileChanges {
                    first_name,
                    last_name,
                    phone,
                    country,
                    city,
                };
                commands::profile::update(storefront, changes).await?;
            }
            ProfileAction::Delete { yes } => commands::profile::delete(storefront, yes).await?,
        },
        Commands::Items { page, limit } => commands::catalog::items(storefront, page, limit).await?,
        Commands::Search { query } => commands::catalog::search(storefront, &query.join(" ")).await?,
        Commands::Availability { item_id } => {
            commands::catalog::availability(storefront, item_id).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(storefront).await?,
            CartAction::Add { item_id, quantity } => {
                commands::cart::add(storefront, item_id, quantity).await?;
            }
            CartAction::Set { item_id, quantity } => {
                commands::cart::set(storefront, item_id, quantity).await?;
            }
            CartAction::Remove { item_id } => commands::cart::remove(storefront, item_id).await?,
            CartAction::Clear => commands::cart::clear(storefront).await?,
            CartAction::Checkout => commands::cart::checkout(storefront).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(storefront).await?,
            OrdersAction::Show { order_id } => commands::orders::show(storefront, order_id).await?,
            OrdersAction::History => commands::orders::history(storefront).await?,
            OrdersAction::Pending => commands::orders::pending(storefront).await?,
            OrdersAction::Close { order_id } => commands::orders::close(storefront, order_id).await?,
            OrdersAction::RemoveItem {
                order_id,
                order_item_id,
            } => commands::orders::remove_item(storefront, order_id, order_item_id).await?,
        },
        Commands::Favorites { action } => match action {
            FavoritesAction::List { page, limit } => {
                commands::favorites::list(storefront, page, limit).await?;
            }
            FavoritesAction::Toggle { item_id } => {
                commands::favorites::toggle(storefront, item_id).await?;
            }
        },
    }
    Ok(())
}

/// Tell the user to sign in again if the session ended during the command.
fn report_login_required(events: &mut broadcast::Receiver<ClientEvent>) {
    if let Ok(ClientEvent::LoginRequired { login_path }) = events.try_recv() {
        tracing::debug!(%login_path, "Login required");
        commands::notice("Your session has expired. Run `ms-cli login` to sign in again.");
    }
}
