//! eShop CLI - a command-line storefront.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session is kept in ESHOP_SESSION_DIR)
//! eshop login -u user@example.com -p secret
//!
//! # Browse the catalog
//! eshop products --category Apparel --search shoe --sort price-asc
//!
//! # Order two units of product p1, saving a new delivery address
//! eshop order --product p1 --quantity 2 --name A --contact-number 9999999999 \
//!     --street S --city C --state ST --zipcode 123456
//!
//! # Admin: delete a product
//! eshop product delete p1 --yes
//! ```
//!
//! # Commands
//!
//! - `login`, `logout`, `whoami`, `signup` - Session management
//! - `products` - List, filter and sort the catalog
//! - `product show|add|modify|delete` - Product detail and admin CRUD
//! - `order` - Run the checkout for one product
//! - `navigate` - Show where a path resolves for the current session

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eshop_storefront::{Storefront, StorefrontConfig};

mod commands;

#[derive(Parser)]
#[command(name = "eshop")]
#[command(author, version, about = "eShop storefront on the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Show the current session
    Whoami,
    /// Create an account
    Signup(SignupArgs),
    /// List products
    Products {
        /// Category to show (`ALL` for every category)
        #[arg(short, long, default_value = "ALL")]
        category: String,

        /// Keyword matched against name and description
        #[arg(short, long, default_value = "")]
        search: String,

        /// `default`, `price-desc`, `price-asc` or `newest`
        #[arg(long, default_value = "default")]
        sort: String,
    },
    /// Show or manage a single product
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Order a product
    Order(OrderArgs),
    /// Resolve a path against the routing table
    Navigate {
        /// Path such as `/products/p1`
        path: String,
    },
}

#[derive(Args)]
struct SignupArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    confirm_password: String,
    #[arg(long)]
    contact_number: String,
}

#[derive(Subcommand)]
enum ProductAction {
    /// Show product details
    Show {
        id: String,

        /// Quantity to price
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },
    /// Add a product (admin)
    Add(ProductFields),
    /// Modify a product (admin); omitted fields keep their value
    Modify {
        id: String,

        #[command(flatten)]
        fields: ProductFieldUpdates,
    },
    /// Delete a product (admin)
    Delete {
        id: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct ProductFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    manufacturer: String,
    #[arg(long)]
    available_items: String,
    #[arg(long)]
    price: String,
    #[arg(long, default_value = "")]
    image_url: String,
    #[arg(long, default_value = "")]
    description: String,
}

#[derive(Args)]
struct ProductFieldUpdates {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    manufacturer: Option<String>,
    #[arg(long)]
    available_items: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args)]
struct OrderArgs {
    /// Product id
    #[arg(long)]
    product: String,

    #[arg(long, default_value_t = 1)]
    quantity: i64,

    /// Saved address id; omit to create one from the fields below
    #[arg(long)]
    address: Option<String>,

    #[command(flatten)]
    new_address: NewAddressArgs,
}

#[derive(Args)]
struct NewAddressArgs {
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    contact_number: String,
    #[arg(long, default_value = "")]
    street: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    state: String,
    #[arg(long, default_value = "")]
    zipcode: String,
    #[arg(long, default_value = "")]
    landmark: String,
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

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "eshop_storefront=info,eshop_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = StorefrontConfig::from_env();
    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let storefront = Storefront::from_config(config)?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&storefront, username, password).await?;
        }
        Commands::Logout => commands::auth::logout(&storefront)?,
        Commands::Whoami => commands::auth::whoami(&storefront),
        Commands::Signup(args) => commands::auth::signup(&storefront, args.into()).await?,
        Commands::Products {
            category,
            search,
            sort,
        } => commands::catalog::list(&storefront, &category, search, &sort).await?,
        Commands::Product { action } => match action {
            ProductAction::Show { id, quantity } => {
                commands::product::show(&storefront, id.into(), quantity).await?;
            }
            ProductAction::Add(fields) => {
                commands::product::add(&storefront, fields.into()).await?;
            }
            ProductAction::Modify { id, fields } => {
                commands::product::modify(&storefront, id.into(), fields.into()).await?;
            }
            ProductAction::Delete { id, yes } => {
                commands::product::delete(&storefront, &id.into(), yes).await?;
            }
        },
        Commands::Order(args) => {
            let new_address = args.new_address.into();
            commands::order::place(
                &storefront,
                args.product.into(),
                args.quantity,
                args.address.map(Into::into),
                new_address,
            )
            .await?;
        }
        Commands::Navigate { path } => commands::navigate::resolve(&storefront, &path),
    }
    Ok(())
}

// =============================================================================
// Argument conversions
// =============================================================================

impl From<SignupArgs> for eshop_storefront::forms::SignupForm {
    fn from(args: SignupArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            password: args.password,
            confirm_password: args.confirm_password,
            contact_number: args.contact_number,
        }
    }
}

impl From<ProductFields> for eshop_storefront::forms::ProductForm {
    fn from(args: ProductFields) -> Self {
        Self {
            name: args.name,
            category: args.category,
            manufacturer: args.manufacturer,
            available_items: args.available_items,
            price: args.price,
            image_url: args.image_url,
            description: args.description,
        }
    }
}

impl From<ProductFieldUpdates> for commands::product::FieldUpdates {
    fn from(args: ProductFieldUpdates) -> Self {
        Self {
            name: args.name,
            category: args.category,
            manufacturer: args.manufacturer,
            available_items: args.available_items,
            price: args.price,
            image_url: args.image_url,
            description: args.description,
        }
    }
}

impl From<NewAddressArgs> for eshop_storefront::forms::AddressForm {
    fn from(args: NewAddressArgs) -> Self {
        Self {
            name: args.name,
            contact_number: args.contact_number,
            street: args.street,
            city: args.city,
            state: args.state,
            zipcode: args.zipcode,
            landmark: args.landmark,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_order_with_new_address() {
        let cli = Cli::try_parse_from([
            "eshop",
            "order",
            "--product",
            "p1",
            "--quantity",
            "3",
            "--contact-number",
            "9999999999",
            "--zipcode",
            "123456",
        ]);
        let Ok(Cli {
            command: Commands::Order(args),
        }) = cli
        else {
            panic!("order arguments did not parse");
        };
        assert_eq!(args.quantity, 3);
        assert!(args.address.is_none());
        assert_eq!(args.new_address.zipcode, "123456");
    }
}
