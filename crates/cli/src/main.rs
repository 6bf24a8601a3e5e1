//! DS Nutritional Health CLI - storefront and back-office tools.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! dsnh products list --search omega
//!
//! # Fill the cart and check out
//! dsnh cart add 2 --qty 3
//! dsnh cart show
//! dsnh checkout --first-name Ada --last-name Obi --email ada@example.com \
//!     --phone 08030000000 --street-address "12 Marina Rd" --town Lagos
//!
//! # Back office
//! dsnh orders list
//! dsnh orders fetch ORD-1
//! dsnh products update 2 --price 15000
//! ```
//!
//! Configuration comes from `DSNH_*` environment variables (or `.env`); see
//! `dsnh_storefront::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dsnh_storefront::admin::ProductForm;
use dsnh_storefront::config::StorefrontConfig;
use dsnh_storefront::error::AppError;
use dsnh_storefront::state::Storefront;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "dsnh")]
#[command(author, version, about = "DS Nutritional Health storefront tools")]
struct Cli {
    /// Directory holding the cart and order history (overrides `DSNH_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Inspect and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the current cart
    Checkout(commands::checkout::CheckoutArgs),
    /// Inspect placed orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        /// Case-insensitive filter over names and descriptions
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Create a product
    Create(ProductFieldArgs),
    /// Update a product; omitted fields keep their current values
    Update {
        /// Product id
        id: String,

        #[command(flatten)]
        changes: ProductChangeArgs,
    },
    /// Delete a product (not supported by the API)
    Delete {
        /// Product id
        id: String,
    },
}

#[derive(Args)]
struct ProductFieldArgs {
    /// Product name
    #[arg(short, long)]
    name: String,

    /// Product description
    #[arg(short, long, default_value = "")]
    description: String,

    /// Raw price as the API stores it
    #[arg(short, long, default_value = "")]
    price: String,

    /// Hide the product from shoppers
    #[arg(long)]
    hidden: bool,

    /// Image file to upload
    #[arg(short, long)]
    image: Option<PathBuf>,
}

#[derive(Args)]
struct ProductChangeArgs {
    /// New product name
    #[arg(short, long)]
    name: Option<String>,

    /// New description
    #[arg(short, long)]
    description: Option<String>,

    /// New raw price as the API stores it
    #[arg(short, long)]
    price: Option<String>,

    /// Hide the product from shoppers
    #[arg(long, conflicts_with = "visible")]
    hidden: bool,

    /// Show the product to shoppers
    #[arg(long)]
    visible: bool,

    /// Replacement image file
    #[arg(short, long)]
    image: Option<PathBuf>,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a catalog product
    Add {
        /// Product id
        id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        qty: u32,
    },
    /// Set the quantity of a cart line
    Set {
        /// Product id
        id: String,

        /// New quantity (values below 1 become 1)
        qty: String,
    },
    /// Remove a cart line
    Remove {
        /// Product id
        id: String,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrderAction {
    /// List locally recorded orders
    List,
    /// Show a locally recorded order
    Show {
        /// Order id
        id: String,
    },
    /// Fetch an order from the API
    Fetch {
        /// Order id
        id: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Route WARN and above to Sentry events, INFO and DEBUG to breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = StorefrontConfig::from_env().map(|mut config| {
        if let Some(dir) = &cli.data_dir {
            config.data_dir.clone_from(dir);
        }
        config
    });

    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dsnh_storefront=info,dsnh_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().without_time().with_target(false))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        e.report();
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: StorefrontConfig) -> Result<(), AppError> {
    let storefront = Storefront::new(config)?;

    match command {
        Commands::Products { action } => match action {
            ProductAction::List { search } => {
                commands::products::list(&storefront, &search).await;
            }
            ProductAction::Create(fields) => {
                commands::products::save(&storefront, fields.into_form()?).await?;
            }
            ProductAction::Update { id, changes } => {
                let mut form = commands::products::current_form(&storefront, &id).await?;
                changes.apply(&mut form)?;
                commands::products::save(&storefront, form).await?;
            }
            ProductAction::Delete { id } => storefront.admin().products.delete(&id)?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&storefront),
            CartAction::Add { id, qty } => commands::cart::add(&storefront, &id, qty).await?,
            CartAction::Set { id, qty } => commands::cart::set(&storefront, &id, &qty),
            CartAction::Remove { id } => commands::cart::remove(&storefront, &id),
            CartAction::Clear => commands::cart::clear(&storefront),
        },
        Commands::Checkout(args) => commands::checkout::run(&storefront, args).await?,
        Commands::Orders { action } => match action {
            OrderAction::List => commands::orders::list(&storefront),
            OrderAction::Show { id } => commands::orders::show(&storefront, &id)?,
            OrderAction::Fetch { id } => commands::orders::fetch(&storefront, &id).await?,
        },
    }
    Ok(())
}

impl ProductFieldArgs {
    fn into_form(self) -> Result<ProductForm, AppError> {
        let image = self
            .image
            .map(|path| commands::products::read_image(&path))
            .transpose()?;

        Ok(ProductForm {
            id: String::new(),
            name: self.name,
            description: self.description,
            price: self.price,
            availability: if self.hidden { "0" } else { "1" }.to_string(),
            image,
        })
    }
}

impl ProductChangeArgs {
    /// Overlay the supplied flags onto a form pre-filled from the product.
    fn apply(self, form: &mut ProductForm) -> Result<(), AppError> {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
        if let Some(price) = self.price {
            form.price = price;
        }
        if self.hidden {
            form.availability = "0".to_string();
        } else if self.visible {
            form.availability = "1".to_string();
        }
        if let Some(path) = self.image {
            form.image = Some(commands::products::read_image(&path)?);
        }
        Ok(())
    }
}
