//! RocketShoes CLI - Shopping cart from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! rs-cli show
//!
//! # Add one unit of product 3
//! rs-cli add 3
//!
//! # Set product 3 to exactly 2 units
//! rs-cli update 3 2
//!
//! # Remove product 3
//! rs-cli remove 3
//!
//! # Empty the cart
//! rs-cli clear
//! ```
//!
//! Configuration comes from the environment (see `rocketshoes_storefront::config`).
//! Failed operations are reported on stderr and exit with status 1.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rocketshoes_core::ProductId;
use rocketshoes_storefront::config::CartConfig;
use rocketshoes_storefront::error::CartError;
use rocketshoes_storefront::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "rs-cli")]
#[command(author, version, about = "RocketShoes cart tools")]
struct Cli {
    /// Print the cart as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current cart
    Show,
    /// Add one unit of a product
    Add {
        /// Catalog product id
        product_id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Catalog product id
        product_id: ProductId,
    },
    /// Set a product's quantity (values <= 0 are ignored)
    Update {
        /// Catalog product id
        product_id: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Remove every product from the cart
    Clear,
}

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "rocketshoes_storefront=info,rocketshoes_cli=info";

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
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

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let config = CartConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so stdout stays clean for cart output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = run(cli, config).await;

    if let Err(e) = result {
        if !reported_by_store(e.as_ref()) {
            tracing::error!("Command failed: {e}");
        }
        std::process::exit(1);
    }
}

/// Cart operation failures are logged, captured and notified by the store.
fn reported_by_store(err: &(dyn std::error::Error + 'static)) -> bool {
    err.downcast_ref::<CartError>().is_some()
}

async fn run(cli: Cli, config: CartConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(config)?;
    let format = commands::cart::OutputFormat::from_json_flag(cli.json);

    match cli.command {
        Commands::Show => commands::cart::show(&state, format)?,
        Commands::Add { product_id } => commands::cart::add(&state, product_id, format).await?,
        Commands::Remove { product_id } => {
            commands::cart::remove(&state, product_id, format).await?;
        }
        Commands::Update { product_id, amount } => {
            commands::cart::update(&state, product_id, amount, format).await?;
        }
        Commands::Clear => commands::cart::clear(&state, format).await?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rocketshoes_core::ProductId;

    use super::*;

    #[test]
    fn test_cart_rejections_are_not_logged_again() {
        let rejected: Box<dyn std::error::Error> = Box::new(CartError::OutOfStock {
            product_id: ProductId::new(1),
            requested: 4,
            available: 3,
        });
        assert!(reported_by_store(rejected.as_ref()));

        let missing: Box<dyn std::error::Error> =
            Box::new(CartError::NotInCart(ProductId::new(2)));
        assert!(reported_by_store(missing.as_ref()));
    }

    #[test]
    fn test_other_failures_are_logged() {
        let encode: Box<dyn std::error::Error> =
            Box::new(serde_json::from_str::<u32>("x").unwrap_err());
        assert!(!reported_by_store(encode.as_ref()));
    }

    #[test]
    fn test_default_filter_shows_store_info() {
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        assert!(DEFAULT_LOG_FILTER.contains("rocketshoes_storefront=info"));
    }
}
