//! Soundcart CLI - terminal client for the Soundcart storefront.
//!
//! # Usage
//!
//! ```bash
//! # Tail live notifications from the hub
//! sc-cli watch
//!
//! # List notifications (optionally only unread)
//! sc-cli notifications --unread
//!
//! # Acknowledge notifications
//! sc-cli mark-read n-42
//! sc-cli mark-read --all
//!
//! # Browse a store and order
//! sc-cli menu store-7
//! sc-cli order prod-1:2 prod-9
//! ```
//!
//! Configuration comes from the environment (see
//! `soundcart_storefront::config`); `SOUNDCART_AUTH_TOKEN` is required for
//! `watch` and the acknowledgement commands.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use soundcart_storefront::{AppState, StorefrontConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "sc-cli")]
#[command(author, version, about = "Soundcart terminal client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tail live notifications from the hub
    Watch,
    /// List notifications from the backend
    Notifications {
        /// Only show unread notifications
        #[arg(long)]
        unread: bool,
    },
    /// Mark a notification (or all of them) as read
    MarkRead {
        /// Notification id to acknowledge
        id: Option<String>,

        /// Acknowledge every notification
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
    /// Show a store's menu
    Menu {
        /// Store id
        store_id: String,
    },
    /// Submit an order
    Order {
        /// Items as `product-id:quantity` pairs (quantity defaults to 1)
        #[arg(required = true)]
        items: Vec<String>,
    },
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
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "soundcart_storefront=info,soundcart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();
    let app = AppState::new(config);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &app).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, app: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Watch => commands::watch::run(app).await?,
        Commands::Notifications { unread } => commands::notifications::list(app, unread).await?,
        Commands::MarkRead { id, all } => {
            if all {
                commands::notifications::mark_all_read(app).await?;
            } else if let Some(id) = id {
                commands::notifications::mark_read(app, &id).await?;
            } else {
                return Err("provide a notification id or --all".into());
            }
        }
        Commands::Menu { store_id } => commands::shop::menu(app, &store_id).await?,
        Commands::Order { items } => commands::shop::order(app, &items).await?,
    }
    Ok(())
}
