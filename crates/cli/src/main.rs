//! Ventas CLI - point-of-sale operations from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (token saved to VENTAS_SESSION_FILE)
//! ventas login -u caja1 -p secreto
//!
//! # Browse the catalog
//! ventas productos list --buscar cafe
//! ventas clientes list
//!
//! # Record a sale: two of product 4, one of product 9
//! ventas ventas nueva --cliente 7 --item 4:2 --item 9
//!
//! # Check what the route guard would do
//! ventas route /panel
//! ```
//!
//! # Commands
//!
//! - `login`, `logout`, `status` - Session lifecycle
//! - `route` - Evaluate a dashboard path against the saved session
//! - `productos list|save|delete` - Catalog management
//! - `clientes list|create|delete` - Customer management
//! - `ventas list|nueva` - Sales history and order submission

#![cfg_attr(not(test), forbid(unsafe_code))]
// Command output goes to the terminal.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ventas_core::CustomerId;

mod commands;
mod config;

use commands::App;
use config::CliConfig;

#[derive(Parser)]
#[command(name = "ventas")]
#[command(version, about = "Ventas point-of-sale CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and save the session token
    Login {
        /// Username (default: `VENTAS_USERNAME`)
        #[arg(short, long)]
        username: Option<String>,

        /// Password (default: `VENTAS_PASSWORD`)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the saved session
    Logout,
    /// Show the saved session
    Status,
    /// Evaluate a dashboard path against the saved session
    Route {
        /// Path such as `/panel` or `/`
        path: String,
    },
    /// Manage products
    Productos {
        #[command(subcommand)]
        action: ProductosAction,
    },
    /// Manage customers
    Clientes {
        #[command(subcommand)]
        action: ClientesAction,
    },
    /// Sales history and new sales
    Ventas {
        #[command(subcommand)]
        action: VentasAction,
    },
}

#[derive(Subcommand)]
enum ProductosAction {
    /// List products
    List {
        /// Only products whose name contains this text
        #[arg(short, long)]
        buscar: Option<String>,
    },
    /// Create a product, or update it when `--id` is given
    Save {
        #[arg(long)]
        id: Option<String>,

        #[arg(short, long)]
        nombre: String,

        #[arg(short, long)]
        precio: Decimal,

        /// Units in stock
        #[arg(short, long, default_value_t = 0)]
        cantidad: i64,

        #[arg(short, long)]
        descripcion: Option<String>,
    },
    /// Delete a product
    Delete { id: String },
}

#[derive(Subcommand)]
enum ClientesAction {
    /// List customers
    List {
        /// Only customers whose name or email contains this text
        #[arg(short, long)]
        buscar: Option<String>,
    },
    /// Create a customer
    Create {
        #[arg(short, long)]
        nombre: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        telefono: Option<String>,
    },
    /// Delete a customer
    Delete { id: CustomerId },
}

#[derive(Subcommand)]
enum VentasAction {
    /// List recorded sales
    List,
    /// Submit a new sale
    Nueva {
        /// Customer id
        #[arg(short, long)]
        cliente: CustomerId,

        /// Product key, optionally with a quantity: `4` or `4:2`
        #[arg(short, long = "item", required = true)]
        items: Vec<String>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CliConfig) -> Option<sentry::ClientInitGuard> {
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
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(config: &CliConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ventas_client=info,ventas_cli=info".into());

    let json_layer = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.log_json).then(|| tracing_subscriber::fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CliConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Sentry first so the tracing layer has a client to report to.
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::connect(config).await?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::session::login(&app, username, password.map(SecretString::from)).await?;
        }
        Commands::Logout => commands::session::logout(&app).await,
        Commands::Status => commands::session::status(&app).await,
        Commands::Route { path } => commands::session::route(&app, &path).await,
        Commands::Productos { action } => match action {
            ProductosAction::List { buscar } => {
                commands::productos::list(&app, buscar.as_deref()).await?;
            }
            ProductosAction::Save {
                id,
                nombre,
                precio,
                cantidad,
                descripcion,
            } => {
                commands::productos::save(
                    &app,
                    id.as_deref(),
                    &nombre,
                    precio,
                    cantidad,
                    descripcion,
                )
                .await?;
            }
            ProductosAction::Delete { id } => commands::productos::delete(&app, &id).await?,
        },
        Commands::Clientes { action } => match action {
            ClientesAction::List { buscar } => {
                commands::clientes::list(&app, buscar.as_deref()).await?;
            }
            ClientesAction::Create {
                nombre,
                email,
                telefono,
            } => {
                commands::clientes::create(&app, &nombre, &email, telefono.as_deref()).await?;
            }
            ClientesAction::Delete { id } => commands::clientes::delete(&app, id).await?,
        },
        Commands::Ventas { action } => match action {
            VentasAction::List => commands::ventas::list(&app).await?,
            VentasAction::Nueva { cliente, items } => {
                commands::ventas::nueva(&app, cliente, &items).await?;
            }
        },
    }
    Ok(())
}
