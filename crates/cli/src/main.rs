//! Pizzeria CLI - database migrations and delivery zone tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! pz-cli migrate
//!
//! # Insert default settings and zone bands (idempotent)
//! pz-cli seed --home-lat -23.5505 --home-lon -46.6333 --home-address "Rua da Pizza, 42"
//!
//! # Inspect zones
//! pz-cli zones list
//! pz-cli zones check
//!
//! # Resolve one address or coordinate, as checkout would
//! pz-cli resolve --address "Av. Paulista, 1000, São Paulo"
//! pz-cli resolve --lat -23.5605 --lon -46.6433
//! ```
//!
//! All commands read `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pz-cli")]
#[command(author, version, about = "Pizzeria delivery CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert default delivery settings and zones
    Seed {
        /// Pizzeria latitude; with `--home-lon`, enables geolocation
        #[arg(long, allow_hyphen_values = true, requires = "home_lon")]
        home_lat: Option<f64>,

        /// Pizzeria longitude
        #[arg(long, allow_hyphen_values = true, requires = "home_lat")]
        home_lon: Option<f64>,

        /// Pizzeria street address shown to operators
        #[arg(long)]
        home_address: Option<String>,
    },
    /// Inspect delivery zones
    Zones {
        #[command(subcommand)]
        action: ZonesAction,
    },
    /// Resolve delivery for an address or coordinate
    Resolve {
        /// Free-text delivery address
        #[arg(short, long)]
        address: Option<String>,

        /// Latitude of the delivery point
        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude of the delivery point
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,
    },
}

#[derive(Subcommand)]
enum ZonesAction {
    /// List all zones, active or not
    List,
    /// Report gaps, overlaps and inverted bands among active zones
    Check,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed {
            home_lat,
            home_lon,
            home_address,
        } => {
            let home = home_lat.zip(home_lon);
            commands::seed::run(home, home_address.as_deref()).await?;
        }
        Commands::Zones { action } => match action {
            ZonesAction::List => commands::zones::list().await?,
            ZonesAction::Check => commands::zones::check().await?,
        },
        Commands::Resolve { address, lat, lon } => {
            commands::resolve::run(address, lat.zip(lon)).await?;
        }
    }
    Ok(())
}
