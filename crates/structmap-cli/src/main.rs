//! # structmap-cli
//!
//! Command-line front end for the customer demo. Results are printed as
//! pretty JSON on stdout; logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use structmap_demo::{
    AddressDtoService, CustomerDtoService, CustomerRepository, DemoConfig, StaticCountryService,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "structmap")]
#[command(about = "Map demo customers to DTOs with declarative rules")]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full customer DTO (address lookups run concurrently)
    Customer {
        /// Customer id
        id: u32,
    },

    /// Print the flat customer summary (synchronous rules only)
    Summary {
        /// Customer id
        id: u32,
    },

    /// List the known customers
    List,
}

#[derive(Serialize)]
struct CustomerListing {
    id: u32,
    name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = DemoConfig::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    let service = build_service(&config)?;
    debug!(
        config = ?cli.config,
        lookup_delay_ms = config.address_lookup_delay_ms,
        "assembled customer service"
    );

    match cli.command {
        Commands::Customer { id } => {
            info!(id, "mapping customer");
            let dto = service.get_by_id(id).await.map_err(describe)?;
            print_json(&dto)
        }
        Commands::Summary { id } => {
            info!(id, "summarizing customer");
            let summary = service.summary_by_id(id).map_err(describe)?;
            print_json(&summary)
        }
        Commands::List => {
            info!("listing customers");
            let repository = service.repository();
            let listing: Vec<_> = repository
                .ids()
                .filter_map(|id| {
                    repository.get(id).map(|customer| CustomerListing {
                        id,
                        name: format!("{} {}", customer.first_name, customer.surname),
                    })
                })
                .collect();
            print_json(&listing)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_service(config: &DemoConfig) -> anyhow::Result<CustomerDtoService> {
    let countries = Arc::new(StaticCountryService::from_config(config));
    let addresses = AddressDtoService::new(countries, config.lookup_delay());
    CustomerDtoService::new(CustomerRepository::seeded(), addresses, config)
        .context("failed to assemble customer mappers")
}

/// Attach the failing slot to mapping errors.
fn describe(error: structmap_demo::Error) -> anyhow::Error {
    let slot = match &error {
        structmap_demo::Error::Mapping(mapping) => mapping.failed_slot().map(ToString::to_string),
        _ => None,
    };

    match slot {
        Some(slot) => anyhow::Error::new(error).context(format!("rule for slot {slot} failed")),
        None => error.into(),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
