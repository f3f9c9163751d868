use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use apdhcpd::{Config, DhcpServer, LeaseStore, Result};

#[derive(Parser)]
#[command(name = "apdhcpd")]
#[command(author, version, about = "A minimal DHCP server for access-point gateways", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve DHCP requests (default)
    Run,
    /// Print the effective configuration as JSON
    ShowConfig,
    /// Load the reservation file and print the accepted table
    CheckReservations,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let config = Config::load_or_create(&cli.config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            info!("Starting DHCP server with config: {:?}", cli.config);
            let mut server = DhcpServer::new(config)?;

            let outcome = tokio::select! {
                result = server.run() => Some(result),
                _ = tokio::signal::ctrl_c() => None,
            };

            match outcome {
                Some(result) => {
                    if let Err(error) = &result {
                        error!("Server stopped: {}", error);
                    }
                    result
                }
                None => {
                    info!("Received shutdown signal, stopping server...");
                    print_leases(server.leases());
                    Ok(())
                }
            }
        }
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::CheckReservations => {
            let entries = config.load_reservations()?;
            let mut store = LeaseStore::from_config(&config);
            let accepted = store.load_reservations(&entries);

            println!(
                "Accepted {} of {} reservation entries from {}",
                accepted,
                entries.len(),
                config.reservations_file
            );
            print_leases(&store);
            Ok(())
        }
    }
}

fn print_leases(store: &LeaseStore) {
    if store.reservations().is_empty() && store.dynamic_leases().is_empty() {
        println!("No leases.");
        return;
    }

    println!(
        "{:<10} {:<20} {:<16} {:<24}",
        "Kind", "MAC Address", "IP Address", "Assigned At"
    );
    println!("{}", "-".repeat(70));

    for reservation in store.reservations() {
        println!(
            "{:<10} {:<20} {:<16} {:<24}",
            "reserved",
            reservation.mac.to_string(),
            reservation.ip.to_string(),
            "-"
        );
    }

    for lease in store.dynamic_leases() {
        println!(
            "{:<10} {:<20} {:<16} {:<24}",
            "dynamic",
            lease.mac.to_string(),
            lease.ip.to_string(),
            lease.assigned_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
        );
    }
}
