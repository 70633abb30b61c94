//! TitanWalk CLI - campus walking navigation from the terminal.
//!
//! A thin presentation layer over the `titanwalk` engine: it lists and
//! searches campus locations, requests one-shot walking routes, simulates
//! a walk with live route updates, and performs admin accessibility
//! toggles. All state and policy live in the engine.

use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

#[derive(Parser)]
#[command(name = "titanwalk")]
#[command(version = titanwalk::VERSION)]
#[command(about = "Campus walking navigation", long_about = None)]
struct Cli {
    /// OSRM-compatible routing endpoint.
    #[arg(long, default_value = titanwalk::route::DEFAULT_BASE_URL)]
    router_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List campus locations visible to the session.
    List {
        /// Admin username; with --password, shows closed locations too.
        #[arg(long, requires = "password")]
        username: Option<String>,

        /// Admin password.
        #[arg(long, requires = "username")]
        password: Option<String>,
    },

    /// Find a location by name (case-insensitive substring).
    Search {
        /// Name to search for, e.g. "Library".
        query: String,
    },

    /// Request a walking route to a location.
    Route {
        /// Destination location name.
        name: String,

        /// Current position as "lat,lon".
        #[arg(long)]
        from: String,
    },

    /// Simulate walking along a path, printing live route updates.
    Walk {
        /// Destination location name.
        name: String,

        /// Waypoints as "lat,lon;lat,lon;...". The first waypoint is the
        /// route origin.
        #[arg(long)]
        path: String,

        /// Milliseconds between simulated position fixes.
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },

    /// Toggle a location open/closed (admin).
    Toggle {
        /// Location name.
        name: String,

        /// Admin username.
        #[arg(long)]
        username: String,

        /// Admin password.
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    tracing::debug!(version = titanwalk::VERSION, "starting titanwalk CLI");
    if let Err(e) = commands::run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
