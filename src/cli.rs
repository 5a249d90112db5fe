//! clap-based command line interface.
//!
//! Defines the [`Cli`] struct with subcommands [`Command`] (validate,
//! dispatch, demo, status) and global flags (--config, --verbose).

use clap::{Parser, Subcommand};

/// haulplan — dispatch scheduling and assignment engine for fleet operations.
#[derive(Debug, Parser)]
#[command(name = "haulplan", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the configuration file (defaults to haulplan.toml).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Enable detailed output.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check the stop schedules of jobs in a JSON file without touching the
    /// store.
    Validate {
        /// Path to a JSON file containing an array of jobs.
        #[arg(long)]
        file: String,
    },

    /// Assign the selected jobs to a driver/vehicle pair; more than one job
    /// becomes a manifest.
    Dispatch {
        /// Job ids to dispatch, comma separated, in route order.
        #[arg(long, value_delimiter = ',')]
        jobs: Vec<String>,

        /// Target driver id.
        #[arg(long)]
        driver: String,

        /// Vehicle id; defaults to the driver's assigned vehicle.
        #[arg(long)]
        vehicle: Option<String>,

        /// Route date (YYYY-MM-DD).
        #[arg(long)]
        date: String,
    },

    /// Run the built-in walkthrough against an in-memory store.
    Demo,

    /// Show the resolved configuration.
    Status,
}
