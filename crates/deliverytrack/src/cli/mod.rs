//! Command-line interface for deliverytrack.
//!
//! This module provides the CLI structure for the `dtrack` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    ConfigCommand, CreateCommand, ListCommand, SectionArg, ShowCommand, StationsCommand,
    StatusCommand, UpdateCommand,
};

/// dtrack - Track a delivery across its handling stations
///
/// Creates a delivery record at intake and lets the warehouse, quality,
/// logistics and finance stations read it and fill in their own section.
#[derive(Debug, Parser)]
#[command(name = "dtrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a new delivery from an intake form
    Create(CreateCommand),

    /// Show a delivery by scan payload, link or identifier
    Show(ShowCommand),

    /// Replace one section of a delivery
    Update(UpdateCommand),

    /// Print the station links for a delivery
    Stations(StationsCommand),

    /// List recent deliveries
    List(ListCommand),

    /// Show database status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
