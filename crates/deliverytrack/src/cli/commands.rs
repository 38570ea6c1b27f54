//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::record::SectionKind;

/// Create command arguments.
#[derive(Debug, Args)]
pub struct CreateCommand {
    /// Read the intake form from this JSON file instead of stdin
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Scanned QR payload, station link or delivery identifier
    pub scan: String,

    /// Show only this section
    #[arg(short, long, value_enum)]
    pub section: Option<SectionArg>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Update command arguments.
#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Scanned QR payload, station link or delivery identifier
    pub scan: String,

    /// Section to replace (defaults to the section in a scanned station link)
    #[arg(value_enum)]
    pub section: Option<SectionArg>,

    /// Read the section form from this JSON file instead of stdin
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Stations command arguments.
#[derive(Debug, Args)]
pub struct StationsCommand {
    /// Scanned QR payload, station link or delivery identifier
    pub scan: String,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Maximum number of deliveries
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Station section argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SectionArg {
    /// On-site intake
    #[value(alias = "intake")]
    Onsite,
    /// Warehouse
    Warehouse,
    /// Quality check
    Quality,
    /// Logistics
    Logistics,
    /// Finance
    Finance,
}

impl From<SectionArg> for SectionKind {
    fn from(arg: SectionArg) -> Self {
        match arg {
            SectionArg::Onsite => Self::Intake,
            SectionArg::Warehouse => Self::Warehouse,
            SectionArg::Quality => Self::Quality,
            SectionArg::Logistics => Self::Logistics,
            SectionArg::Finance => Self::Finance,
        }
    }
}
