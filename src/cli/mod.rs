//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for phimask using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Configuration file used when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "phimask.toml";

/// phimask - reversible PHI tokenization for X12 XML documents
#[derive(Parser, Debug)]
#[command(name = "phimask")]
#[command(version, about, long_about = None)]
#[command(author = "phimask Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, env = "PHIMASK_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PHIMASK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mask PHI fields and record tokens in the mapping store
    Deidentify(commands::deidentify::DeidentifyArgs),

    /// Restore masked documents from the mapping store
    Reidentify(commands::reidentify::ReidentifyArgs),

    /// Validate configuration file and rule set
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
