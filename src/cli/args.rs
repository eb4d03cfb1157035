//! CLI argument definitions using clap.
//!
//! Credentials and the API base resolve from flags first, then environment
//! variables. This is the only place env vars are read.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::client::DEFAULT_API_URL;

/// OpScan - submit smart contracts for security analysis.
#[derive(Parser, Debug)]
#[command(name = "opscan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// API base URL
    #[arg(long, value_name = "URL", env = "OPSCAN_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Account email
    #[arg(long, value_name = "EMAIL", env = "OPSCAN_EMAIL", global = true)]
    pub email: Option<String>,

    /// Account Ethereum address
    #[arg(long, value_name = "ADDRESS", env = "OPSCAN_ETH_ADDRESS", global = true)]
    pub eth_address: Option<String>,

    /// Account password
    #[arg(long, value_name = "PASSWORD", env = "OPSCAN_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Pre-issued API key (bypasses login)
    #[arg(long, value_name = "KEY", env = "OPSCAN_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Emit JSON logs to stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit an analysis and wait for its issues
    Analyze(AnalyzeArgs),

    /// Show the status of a submitted analysis
    Status {
        /// Analysis UUID
        uuid: String,
    },

    /// Fetch the issues of a finished analysis
    Issues {
        /// Analysis UUID
        uuid: String,
    },

    /// List past analyses
    List(ListArgs),

    /// Show API service version info
    Version,
}

/// Arguments for the `analyze` command.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Deployed EVM bytecode (hex string)
    #[arg(long, value_name = "HEX", conflicts_with = "bytecode_file")]
    pub bytecode: Option<String>,

    /// File containing deployed EVM bytecode
    #[arg(long, value_name = "PATH")]
    pub bytecode_file: Option<PathBuf>,

    /// Total poll budget in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    pub timeout: u64,

    /// Delay before the first status check, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub initial_delay: u64,
}

/// Arguments for the `list` command.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only analyses submitted on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub date_from: Option<NaiveDate>,

    /// Only analyses submitted on or before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub date_to: Option<NaiveDate>,

    /// Pagination offset
    #[arg(long, value_name = "N")]
    pub offset: Option<u32>,
}
