use std::time::Duration;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tokenbank_common::{
    config::{
        DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_DECIMALS, DEFAULT_MAX_ARRAY_ELEMENTS,
        DEFAULT_MAX_POLL_ERRORS,
        DEFAULT_NODE_ADDRESS, DEFAULT_POLL_INTERVAL_MILLIS, DEFAULT_READ_CONCURRENCY,
    },
    crypto::Address,
    storage::{ArrayDescriptor, LockRecord, Slot},
};
#[cfg(feature = "cli")]
use tokenbank_common::{
    config::VERSION,
    logger::{default_logs_datetime_format, LogLevel},
};

use crate::{bank::BankMethods, pipeline::ConfirmationConfig};

// Functions Helpers
fn default_node_address() -> String {
    DEFAULT_NODE_ADDRESS.to_owned()
}

fn default_poll_interval_millis() -> u64 {
    DEFAULT_POLL_INTERVAL_MILLIS
}

fn default_confirmation_timeout_secs() -> u64 {
    DEFAULT_CONFIRMATION_TIMEOUT_SECS
}

fn default_max_poll_errors() -> u32 {
    DEFAULT_MAX_POLL_ERRORS
}

fn default_read_concurrency() -> usize {
    DEFAULT_READ_CONCURRENCY
}

fn default_max_elements() -> u64 {
    DEFAULT_MAX_ARRAY_ELEMENTS
}

fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}

#[cfg(feature = "cli")]
fn default_log_filename() -> String {
    String::from("tokenbank.log")
}

#[cfg(feature = "cli")]
fn default_logs_path() -> String {
    String::from("logs/")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct NetworkConfig {
    /// JSON-RPC endpoint of the ledger node
    #[cfg_attr(feature = "cli", clap(long, default_value_t = default_node_address()))]
    #[serde(default = "default_node_address")]
    pub node_address: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            node_address: default_node_address(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct ContractsConfig {
    /// Address of the fungible token contract
    #[cfg_attr(feature = "cli", clap(long))]
    pub token_contract: Option<Address>,
    /// Address of the bank contract holding deposits
    #[cfg_attr(feature = "cli", clap(long))]
    pub bank_contract: Option<Address>,
    /// Address of the contract keeping the lock array
    #[cfg_attr(feature = "cli", clap(long))]
    pub locks_contract: Option<Address>,
    /// Declaration slot of the lock array
    #[cfg_attr(feature = "cli", clap(long, default_value_t = 0))]
    #[serde(default)]
    pub locks_slot: u64,
    /// Static length when the lock array is a fixed-size array
    #[cfg_attr(feature = "cli", clap(long))]
    pub locks_fixed_length: Option<u64>,
    /// Method descriptors, only configurable from the config file
    #[cfg_attr(feature = "cli", clap(skip))]
    #[serde(default)]
    pub methods: BankMethods,
}

impl ContractsConfig {
    // Where and how the lock array is stored
    pub fn locks_descriptor(&self) -> ArrayDescriptor {
        let slot = Slot::from(self.locks_slot);
        let layout = LockRecord::layout().clone();
        match self.locks_fixed_length {
            Some(length) => ArrayDescriptor::fixed(slot, layout, length),
            None => ArrayDescriptor::dynamic(slot, layout),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct PipelineConfig {
    /// Delay in milliseconds between two receipt queries
    #[cfg_attr(feature = "cli", clap(long, default_value_t = default_poll_interval_millis()))]
    #[serde(default = "default_poll_interval_millis")]
    pub poll_interval_millis: u64,
    /// Seconds to wait for a transaction to be included before failing its step
    #[cfg_attr(feature = "cli", clap(long, default_value_t = default_confirmation_timeout_secs()))]
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    /// Consecutive failed receipt queries tolerated before failing a step
    #[cfg_attr(feature = "cli", clap(long, default_value_t = default_max_poll_errors()))]
    #[serde(default = "default_max_poll_errors")]
    pub max_poll_errors: u32,
    /// Storage reads allowed in flight when listing locks
    #[cfg_attr(feature = "cli", clap(long, default_value_t = default_read_concurrency()))]
    #[serde(default = "default_read_concurrency")]
    pub read_concurrency: usize,
    /// Largest number of lock entries listed at once
    #[cfg_attr(feature = "cli", clap(long, default_value_t = default_max_elements()))]
    #[serde(default = "default_max_elements")]
    pub max_elements: u64,
    /// Decimals of the token, used to parse and display amounts
    #[cfg_attr(feature = "cli", clap(long, default_value_t = default_decimals()))]
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval_millis: default_poll_interval_millis(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            max_poll_errors: default_max_poll_errors(),
            read_concurrency: default_read_concurrency(),
            max_elements: default_max_elements(),
            decimals: default_decimals(),
        }
    }
}

impl PipelineConfig {
    pub fn confirmation(&self) -> ConfirmationConfig {
        ConfirmationConfig {
            poll_interval: Duration::from_millis(self.poll_interval_millis),
            timeout: Duration::from_secs(self.confirmation_timeout_secs),
            max_poll_errors: self.max_poll_errors.max(1),
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct LogConfig {
    /// Set log level
    #[clap(long, value_enum, default_value_t)]
    #[serde(default)]
    pub log_level: LogLevel,
    /// Set file log level
    /// By default, it will be the same as log level
    #[clap(long, value_enum)]
    pub file_log_level: Option<LogLevel>,
    /// Disable the log file
    #[clap(long)]
    #[serde(default)]
    pub disable_file_logging: bool,
    /// Disable the usage of colors in log
    #[clap(long)]
    #[serde(default)]
    pub disable_log_color: bool,
    /// Log filename
    ///
    /// By default filename is tokenbank.log.
    /// File will be stored in logs directory, this is only the filename, not the full path.
    #[clap(long, default_value_t = default_log_filename())]
    #[serde(default = "default_log_filename")]
    pub filename_log: String,
    /// Logs directory
    ///
    /// By default it will be logs/ of the current directory.
    #[clap(long, default_value_t = default_logs_path())]
    #[serde(default = "default_logs_path")]
    pub logs_path: String,
    /// Change the datetime format used by the logger
    #[clap(long, default_value_t = default_logs_datetime_format())]
    #[serde(default = "default_logs_datetime_format")]
    pub datetime_format: String,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the lock array entries read straight from contract storage
    Locks {
        /// First index to read
        #[clap(long)]
        start: Option<u64>,
        /// Number of entries to read, the whole array when omitted
        #[clap(long)]
        count: Option<u64>,
    },
    /// Show token balance, bank balance and allowance of an account
    Balance { account: Address },
    /// Approve the bank if needed, then deposit `amount` tokens
    Deposit {
        /// Account sending the transactions, managed by the node
        #[clap(long)]
        from: Address,
        /// Amount in token units, e.g. 1.5
        amount: String,
    },
    /// Withdraw `amount` tokens from the bank
    Withdraw {
        /// Account sending the transaction, managed by the node
        #[clap(long)]
        from: Address,
        /// Amount in token units, e.g. 1.5
        amount: String,
    },
}

#[cfg(feature = "cli")]
#[derive(Parser, Serialize, Deserialize, Clone)]
#[clap(
    version = VERSION,
    about = "TokenBank - Deposit into and withdraw from a token bank, inspect raw lock storage"
)]
#[command(styles = tokenbank_common::get_cli_styles())]
pub struct Config {
    /// Network configuration
    #[clap(flatten)]
    pub network: NetworkConfig,
    /// Contract addresses and storage layout
    #[clap(flatten)]
    pub contracts: ContractsConfig,
    /// Confirmation and read settings
    #[clap(flatten)]
    pub pipeline: PipelineConfig,
    /// Log configuration
    #[clap(flatten)]
    pub log: LogConfig,
    /// Approve every transaction without asking
    #[clap(long)]
    #[serde(default)]
    pub yes: bool,
    /// JSON File to load the configuration from
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub config_file: Option<String>,
    /// Generate the template at the `config_file` path
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub generate_config_template: bool,
    /// Command to execute
    #[clap(subcommand)]
    #[serde(skip)]
    pub command: Option<Command>,
}
