use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "huntsman",
    version,
    long_version = crate::LONG_VERSION,
    about = "Smart contract audit target aggregation and AI agent dispatch"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Refresh targets from all source feeds and show the pool
    Discover(DiscoverArgs),
    /// Select the next batch of targets, optionally dispatching audits
    Batch(BatchArgs),
    /// Dispatch an audit for a single contract
    Analyze(AnalyzeArgs),
    /// Harvest completed sessions and notify on significant findings
    Harvest(HarvestArgs),
    /// Show aggregator and notifier statistics
    Stats(StatsArgs),
    /// Add a manual target to the pool
    Add(AddArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct DiscoverArgs {
    /// Minimum bounty payout in USD
    #[arg(long)]
    pub min_bounty: Option<u64>,

    /// Minimum protocol TVL in USD
    #[arg(long)]
    pub min_tvl: Option<f64>,

    /// Max protocols pulled from the TVL feed
    #[arg(long)]
    pub limit: Option<usize>,

    /// Also list top protocols on one specific chain
    #[arg(long)]
    pub chain: Option<String>,

    /// How many top targets to print
    #[arg(long, default_value = "10")]
    pub top: usize,
}

#[derive(Args, Clone)]
pub struct BatchArgs {
    /// Targets per batch
    #[arg(short, long)]
    pub size: Option<usize>,

    /// Recency window in days
    #[arg(long)]
    pub days: Option<i64>,

    /// Dispatch audit sessions instead of just printing the batch
    #[arg(long)]
    pub dispatch: bool,

    /// Dispatch the whole batch as one combined session (stretches
    /// per-session quotas)
    #[arg(long, requires = "dispatch")]
    pub combined: bool,
}

#[derive(Args, Clone)]
pub struct AnalyzeArgs {
    /// Contract address to audit
    pub address: String,

    /// Chain the contract lives on
    #[arg(long, default_value = "ethereum")]
    pub chain: String,

    /// Display name for the contract
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args, Clone)]
pub struct HarvestArgs {
    /// Deliver notifications to the configured webhook instead of stdout
    #[arg(long)]
    pub notify: bool,
}

#[derive(Args, Clone)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct AddArgs {
    /// Contract address
    pub address: String,

    /// Chain the contract lives on
    #[arg(long, default_value = "ethereum")]
    pub chain: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Bounty program name, if any
    #[arg(long)]
    pub program: Option<String>,

    /// Maximum bounty payout in USD
    #[arg(long, default_value = "0")]
    pub max_bounty: u64,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate
    pub config: String,
}
