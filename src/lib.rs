pub mod aggregator;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod errors;
pub mod harvest;
pub mod models;
pub mod notify;
pub mod utils;

/// Version string with build metadata, shown by `--version`.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);
