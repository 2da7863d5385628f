use clap::Parser;
use tracing_subscriber::EnvFilter;

use huntsman::cli::{self, Cli, Commands};
use huntsman::config;
use huntsman::errors::HuntsmanError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .init();

    let result = run(cli).await;

    match result {
        Ok(()) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            let exit_code = match &e {
                HuntsmanError::Config(_) => 2,
                HuntsmanError::Persistence(_) => 3,
                HuntsmanError::Dispatch(_) => 4,
                HuntsmanError::InvalidTarget(_) => 5,
                _ => 1,
            };
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: Cli) -> Result<(), HuntsmanError> {
    let config_path = cli.config.as_ref().map(std::path::PathBuf::from);
    let config = config::load_config(config_path.as_deref()).await?;

    match cli.command {
        Commands::Discover(args) => cli::discover::handle_discover(args, &config).await,
        Commands::Batch(args) => cli::batch::handle_batch(args, &config).await,
        Commands::Analyze(args) => cli::analyze::handle_analyze(args, &config).await,
        Commands::Harvest(args) => cli::harvest::handle_harvest(args, &config).await,
        Commands::Stats(args) => cli::stats::handle_stats(args, &config).await,
        Commands::Add(args) => cli::add::handle_add(args, &config).await,
        Commands::Validate(args) => handle_validate(args).await,
    }
}

async fn handle_validate(args: cli::commands::ValidateArgs) -> Result<(), HuntsmanError> {
    let path = std::path::PathBuf::from(&args.config);
    let config = config::parse_config(&path).await?;
    let issues = config.validate();
    if issues.is_empty() {
        println!("Configuration is valid: {}", args.config);
        Ok(())
    } else {
        for issue in &issues {
            eprintln!("  - {issue}");
        }
        Err(HuntsmanError::Config(format!(
            "{} issue(s) in {}",
            issues.len(),
            args.config
        )))
    }
}
