use console::style;

use super::commands::AddArgs;
use crate::aggregator::TargetAggregator;
use crate::config::HuntsmanConfig;
use crate::discovery::is_contract_address;
use crate::errors::HuntsmanError;
use crate::models::Chain;

pub async fn handle_add(args: AddArgs, config: &HuntsmanConfig) -> Result<(), HuntsmanError> {
    if !is_contract_address(&args.address) {
        return Err(HuntsmanError::InvalidTarget(format!(
            "'{}' is not a contract address",
            args.address
        )));
    }
    let chain = Chain::parse(&args.chain)
        .ok_or_else(|| HuntsmanError::InvalidTarget(format!("Unknown chain '{}'", args.chain)))?;

    let mut aggregator = TargetAggregator::open(
        &config.storage.data_dir,
        config.scoring.clone(),
        config.dispatch.default_bounty_estimate,
    )?;

    aggregator.add_manual_target(
        &args.address,
        chain,
        &args.name,
        args.program.clone(),
        args.max_bounty,
    )?;

    println!(
        "{} {} ({}) added to the pool.",
        style("✓").green().bold(),
        args.name,
        chain
    );
    Ok(())
}
