use console::style;

use super::commands::AnalyzeArgs;
use crate::aggregator::TargetAggregator;
use crate::config::HuntsmanConfig;
use crate::discovery::is_contract_address;
use crate::dispatch::{audit_prompt, AgentBackend, HttpAgentBackend};
use crate::errors::HuntsmanError;
use crate::models::target::identity_key;
use crate::models::{Chain, DispatchRecord};

pub async fn handle_analyze(
    args: AnalyzeArgs,
    config: &HuntsmanConfig,
) -> Result<(), HuntsmanError> {
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

    // Reuse pooled facts when the target is already tracked.
    let key = identity_key(chain, &args.address);
    let record = match aggregator.store().pool().get(&key) {
        Some(t) => DispatchRecord {
            address: t.address.clone(),
            chain: t.chain,
            name: args.name.clone().unwrap_or_else(|| t.name.clone()),
            program: t.program.clone().unwrap_or_else(|| "Unknown".to_string()),
            max_bounty: if t.max_bounty > 0 {
                t.max_bounty
            } else {
                config.dispatch.default_bounty_estimate
            },
        },
        None => DispatchRecord {
            address: args.address.clone(),
            chain,
            name: args.name.clone().unwrap_or_else(|| "Manual target".to_string()),
            program: "Unknown".to_string(),
            max_bounty: config.dispatch.default_bounty_estimate,
        },
    };

    println!(
        "{} {} on {}",
        style("Dispatching audit for").cyan().bold(),
        record.name,
        record.chain
    );

    let backend = HttpAgentBackend::new(config.dispatch.base_url.clone());
    let title = format!("Audit: {} ({})", record.name, record.chain);
    let session_id = backend
        .create_session(&title, &audit_prompt(&record), &config.dispatch.tags)
        .await?;

    aggregator.mark_scanned(&args.address, chain, Some(session_id.clone()))?;

    println!("Session {session_id} created.");
    Ok(())
}
