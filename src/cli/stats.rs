use console::style;
use serde_json::json;

use super::commands::StatsArgs;
use crate::aggregator::TargetAggregator;
use crate::config::HuntsmanConfig;
use crate::errors::HuntsmanError;
use crate::notify::FindingsNotifier;
use crate::utils::formatting::format_usd_compact;

pub async fn handle_stats(args: StatsArgs, config: &HuntsmanConfig) -> Result<(), HuntsmanError> {
    let aggregator = TargetAggregator::open(
        &config.storage.data_dir,
        config.scoring.clone(),
        config.dispatch.default_bounty_estimate,
    )?;
    let stats = aggregator.get_stats();

    let notifier = FindingsNotifier::open(config.notify.clone(), &config.storage.data_dir)?;
    let notifier_stats = notifier.stats();

    if args.json {
        let combined = json!({
            "aggregator": stats,
            "notifier": notifier_stats,
        });
        println!("{}", serde_json::to_string_pretty(&combined)?);
        return Ok(());
    }

    println!("{}", style("Target pool").bold());
    println!("  total targets:   {}", stats.total_targets);
    println!("  scanned:         {}", stats.scanned_count);
    println!("  with bounty:     {}", stats.with_bounty_program);
    println!("  bounty value:    {}", format_usd_compact(stats.total_bounty_value as f64));
    println!("  tracked TVL:     {}", format_usd_compact(stats.total_tvl));

    if !stats.by_chain.is_empty() {
        println!("\n{}", style("By chain").bold());
        for (chain, count) in &stats.by_chain {
            println!("  {chain:<12} {count}");
        }
    }

    if !stats.by_source.is_empty() {
        println!("\n{}", style("By source").bold());
        for (source, count) in &stats.by_source {
            println!("  {source:<12} {count}");
        }
    }

    println!("\n{}", style("Notifier").bold());
    println!("  notifications sent: {}", notifier_stats.total_sent);
    println!(
        "  thresholds: confidence ≥ {}, severity ≥ {}, dedupe {}h",
        notifier_stats.min_confidence, notifier_stats.min_severity, notifier_stats.dedupe_hours
    );

    Ok(())
}
