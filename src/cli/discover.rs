use console::style;

use super::commands::DiscoverArgs;
use crate::aggregator::{RefreshParams, TargetAggregator};
use crate::config::HuntsmanConfig;
use crate::discovery::{BountyBoardFetcher, TvlFetcher};
use crate::errors::HuntsmanError;
use crate::models::Chain;
use crate::utils::formatting::{format_usd_compact, short_address};

pub async fn handle_discover(
    args: DiscoverArgs,
    config: &HuntsmanConfig,
) -> Result<(), HuntsmanError> {
    let disc = &config.discovery;
    let min_bounty = args.min_bounty.unwrap_or(disc.min_bounty);
    let min_tvl = args.min_tvl.unwrap_or(disc.min_tvl);
    let limit = args.limit.unwrap_or(disc.limit);
    let chains: Vec<Chain> = disc.chains.iter().filter_map(|c| Chain::parse(c)).collect();

    let cache_dir = config.storage.data_dir.join("cache");
    let bounty = BountyBoardFetcher::new(cache_dir.clone(), chains.clone());
    let tvl = TvlFetcher::new(cache_dir, min_tvl, disc.per_chain_min_tvl);

    let mut aggregator = TargetAggregator::open(
        &config.storage.data_dir,
        config.scoring.clone(),
        config.dispatch.default_bounty_estimate,
    )?;

    println!("{}", style("Refreshing target sources...").cyan().bold());
    let params = RefreshParams {
        min_bounty,
        chains,
        limit,
    };
    let summary = aggregator.refresh_all(&bounty, &tvl, &params).await?;

    println!("  bounty feed: {} new", summary.bounty_added);
    println!("  TVL feed:    {} new", summary.tvl_added);
    println!("  pool size:   {}", summary.total_targets);

    let top = aggregator.get_unscanned(args.top, disc.days_since_scan);
    if top.is_empty() {
        println!("\nNo unscanned targets.");
    } else {
        println!("\n{}", style(format!("Top {} unscanned targets:", top.len())).bold());
        for (i, t) in top.iter().enumerate() {
            let bounty_info = if t.max_bounty > 0 {
                format_usd_compact(t.max_bounty as f64)
            } else {
                "no bounty".to_string()
            };
            let tvl_info = if t.tvl > 0.0 {
                format!(" | {} TVL", format_usd_compact(t.tvl))
            } else {
                String::new()
            };
            println!(
                "{:>3}. [{:>6.2}] {} ({}) {} - {}{}",
                i + 1,
                t.priority_score,
                style(&t.name).green(),
                t.chain,
                short_address(&t.address),
                bounty_info,
                tvl_info,
            );
        }
    }

    if let Some(raw) = &args.chain {
        let chain = Chain::parse(raw)
            .ok_or_else(|| HuntsmanError::InvalidTarget(format!("Unknown chain '{raw}'")))?;

        let listing = tvl.top_by_chain(chain, args.top).await;
        println!("\n{}", style(format!("Top protocols on {chain}:")).bold());
        if listing.is_empty() {
            println!("  (none above the TVL floor)");
        }
        for (i, p) in listing.iter().enumerate() {
            println!(
                "{:>3}. {} - {} - {}",
                i + 1,
                style(&p.name).green(),
                format_usd_compact(p.tvl),
                p.address.as_deref().map(short_address).unwrap_or_else(|| "no address".to_string()),
            );
        }
    }

    Ok(())
}
