use console::style;
use tokio::sync::Semaphore;
use tracing::warn;

use super::commands::BatchArgs;
use crate::aggregator::TargetAggregator;
use crate::config::HuntsmanConfig;
use crate::dispatch::{audit_prompt, batch_audit_prompt, AgentBackend, HttpAgentBackend};
use crate::errors::HuntsmanError;
use crate::utils::formatting::{format_usd_compact, short_address};

pub async fn handle_batch(args: BatchArgs, config: &HuntsmanConfig) -> Result<(), HuntsmanError> {
    let size = args.size.unwrap_or(config.dispatch.batch_size);
    let days = args.days.unwrap_or(config.discovery.days_since_scan);

    let mut aggregator = TargetAggregator::open(
        &config.storage.data_dir,
        config.scoring.clone(),
        config.dispatch.default_bounty_estimate,
    )?;

    let batch = aggregator.get_batch(size, days);
    if batch.is_empty() {
        println!("No eligible targets.");
        return Ok(());
    }

    println!("{}", style(format!("Batch of {} targets:", batch.len())).bold());
    for record in &batch {
        println!(
            "  • {} ({}) {} - {} - up to {}",
            style(&record.name).green(),
            record.chain,
            short_address(&record.address),
            record.program,
            format_usd_compact(record.max_bounty as f64),
        );
    }

    if !args.dispatch {
        return Ok(());
    }

    let backend = HttpAgentBackend::new(config.dispatch.base_url.clone());
    let tags = &config.dispatch.tags;

    if args.combined {
        // One session auditing every target in the batch.
        let title = format!("Batch audit: {} targets", batch.len());
        let session_id = backend
            .create_session(&title, &batch_audit_prompt(&batch), tags)
            .await?;
        for record in &batch {
            aggregator.mark_scanned(&record.address, record.chain, Some(session_id.clone()))?;
        }
        println!("\nDispatched combined session {session_id} for {} targets.", batch.len());
        return Ok(());
    }

    let semaphore = Semaphore::new(config.dispatch.max_concurrent);

    // Dispatch concurrently under the semaphore, then serialize all pool
    // mutations behind the single writer.
    let dispatches = futures::future::join_all(batch.iter().map(|record| {
        let backend = &backend;
        let semaphore = &semaphore;
        async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|e| HuntsmanError::Internal(format!("Semaphore closed: {e}")))?;
            let title = format!("Audit: {} ({})", record.name, record.chain);
            let session_id = backend
                .create_session(&title, &audit_prompt(record), tags)
                .await?;
            Ok::<_, HuntsmanError>((record, session_id))
        }
    }))
    .await;

    let mut dispatched = 0;
    for result in dispatches {
        match result {
            Ok((record, session_id)) => {
                aggregator.mark_scanned(&record.address, record.chain, Some(session_id.clone()))?;
                println!("  dispatched {} → session {}", short_address(&record.address), session_id);
                dispatched += 1;
            }
            Err(e) => warn!(error = %e, "Dispatch failed for one target"),
        }
    }

    println!("\nDispatched {dispatched}/{} targets.", batch.len());
    Ok(())
}
