use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use super::commands::HarvestArgs;
use crate::config::HuntsmanConfig;
use crate::dispatch::{AgentBackend, HttpAgentBackend};
use crate::errors::HuntsmanError;
use crate::harvest::SessionHarvester;
use crate::notify::{FindingsNotifier, NotificationChannel, StdoutChannel, WebhookChannel};

pub async fn handle_harvest(
    args: HarvestArgs,
    config: &HuntsmanConfig,
) -> Result<(), HuntsmanError> {
    let backend = HttpAgentBackend::new(config.dispatch.base_url.clone());

    let sessions = match backend
        .list_sessions(&config.dispatch.tags, &["COMPLETED".to_string()])
        .await
    {
        Ok(sessions) => sessions,
        Err(e) => {
            warn!(error = %e, "Could not list completed sessions");
            Vec::new()
        }
    };

    if sessions.is_empty() {
        println!("No completed sessions.");
        return Ok(());
    }

    println!(
        "{}",
        style(format!("Harvesting {} completed sessions...", sessions.len())).cyan().bold()
    );

    let harvester = SessionHarvester::new(&backend, &config.storage.data_dir);
    let bar = ProgressBar::new(sessions.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut results = Vec::new();
    for session in &sessions {
        bar.set_message(session.id.clone());
        match harvester.harvest_session(&session.id).await {
            Ok(result) => results.push(result),
            Err(e) => warn!(session_id = %session.id, error = %e, "Harvest failed, skipping"),
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let total_findings: usize = results.iter().map(|r| r.findings.len()).sum();
    println!(
        "Harvested {} sessions, {} raw findings.",
        results.len(),
        total_findings
    );

    let mut notifier = FindingsNotifier::open(config.notify.clone(), &config.storage.data_dir)?;
    let to_notify = notifier.process_results(&results)?;

    if to_notify.is_empty() {
        println!("Nothing cleared the notification thresholds.");
        return Ok(());
    }

    let channel: Box<dyn NotificationChannel> = match (&config.notify.webhook_url, args.notify) {
        (Some(url), true) => Box::new(WebhookChannel::new(url.clone())),
        _ => Box::new(StdoutChannel),
    };

    let mut delivered = 0;
    for (finding, message) in &to_notify {
        match channel.send(message).await {
            Ok(()) => delivered += 1,
            // The dedup marking stands even when delivery fails: at-most-once.
            Err(e) => warn!(
                vuln_type = %finding.vuln_type,
                error = %e,
                "Notification delivery failed"
            ),
        }
    }

    println!(
        "{}",
        style(format!(
            "Notified on {delivered}/{} findings.",
            to_notify.len()
        ))
        .bold()
    );
    Ok(())
}
