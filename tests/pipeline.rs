use async_trait::async_trait;
use tempfile::TempDir;

use huntsman::aggregator::{RefreshParams, TargetAggregator};
use huntsman::config::{NotifyConfig, ScoringConfig};
use huntsman::discovery::{BountyFeed, BountyTarget, ProtocolTarget, TvlFeed};
use huntsman::dispatch::{AgentBackend, SessionOutput, SessionSummary};
use huntsman::errors::HuntsmanError;
use huntsman::harvest::SessionHarvester;
use huntsman::models::{Chain, Severity};
use huntsman::notify::FindingsNotifier;

const VAULT: &str = "0xdbdb4d16eda451d0503b854cf79d55697f90c8df";
const ROUTER: &str = "0x4200000000000000000000000000000000000006";

struct StubBountyFeed(Vec<BountyTarget>);

#[async_trait]
impl BountyFeed for StubBountyFeed {
    async fn get_targets(&self, min_bounty: u64) -> Vec<BountyTarget> {
        self.0
            .iter()
            .filter(|t| t.max_bounty >= min_bounty)
            .cloned()
            .collect()
    }
}

struct StubTvlFeed(Vec<ProtocolTarget>);

#[async_trait]
impl TvlFeed for StubTvlFeed {
    async fn get_top_overall(&self, limit: usize, _chains: &[Chain]) -> Vec<ProtocolTarget> {
        self.0.iter().take(limit).cloned().collect()
    }
}

struct StubBackend;

#[async_trait]
impl AgentBackend for StubBackend {
    async fn create_session(
        &self,
        _title: &str,
        _prompt: &str,
        _tags: &[String],
    ) -> Result<String, HuntsmanError> {
        Ok("sess-e2e".to_string())
    }

    async fn list_sessions(
        &self,
        _tags: &[String],
        _states: &[String],
    ) -> Result<Vec<SessionSummary>, HuntsmanError> {
        Ok(vec![SessionSummary {
            id: "sess-e2e".to_string(),
            state: "COMPLETED".to_string(),
            title: "Audit: Foo Vault".to_string(),
            created: None,
        }])
    }

    async fn session_output(&self, _session_id: &str) -> Result<SessionOutput, HuntsmanError> {
        Ok(SessionOutput {
            state: "COMPLETED".to_string(),
            title: "Audit: Foo Vault".to_string(),
            created: None,
            pr_url: Some("https://github.com/x/audits/pull/7".to_string()),
            activity_text: vec![format!(
                "# High: Reentrancy in withdraw()\n\
The vault at {VAULT} updates balances after the external call.\n\
Confidence: 90%"
            )],
        })
    }
}

fn bounty_target() -> BountyTarget {
    BountyTarget {
        program: "Foo".to_string(),
        address: VAULT.to_string(),
        chain: Chain::Ethereum,
        name: "Foo Vault".to_string(),
        max_bounty: 100_000,
        category: "defi".to_string(),
        url: "https://bounties.example/foo".to_string(),
        assets_in_scope: vec![VAULT.to_string()],
    }
}

fn protocol_target(address: &str, tvl: f64) -> ProtocolTarget {
    ProtocolTarget {
        name: "Foo Protocol".to_string(),
        slug: "foo".to_string(),
        tvl,
        chain: Chain::Ethereum,
        category: "Lending".to_string(),
        address: Some(address.to_string()),
        url: "https://foo.xyz".to_string(),
    }
}

fn params() -> RefreshParams {
    RefreshParams {
        min_bounty: 25_000,
        chains: vec![Chain::Ethereum, Chain::Base],
        limit: 100,
    }
}

/// Discovery refresh through batch selection through harvest and the
/// notification decision, end to end against stub collaborators.
#[tokio::test]
async fn test_discover_dispatch_harvest_notify_flow() {
    let dir = TempDir::new().unwrap();

    // Discover: one bounty record and one TVL record for the same vault,
    // plus an unrelated TVL-only router.
    let mut aggregator = TargetAggregator::open(dir.path(), ScoringConfig::default(), 50_000).unwrap();
    let bounty = StubBountyFeed(vec![bounty_target()]);
    let tvl = StubTvlFeed(vec![
        protocol_target(VAULT, 50_000_000.0),
        protocol_target(ROUTER, 20_000_000.0),
    ]);

    let summary = aggregator.refresh_all(&bounty, &tvl, &params()).await.unwrap();
    assert_eq!(summary.total_targets, 2);

    // Batch selection: the enriched vault outranks the TVL-only router.
    let batch = aggregator.get_batch(10, 7);
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].address, VAULT);
    assert_eq!(batch[0].program, "Foo");

    // Dispatch (stubbed) and mark scanned.
    let backend = StubBackend;
    let session_id = backend
        .create_session("Audit: Foo Vault", "prompt", &[])
        .await
        .unwrap();
    aggregator
        .mark_scanned(VAULT, Chain::Ethereum, Some(session_id))
        .unwrap();

    // The vault is now inside the recency window.
    let next_batch = aggregator.get_batch(10, 7);
    assert_eq!(next_batch.len(), 1);
    assert_eq!(next_batch[0].address, ROUTER);

    // Harvest the completed session.
    let harvester = SessionHarvester::new(&backend, dir.path());
    let results = harvester.harvest_completed(&["security-hunt".to_string()]).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].findings.len(), 1);

    let finding = &results[0].findings[0];
    assert_eq!(finding.severity, Severity::High);
    assert_eq!(finding.vuln_type, "reentrancy");
    assert_eq!(finding.confidence, 90);
    assert_eq!(finding.session_id.as_deref(), Some("sess-e2e"));

    // Notify: passes thresholds once, suppressed as duplicate after.
    let mut notifier = FindingsNotifier::open(NotifyConfig::default(), dir.path()).unwrap();
    let to_notify = notifier.process_results(&results).unwrap();
    assert_eq!(to_notify.len(), 1);
    assert!(to_notify[0].1.contains("Reentrancy") || to_notify[0].1.contains("reentrancy"));

    let again = notifier.process_results(&results).unwrap();
    assert!(again.is_empty());
}

/// Durable state written by one process generation is picked up by the next.
#[tokio::test]
async fn test_state_files_are_shared_across_generations() {
    let dir = TempDir::new().unwrap();

    {
        let mut aggregator =
            TargetAggregator::open(dir.path(), ScoringConfig::default(), 50_000).unwrap();
        let bounty = StubBountyFeed(vec![bounty_target()]);
        let tvl = StubTvlFeed(vec![]);
        aggregator.refresh_all(&bounty, &tvl, &params()).await.unwrap();
        aggregator
            .mark_scanned(VAULT, Chain::Ethereum, Some("sess-1".to_string()))
            .unwrap();
    }

    // Human-inspectable files exist where documented.
    assert!(dir.path().join("targets.json").exists());
    assert!(dir.path().join("scanned.json").exists());

    let aggregator = TargetAggregator::open(dir.path(), ScoringConfig::default(), 50_000).unwrap();
    let stats = aggregator.get_stats();
    assert_eq!(stats.total_targets, 1);
    assert_eq!(stats.scanned_count, 1);
    assert!(aggregator.get_unscanned(10, 7).is_empty());
}

/// Refreshing the same inputs twice changes nothing: no duplicate keys, no
/// score drift.
#[tokio::test]
async fn test_refresh_idempotence_across_generations() {
    let dir = TempDir::new().unwrap();
    let bounty = StubBountyFeed(vec![bounty_target()]);
    let tvl = StubTvlFeed(vec![protocol_target(VAULT, 50_000_000.0)]);

    let score_first = {
        let mut aggregator =
            TargetAggregator::open(dir.path(), ScoringConfig::default(), 50_000).unwrap();
        aggregator.refresh_all(&bounty, &tvl, &params()).await.unwrap();
        aggregator.get_unscanned(1, 7)[0].priority_score
    };

    let mut aggregator = TargetAggregator::open(dir.path(), ScoringConfig::default(), 50_000).unwrap();
    let summary = aggregator.refresh_all(&bounty, &tvl, &params()).await.unwrap();
    assert_eq!(summary.bounty_added, 0);
    assert_eq!(summary.tvl_added, 0);
    assert_eq!(summary.total_targets, 1);
    assert_eq!(aggregator.get_unscanned(1, 7)[0].priority_score, score_first);
}
