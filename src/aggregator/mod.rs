pub mod priority;
pub mod store;

pub use priority::priority_score;
pub use store::TargetStore;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::ScoringConfig;
use crate::discovery::{BountyFeed, TvlFeed};
use crate::errors::HuntsmanError;
use crate::models::target::identity_key;
use crate::models::{Chain, DispatchRecord, ScanHistoryEntry, ScanTarget, TargetSource};

/// Outcome of a full discovery refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    pub bounty_added: usize,
    pub tvl_added: usize,
    pub total_targets: usize,
}

/// Aggregate pool statistics, computed in one pass with no side effects.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatorStats {
    pub total_targets: usize,
    pub scanned_count: usize,
    pub with_bounty_program: usize,
    pub total_bounty_value: u64,
    pub total_tvl: f64,
    pub by_chain: BTreeMap<String, usize>,
    pub by_source: BTreeMap<String, usize>,
}

/// Parameters for a discovery refresh, taken from the discovery config.
#[derive(Debug, Clone)]
pub struct RefreshParams {
    pub min_bounty: u64,
    pub chains: Vec<Chain>,
    pub limit: usize,
}

/// Merges candidates from all source feeds into a single identity-keyed pool,
/// keeps priority scores current, and tracks scan recency.
///
/// All mutating operations run behind a single writer (&mut self) and flush
/// durable state before returning; the merge-by-key logic is not idempotent
/// under interleaved partial updates.
pub struct TargetAggregator {
    store: TargetStore,
    scoring: ScoringConfig,
    default_bounty_estimate: u64,
}

impl TargetAggregator {
    pub fn open(
        data_dir: &Path,
        scoring: ScoringConfig,
        default_bounty_estimate: u64,
    ) -> Result<Self, HuntsmanError> {
        Ok(Self {
            store: TargetStore::open(data_dir)?,
            scoring,
            default_bounty_estimate,
        })
    }

    /// Merge bounty-feed candidates into the pool. Returns the number of
    /// brand-new targets. Does not persist; callers flush via `refresh_all`
    /// or explicitly.
    pub async fn refresh_bounty(&mut self, feed: &dyn BountyFeed, min_bounty: u64) -> usize {
        let candidates = feed.get_targets(min_bounty).await;
        let mut added = 0;

        for t in candidates {
            let key = identity_key(t.chain, &t.address);
            match self.store.pool.get_mut(&key) {
                Some(existing) => {
                    existing.max_bounty = existing.max_bounty.max(t.max_bounty);
                    existing.program = Some(t.program);
                    let (bounty, tvl, chain) =
                        (existing.max_bounty, existing.tvl, existing.chain);
                    existing.priority_score =
                        priority_score(&self.scoring, bounty, tvl, true, chain);
                }
                None => {
                    // TVL gets enriched by the TVL feed on a later merge.
                    let score = priority_score(&self.scoring, t.max_bounty, 0.0, true, t.chain);
                    self.store.pool.insert(
                        key,
                        ScanTarget {
                            address: t.address,
                            chain: t.chain,
                            name: t.name,
                            program: Some(t.program),
                            max_bounty: t.max_bounty,
                            tvl: 0.0,
                            priority_score: score,
                            source: TargetSource::BountyFeed,
                            category: t.category,
                            url: Some(t.url),
                            last_scanned: None,
                        },
                    );
                    added += 1;
                }
            }
        }

        info!(added, source = "bounty-feed", "Merged bounty candidates");
        added
    }

    /// Merge TVL-feed candidates into the pool. Candidates without a
    /// contract address are skipped. Returns the number of brand-new targets.
    pub async fn refresh_tvl(
        &mut self,
        feed: &dyn TvlFeed,
        limit: usize,
        chains: &[Chain],
    ) -> usize {
        let candidates = feed.get_top_overall(limit, chains).await;
        let mut added = 0;

        for t in candidates {
            let Some(address) = t.address else {
                continue;
            };

            let key = identity_key(t.chain, &address);
            match self.store.pool.get_mut(&key) {
                Some(existing) => {
                    // The TVL feed is the fresher source for TVL.
                    existing.tvl = t.tvl;
                    let (bounty, tvl, has_bounty, chain) = (
                        existing.max_bounty,
                        existing.tvl,
                        existing.program.is_some(),
                        existing.chain,
                    );
                    existing.priority_score =
                        priority_score(&self.scoring, bounty, tvl, has_bounty, chain);
                }
                None => {
                    let score = priority_score(&self.scoring, 0, t.tvl, false, t.chain);
                    self.store.pool.insert(
                        key,
                        ScanTarget {
                            address,
                            chain: t.chain,
                            name: t.name,
                            program: None,
                            max_bounty: 0,
                            tvl: t.tvl,
                            priority_score: score,
                            source: TargetSource::TvlFeed,
                            category: t.category,
                            url: Some(t.url),
                            last_scanned: None,
                        },
                    );
                    added += 1;
                }
            }
        }

        info!(added, source = "tvl-feed", "Merged TVL candidates");
        added
    }

    /// Refresh from all sources in a fixed order (bounty feed, then TVL
    /// feed), persisting pool and history exactly once at the end.
    pub async fn refresh_all(
        &mut self,
        bounty: &dyn BountyFeed,
        tvl: &dyn TvlFeed,
        params: &RefreshParams,
    ) -> Result<RefreshSummary, HuntsmanError> {
        let bounty_added = self.refresh_bounty(bounty, params.min_bounty).await;
        let tvl_added = self.refresh_tvl(tvl, params.limit, &params.chains).await;

        self.store.flush()?;

        Ok(RefreshSummary {
            bounty_added,
            tvl_added,
            total_targets: self.store.pool.len(),
        })
    }

    /// Unscanned targets in priority order: excludes anything scanned within
    /// the recency window, orders by descending priority score with the
    /// identity key as a deterministic tie-break, and returns at most
    /// `limit` entries.
    pub fn get_unscanned(&self, limit: usize, days_since_scan: i64) -> Vec<ScanTarget> {
        self.get_unscanned_at(Utc::now(), limit, days_since_scan)
    }

    pub fn get_unscanned_at(
        &self,
        now: DateTime<Utc>,
        limit: usize,
        days_since_scan: i64,
    ) -> Vec<ScanTarget> {
        let cutoff = now - Duration::days(days_since_scan);

        let mut unscanned: Vec<(&String, &ScanTarget)> = self
            .store
            .pool
            .iter()
            .filter(|(key, _)| match self.store.history.get(*key) {
                Some(entry) => entry.timestamp <= cutoff,
                None => true,
            })
            .collect();

        unscanned.sort_by(|(ka, a), (kb, b)| {
            b.priority_score
                .partial_cmp(&a.priority_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| ka.cmp(kb))
        });

        unscanned
            .into_iter()
            .take(limit)
            .map(|(_, t)| t.clone())
            .collect()
    }

    /// Project the next batch of unscanned targets into the minimal shape
    /// the dispatch backend needs. Read-only.
    pub fn get_batch(&self, batch_size: usize, days_since_scan: i64) -> Vec<DispatchRecord> {
        self.get_unscanned(batch_size, days_since_scan)
            .into_iter()
            .map(|t| DispatchRecord {
                address: t.address,
                chain: t.chain,
                name: t.name,
                program: t.program.unwrap_or_else(|| "Unknown".to_string()),
                max_bounty: if t.max_bounty > 0 {
                    t.max_bounty
                } else {
                    self.default_bounty_estimate
                },
            })
            .collect()
    }

    /// Record that a target was scanned now. Persists immediately.
    pub fn mark_scanned(
        &mut self,
        address: &str,
        chain: Chain,
        session_id: Option<String>,
    ) -> Result<(), HuntsmanError> {
        self.mark_scanned_at(address, chain, session_id, Utc::now())
    }

    pub fn mark_scanned_at(
        &mut self,
        address: &str,
        chain: Chain,
        session_id: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), HuntsmanError> {
        let key = identity_key(chain, address);

        self.store.history.insert(
            key.clone(),
            ScanHistoryEntry {
                timestamp: at,
                session_id,
            },
        );

        // History may reference targets that are no longer pooled; that is
        // fine, the entry still suppresses rescans if the target comes back.
        if let Some(target) = self.store.pool.get_mut(&key) {
            target.last_scanned = Some(at);
        }

        self.store.flush()
    }

    /// Insert or overwrite a manually supplied target. Persists immediately.
    pub fn add_manual_target(
        &mut self,
        address: &str,
        chain: Chain,
        name: &str,
        program: Option<String>,
        max_bounty: u64,
    ) -> Result<(), HuntsmanError> {
        let key = identity_key(chain, address);
        let score = priority_score(&self.scoring, max_bounty, 0.0, program.is_some(), chain);

        self.store.pool.insert(
            key,
            ScanTarget {
                address: address.to_string(),
                chain,
                name: name.to_string(),
                program,
                max_bounty,
                tvl: 0.0,
                priority_score: score,
                source: TargetSource::Manual,
                category: "manual".to_string(),
                url: None,
                last_scanned: None,
            },
        );

        self.store.flush()
    }

    pub fn get_stats(&self) -> AggregatorStats {
        let mut by_chain: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_source: BTreeMap<String, usize> = BTreeMap::new();
        let mut with_bounty_program = 0;
        let mut total_bounty_value: u64 = 0;
        let mut total_tvl = 0.0;

        for t in self.store.pool.values() {
            *by_chain.entry(t.chain.as_str().to_string()).or_default() += 1;
            *by_source.entry(t.source.as_str().to_string()).or_default() += 1;
            if t.program.is_some() {
                with_bounty_program += 1;
            }
            total_bounty_value += t.max_bounty;
            total_tvl += t.tvl;
        }

        AggregatorStats {
            total_targets: self.store.pool.len(),
            scanned_count: self.store.history.len(),
            with_bounty_program,
            total_bounty_value,
            total_tvl,
            by_chain,
            by_source,
        }
    }

    pub fn store(&self) -> &TargetStore {
        &self.store
    }
}
