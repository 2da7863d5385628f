use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::Severity;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HuntsmanConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root for all durable state: target pool, scan history, sent-notification
    /// ledger, provider caches, and harvested findings.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Drop bounty programs paying less than this (USD).
    pub min_bounty: u64,
    /// TVL floor for cross-chain protocol queries (USD).
    pub min_tvl: f64,
    /// TVL floor for per-chain protocol queries (USD).
    pub per_chain_min_tvl: f64,
    /// Chains considered during discovery.
    pub chains: Vec<String>,
    /// Max protocols pulled per TVL refresh.
    pub limit: usize,
    /// Recency window: targets scanned more recently than this many days are
    /// excluded from batch selection.
    pub days_since_scan: i64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_bounty: 25_000,
            min_tvl: 10_000_000.0,
            per_chain_min_tvl: 1_000_000.0,
            chains: vec![
                "ethereum".to_string(),
                "base".to_string(),
                "arbitrum".to_string(),
                "optimism".to_string(),
            ],
            limit: 100,
            days_since_scan: 7,
        }
    }
}

/// Priority scoring policy. The defaults are the hand-tuned production
/// values; all of them are overridable from the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub bounty_cap: f64,
    pub bounty_coefficient: f64,
    pub tvl_cap: f64,
    pub tvl_coefficient: f64,
    /// Flat bonus for having any formal disclosure channel, independent of
    /// the bounty amount.
    pub bounty_bonus: f64,
    /// Chain preference, ranked by assumed audit scarcity.
    pub chain_scores: BTreeMap<String, f64>,
    pub default_chain_score: f64,
    pub max_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let chain_scores = BTreeMap::from([
            ("ethereum".to_string(), 10.0),
            ("base".to_string(), 9.0),
            ("arbitrum".to_string(), 8.0),
            ("optimism".to_string(), 7.0),
            ("polygon".to_string(), 6.0),
            ("bsc".to_string(), 5.0),
        ]);
        Self {
            bounty_cap: 40.0,
            bounty_coefficient: 10.0,
            tvl_cap: 30.0,
            tvl_coefficient: 5.0,
            bounty_bonus: 20.0,
            chain_scores,
            default_chain_score: 3.0,
            max_score: 100.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Agent backend endpoint.
    pub base_url: String,
    /// Targets per dispatch batch.
    pub batch_size: usize,
    /// Bounty estimate used when a target has no known program payout.
    pub default_bounty_estimate: u64,
    /// Concurrent dispatches allowed against the backend.
    pub max_concurrent: usize,
    /// Tags stamped on every created session.
    pub tags: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8650".to_string(),
            batch_size: 10,
            default_bounty_estimate: 50_000,
            max_concurrent: 5,
            tags: vec!["security-hunt".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Minimum confidence (0-100) for a finding to be notifiable.
    pub min_confidence: u8,
    /// Minimum severity for a finding to be notifiable.
    pub min_severity: Severity,
    /// Window during which a repeated finding hash is suppressed.
    pub dedupe_hours: i64,
    /// Chat/webhook endpoint; findings go to stdout when unset.
    pub webhook_url: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            min_confidence: 70,
            min_severity: Severity::Medium,
            dedupe_hours: 24,
            webhook_url: None,
        }
    }
}

impl HuntsmanConfig {
    /// Validate configuration, returning a list of issues. Issues are
    /// advisory; the caller decides whether to proceed.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.discovery.chains.is_empty() {
            issues.push("discovery.chains is empty; no targets will be discovered".to_string());
        }
        for chain in &self.discovery.chains {
            if crate::models::Chain::parse(chain).is_none() {
                issues.push(format!("discovery.chains contains unknown chain '{chain}'"));
            }
        }
        if self.notify.min_confidence > 100 {
            issues.push("notify.min_confidence exceeds 100".to_string());
        }
        if self.notify.dedupe_hours <= 0 {
            issues.push("notify.dedupe_hours must be positive".to_string());
        }
        if self.dispatch.batch_size == 0 {
            issues.push("dispatch.batch_size must be at least 1".to_string());
        }
        if self.dispatch.max_concurrent == 0 {
            issues.push("dispatch.max_concurrent must be at least 1".to_string());
        }

        issues
    }
}
