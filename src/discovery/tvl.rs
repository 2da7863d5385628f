use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::cache::ProviderCache;
use super::is_contract_address;
use crate::errors::retry::{with_retry, RetryConfig};
use crate::errors::HuntsmanError;
use crate::models::Chain;

const TVL_API_URL: &str = "https://api.llama.fi";
const PROTOCOLS_CACHE: &str = "tvl_protocols.json";

/// Raw protocol record as the TVL provider ships it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProtocol {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// Bare address string, chain-prefixed list ("base:0x...,ethereum:0x..."),
    /// or a per-chain map. All three shapes occur in the wild.
    #[serde(default)]
    pub address: Option<Value>,
    pub tvl: Option<f64>,
    /// Per-chain TVL breakdown: { "Base": 1234.5, ... }
    #[serde(default)]
    pub chain_tvls: Option<Value>,
    #[serde(default)]
    pub chains: Option<Vec<String>>,
    pub category: Option<String>,
    pub url: Option<String>,
}

/// A normalized high-TVL protocol candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolTarget {
    pub name: String,
    pub slug: String,
    pub tvl: f64,
    pub chain: Chain,
    pub category: String,
    pub address: Option<String>,
    pub url: String,
}

/// Source of normalized TVL candidates.
#[async_trait]
pub trait TvlFeed: Send + Sync {
    async fn get_top_overall(&self, limit: usize, chains: &[Chain]) -> Vec<ProtocolTarget>;
}

/// Fetch top-TVL protocols from the TVL data provider.
///
/// Fail-soft like the bounty fetcher: cache fallback, then empty.
pub struct TvlFetcher {
    client: reqwest::Client,
    base_url: String,
    cache: ProviderCache,
    retry: RetryConfig,
    /// TVL floor for cross-chain queries (USD).
    min_tvl: f64,
    /// TVL floor for per-chain queries (USD), configured independently.
    per_chain_min_tvl: f64,
}

impl TvlFetcher {
    pub fn new(cache_dir: PathBuf, min_tvl: f64, per_chain_min_tvl: f64) -> Self {
        Self::with_base_url(cache_dir, min_tvl, per_chain_min_tvl, TVL_API_URL.to_string())
    }

    pub fn with_base_url(
        cache_dir: PathBuf,
        min_tvl: f64,
        per_chain_min_tvl: f64,
        base_url: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            cache: ProviderCache::new(cache_dir),
            retry: RetryConfig::default(),
            min_tvl,
            per_chain_min_tvl,
        }
    }

    /// Fetch all protocols as raw provider records.
    pub async fn fetch_protocols(&self) -> Vec<RawProtocol> {
        match with_retry("fetch_tvl_protocols", &self.retry, || self.fetch_remote()).await {
            Ok(protocols) => {
                info!(count = protocols.len(), "Fetched TVL protocols");
                self.cache.store(PROTOCOLS_CACHE, &protocols);
                protocols
            }
            Err(e) => {
                warn!(error = %e, "TVL provider unreachable, falling back to cache");
                self.cache.load(PROTOCOLS_CACHE).unwrap_or_default()
            }
        }
    }

    async fn fetch_remote(&self) -> Result<Vec<RawProtocol>, HuntsmanError> {
        let resp = self
            .client
            .get(format!("{}/protocols", self.base_url))
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| HuntsmanError::Network(format!("TVL provider request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HuntsmanError::Provider(format!("TVL provider returned HTTP {status}")));
        }

        resp.json()
            .await
            .map_err(|e| HuntsmanError::Provider(format!("TVL provider response is not JSON: {e}")))
    }

    /// Top protocols by total TVL across the requested chains. A protocol's
    /// primary chain is its first chain matching the request; protocols on
    /// none of the requested chains are dropped.
    pub async fn top_overall(&self, limit: usize, chains: &[Chain]) -> Vec<ProtocolTarget> {
        let protocols = self.fetch_protocols().await;
        let mut targets = Vec::new();

        for p in &protocols {
            let total_tvl = p.tvl.unwrap_or(0.0);
            if total_tvl < self.min_tvl {
                continue;
            }

            // Unrecognized chain names are dropped here, not defaulted.
            let protocol_chains: Vec<Chain> = p
                .chains
                .as_deref()
                .unwrap_or(&[])
                .iter()
                .filter_map(|c| Chain::parse(c))
                .collect();

            let Some(primary) = protocol_chains.iter().find(|c| chains.contains(*c)).copied()
            else {
                continue;
            };

            targets.push(normalize_protocol(p, primary, total_tvl));
        }

        targets.sort_by(|a, b| b.tvl.partial_cmp(&a.tvl).unwrap_or(std::cmp::Ordering::Equal));
        targets.truncate(limit);
        targets
    }

    /// Top protocols by TVL on one specific chain, using the per-chain TVL
    /// breakdown and the per-chain floor.
    pub async fn top_by_chain(&self, chain: Chain, limit: usize) -> Vec<ProtocolTarget> {
        let protocols = self.fetch_protocols().await;
        let mut targets = Vec::new();

        for p in &protocols {
            let on_chain = p
                .chains
                .as_deref()
                .unwrap_or(&[])
                .iter()
                .any(|c| Chain::parse(c) == Some(chain));
            if !on_chain {
                continue;
            }

            let tvl = p
                .chain_tvls
                .as_ref()
                .map(|v| chain_tvl(v, chain))
                .unwrap_or(0.0);
            if tvl < self.per_chain_min_tvl {
                continue;
            }

            targets.push(normalize_protocol(p, chain, tvl));
        }

        targets.sort_by(|a, b| b.tvl.partial_cmp(&a.tvl).unwrap_or(std::cmp::Ordering::Equal));
        targets.truncate(limit);
        targets
    }
}

#[async_trait]
impl TvlFeed for TvlFetcher {
    async fn get_top_overall(&self, limit: usize, chains: &[Chain]) -> Vec<ProtocolTarget> {
        self.top_overall(limit, chains).await
    }
}

fn normalize_protocol(p: &RawProtocol, chain: Chain, tvl: f64) -> ProtocolTarget {
    ProtocolTarget {
        name: p.name.clone().unwrap_or_else(|| "Unknown".to_string()),
        slug: p.slug.clone().unwrap_or_default(),
        tvl,
        chain,
        category: p.category.clone().unwrap_or_default(),
        address: p.address.as_ref().and_then(|a| extract_address(a, chain)),
        url: p.url.clone().unwrap_or_default(),
    }
}

/// Pull a contract address for the given chain out of the provider's address
/// field, whatever shape it arrived in.
fn extract_address(value: &Value, chain: Chain) -> Option<String> {
    match value {
        Value::String(raw) => {
            let raw = raw.trim();
            if is_contract_address(raw) {
                return Some(raw.to_string());
            }
            // Chain-prefixed list: "base:0xabc...,ethereum:0xdef..."
            for segment in raw.split(',') {
                if let Some((prefix, addr)) = segment.trim().split_once(':') {
                    if Chain::parse(prefix) == Some(chain) && is_contract_address(addr.trim()) {
                        return Some(addr.trim().to_string());
                    }
                }
            }
            None
        }
        Value::Object(map) => map
            .get(chain.as_str())
            .and_then(|v| v.as_str())
            .filter(|s| is_contract_address(s))
            .map(str::to_string),
        _ => None,
    }
}

/// Per-chain TVL lookup, tolerant of the provider's casing ("Base" vs "base").
fn chain_tvl(chain_tvls: &Value, chain: Chain) -> f64 {
    if let Some(v) = chain_tvls.get(chain.as_str()).and_then(|v| v.as_f64()) {
        return v;
    }
    if let Some(obj) = chain_tvls.as_object() {
        for (k, v) in obj {
            if k.eq_ignore_ascii_case(chain.as_str()) {
                if let Some(f) = v.as_f64() {
                    return f;
                }
            }
        }
    }
    0.0
}
