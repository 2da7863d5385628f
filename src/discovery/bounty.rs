use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::cache::ProviderCache;
use super::is_contract_address;
use crate::errors::retry::{with_retry, RetryConfig};
use crate::errors::HuntsmanError;
use crate::models::Chain;

const BOUNTY_BOARD_URL: &str = "https://immunefi.com";
const PROGRAMS_CACHE: &str = "bounty_programs.json";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; Huntsman/1.0)";

/// Parse floor: programs below this payout are not worth carrying at all,
/// independent of the caller's own minimum.
const PARSE_FLOOR_USD: u64 = 10_000;

/// Chain keywords searched, in order, when an asset has no usable chain
/// field. First hit wins.
const CHAIN_KEYWORDS: &[&str] = &[
    "ethereum", "eth", "mainnet", "polygon", "matic", "arbitrum", "optimism",
    "base", "bsc", "binance", "avalanche", "fantom", "gnosis", "solana",
];

/// A normalized bug bounty target candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BountyTarget {
    pub program: String,
    pub address: String,
    pub chain: Chain,
    pub name: String,
    pub max_bounty: u64,
    pub category: String,
    pub url: String,
    /// Everything the program lists in scope, including repository links.
    /// Only syntactically valid addresses become targets; the rest is
    /// provenance.
    pub assets_in_scope: Vec<String>,
}

/// Source of normalized bounty candidates. Implemented by the live fetcher
/// and by stub feeds in tests.
#[async_trait]
pub trait BountyFeed: Send + Sync {
    async fn get_targets(&self, min_bounty: u64) -> Vec<BountyTarget>;
}

#[derive(Debug, Clone)]
struct AssetRef {
    target: String,
    chain: Option<Chain>,
    name: String,
    is_repo: bool,
}

#[derive(Debug, Clone)]
struct ParsedProgram {
    program: String,
    max_bounty: u64,
    url: String,
    category: String,
    assets: Vec<AssetRef>,
}

/// Fetch active bug bounty programs from the bounty board.
///
/// The program list is embedded in the page as a `__NEXT_DATA__` script
/// payload rather than served from a stable API, so fetching scrapes that
/// blob out of the HTML. Fail-soft: network or parse trouble falls back to
/// the last cached payload, then to an empty list.
pub struct BountyBoardFetcher {
    client: reqwest::Client,
    base_url: String,
    cache: ProviderCache,
    retry: RetryConfig,
    chains: Vec<Chain>,
}

impl BountyBoardFetcher {
    pub fn new(cache_dir: PathBuf, chains: Vec<Chain>) -> Self {
        Self::with_base_url(cache_dir, chains, BOUNTY_BOARD_URL.to_string())
    }

    pub fn with_base_url(cache_dir: PathBuf, chains: Vec<Chain>, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            cache: ProviderCache::new(cache_dir),
            retry: RetryConfig::default(),
            chains,
        }
    }

    /// Fetch all active bounty programs as raw provider records.
    pub async fn fetch_programs(&self) -> Vec<Value> {
        match with_retry("fetch_bounty_programs", &self.retry, || self.fetch_remote()).await {
            Ok(programs) => {
                info!(count = programs.len(), "Fetched bounty programs");
                self.cache.store(PROGRAMS_CACHE, &programs);
                programs
            }
            Err(e) => {
                warn!(error = %e, "Bounty board unreachable, falling back to cache");
                self.cache.load(PROGRAMS_CACHE).unwrap_or_default()
            }
        }
    }

    async fn fetch_remote(&self) -> Result<Vec<Value>, HuntsmanError> {
        let resp = self
            .client
            .get(format!("{}/bounty/", self.base_url))
            .header("User-Agent", USER_AGENT)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| HuntsmanError::Network(format!("Bounty board request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HuntsmanError::Provider(format!("Bounty board returned HTTP {status}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| HuntsmanError::Network(format!("Failed to read bounty page: {e}")))?;

        extract_embedded_programs(&body)
    }

    /// Get all normalized targets meeting the payout floor, restricted to the
    /// fetcher's configured chains.
    pub async fn targets(&self, min_bounty: u64) -> Vec<BountyTarget> {
        let programs = self.fetch_programs().await;
        let mut targets = Vec::new();

        for raw in programs {
            let Some(parsed) = parse_program(&raw, &self.base_url) else {
                continue;
            };
            if parsed.max_bounty < min_bounty {
                continue;
            }

            let assets_in_scope: Vec<String> =
                parsed.assets.iter().map(|a| a.target.clone()).collect();

            for asset in &parsed.assets {
                if asset.is_repo {
                    continue;
                }
                let chain = asset.chain.unwrap_or(Chain::Ethereum);
                if !self.chains.contains(&chain) {
                    continue;
                }
                targets.push(BountyTarget {
                    program: parsed.program.clone(),
                    address: asset.target.clone(),
                    chain,
                    name: asset.name.clone(),
                    max_bounty: parsed.max_bounty,
                    category: parsed.category.clone(),
                    url: parsed.url.clone(),
                    assets_in_scope: assets_in_scope.clone(),
                });
            }
        }

        targets
    }
}

#[async_trait]
impl BountyFeed for BountyBoardFetcher {
    async fn get_targets(&self, min_bounty: u64) -> Vec<BountyTarget> {
        self.targets(min_bounty).await
    }
}

/// Pull the program list out of the page's `__NEXT_DATA__` script blob.
fn extract_embedded_programs(html: &str) -> Result<Vec<Value>, HuntsmanError> {
    let re = Regex::new(r#"(?s)<script id="__NEXT_DATA__"[^>]*>(.*?)</script>"#).unwrap();
    let blob = re
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| HuntsmanError::Provider("No embedded program data in bounty page".into()))?;

    let data: Value = serde_json::from_str(blob.as_str())
        .map_err(|e| HuntsmanError::Provider(format!("Embedded program data is not JSON: {e}")))?;

    match data["props"]["pageProps"]["bounties"].as_array() {
        Some(bounties) => Ok(bounties.clone()),
        None => Err(HuntsmanError::Provider("Embedded data has no bounty list".into())),
    }
}

/// Parse one raw program record. Returns None for records that are skipped:
/// payout below the parse floor, or no in-scope assets worth tracking.
/// A malformed record never aborts the batch.
fn parse_program(raw: &Value, base_url: &str) -> Option<ParsedProgram> {
    let program = raw["project"].as_str().unwrap_or("Unknown").to_string();
    let max_bounty = raw["maxBounty"].as_u64().unwrap_or(0);

    if max_bounty < PARSE_FLOOR_USD {
        return None;
    }

    let mut assets = Vec::new();
    if let Some(scope) = raw["assetsInScope"].as_array() {
        for asset in scope {
            let target = asset["target"].as_str().unwrap_or("").trim().to_string();
            let asset_type = asset["type"].as_str().unwrap_or("").to_lowercase();

            if !matches!(asset_type.as_str(), "smart_contract" | "smart contract" | "contract") {
                continue;
            }

            let name = asset["name"].as_str().unwrap_or(&program).to_string();

            if is_contract_address(&target) {
                assets.push(AssetRef {
                    target,
                    chain: Some(detect_chain(asset)),
                    name,
                    is_repo: false,
                });
            } else if target.to_lowercase().contains("github.com") {
                // Repository links stay in provenance but never become targets.
                assets.push(AssetRef {
                    target,
                    chain: None,
                    name,
                    is_repo: true,
                });
            }
        }
    }

    if assets.is_empty() {
        debug!(program = %program, "Skipping program with no in-scope contract assets");
        return None;
    }

    let slug = raw["id"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| program.to_lowercase().replace(' ', "-"));

    Some(ParsedProgram {
        url: format!("{base_url}/bug-bounty/{slug}/"),
        category: raw["category"].as_str().unwrap_or("defi").to_string(),
        program,
        max_bounty,
        assets,
    })
}

/// Detect the blockchain for an asset: explicit chain field first, then
/// keyword search across name and description, defaulting to ethereum.
fn detect_chain(asset: &Value) -> Chain {
    if let Some(chain) = asset["chain"].as_str().and_then(Chain::parse) {
        return chain;
    }

    let haystack = format!(
        "{} {}",
        asset["name"].as_str().unwrap_or(""),
        asset["description"].as_str().unwrap_or("")
    )
    .to_lowercase();

    for keyword in CHAIN_KEYWORDS {
        if haystack.contains(keyword) {
            if let Some(chain) = Chain::parse(keyword) {
                return chain;
            }
        }
    }

    Chain::Ethereum
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_program() -> Value {
        json!({
            "project": "Foo Protocol",
            "maxBounty": 100_000,
            "id": "foo-protocol",
            "category": "lending",
            "assetsInScope": [
                {
                    "type": "smart_contract",
                    "target": "0xdbdb4d16eda451d0503b854cf79d55697f90c8df",
                    "name": "Foo Vault",
                    "chain": "eth"
                },
                {
                    "type": "smart_contract",
                    "target": "https://github.com/foo/contracts",
                    "name": "Foo Contracts"
                },
                {
                    "type": "websites_and_applications",
                    "target": "https://app.foo.xyz",
                    "name": "Foo App"
                }
            ]
        })
    }

    #[test]
    fn test_parse_program_extracts_contract_assets() {
        let parsed = parse_program(&sample_program(), BOUNTY_BOARD_URL).unwrap();
        assert_eq!(parsed.program, "Foo Protocol");
        assert_eq!(parsed.max_bounty, 100_000);
        assert_eq!(parsed.assets.len(), 2);

        let addr = &parsed.assets[0];
        assert!(!addr.is_repo);
        assert_eq!(addr.chain, Some(Chain::Ethereum));

        let repo = &parsed.assets[1];
        assert!(repo.is_repo);
        assert_eq!(repo.chain, None);
    }

    #[test]
    fn test_parse_program_skips_low_payout() {
        let raw = json!({"project": "Dust", "maxBounty": 5_000, "assetsInScope": []});
        assert!(parse_program(&raw, BOUNTY_BOARD_URL).is_none());
    }

    #[test]
    fn test_parse_program_skips_programs_without_assets() {
        let raw = json!({"project": "NoScope", "maxBounty": 50_000, "assetsInScope": []});
        assert!(parse_program(&raw, BOUNTY_BOARD_URL).is_none());
    }

    #[test]
    fn test_detect_chain_from_keyword_in_name() {
        let asset = json!({"name": "Vault on Arbitrum", "description": ""});
        assert_eq!(detect_chain(&asset), Chain::Arbitrum);
    }

    #[test]
    fn test_detect_chain_defaults_to_ethereum() {
        let asset = json!({"name": "Vault", "description": "core contracts"});
        assert_eq!(detect_chain(&asset), Chain::Ethereum);
    }

    #[test]
    fn test_extract_embedded_programs() {
        let html = format!(
            "<html><script id=\"__NEXT_DATA__\" type=\"application/json\">{}</script></html>",
            json!({"props": {"pageProps": {"bounties": [sample_program()]}}})
        );
        let programs = extract_embedded_programs(&html).unwrap();
        assert_eq!(programs.len(), 1);
    }

    #[test]
    fn test_extract_embedded_programs_missing_blob() {
        assert!(extract_embedded_programs("<html></html>").is_err());
    }

    #[tokio::test]
    async fn test_targets_filters_by_min_bounty_and_chain() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProviderCache::new(dir.path().to_path_buf());
        cache.store(PROGRAMS_CACHE, &vec![sample_program()]);

        // Backend URL points nowhere; fetch falls back to the seeded cache.
        let mut fetcher = BountyBoardFetcher::with_base_url(
            dir.path().to_path_buf(),
            vec![Chain::Ethereum, Chain::Base],
            "http://127.0.0.1:9".to_string(),
        );
        fetcher.retry = RetryConfig { max_retries: 0 };

        let targets = fetcher.get_targets(50_000).await;
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].chain, Chain::Ethereum);
        assert_eq!(targets[0].program, "Foo Protocol");
        // Repo link is provenance only
        assert_eq!(targets[0].assets_in_scope.len(), 2);

        let none = fetcher.get_targets(250_000).await;
        assert!(none.is_empty());
    }
}
