use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported blockchain networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Base,
    Arbitrum,
    Optimism,
    Polygon,
    Bsc,
    Avalanche,
    Fantom,
    Gnosis,
    Solana,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Base => "base",
            Self::Arbitrum => "arbitrum",
            Self::Optimism => "optimism",
            Self::Polygon => "polygon",
            Self::Bsc => "bsc",
            Self::Avalanche => "avalanche",
            Self::Fantom => "fantom",
            Self::Gnosis => "gnosis",
            Self::Solana => "solana",
        }
    }

    /// Parse a chain name, applying the provider synonym table
    /// ("eth"/"mainnet" for ethereum, "matic" for polygon, "binance" for bsc).
    /// Returns None for unrecognized names; the caller decides whether to
    /// default or drop.
    pub fn parse(raw: &str) -> Option<Chain> {
        match raw.trim().to_lowercase().as_str() {
            "ethereum" | "eth" | "mainnet" => Some(Self::Ethereum),
            "base" => Some(Self::Base),
            "arbitrum" => Some(Self::Arbitrum),
            "optimism" => Some(Self::Optimism),
            "polygon" | "matic" => Some(Self::Polygon),
            "bsc" | "binance" => Some(Self::Bsc),
            "avalanche" => Some(Self::Avalanche),
            "fantom" => Some(Self::Fantom),
            "gnosis" => Some(Self::Gnosis),
            "solana" => Some(Self::Solana),
            _ => None,
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a target record originally came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetSource {
    BountyFeed,
    TvlFeed,
    Manual,
}

impl TargetSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BountyFeed => "bounty-feed",
            Self::TvlFeed => "tvl-feed",
            Self::Manual => "manual",
        }
    }
}

/// A prioritized scan target.
///
/// Identity is `(chain, lowercased address)`; merging records with the same
/// key updates the existing entry in place and never creates a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanTarget {
    pub address: String,
    pub chain: Chain,
    pub name: String,
    /// Bug bounty program, if any.
    pub program: Option<String>,
    /// Maximum payout in USD, 0 if unknown.
    pub max_bounty: u64,
    /// TVL in USD, 0 if unknown.
    pub tvl: f64,
    /// Higher = scan first. Recomputed on every merge that touches
    /// bounty/TVL facts.
    pub priority_score: f64,
    pub source: TargetSource,
    pub category: String,
    pub url: Option<String>,
    /// Set only by the mark-scanned operation.
    pub last_scanned: Option<DateTime<Utc>>,
}

impl ScanTarget {
    pub fn key(&self) -> String {
        identity_key(self.chain, &self.address)
    }
}

/// The pool-wide identity key for a chain+address pair.
pub fn identity_key(chain: Chain, address: &str) -> String {
    format!("{}:{}", chain.as_str(), address.to_lowercase())
}

/// Minimal projection of a ScanTarget handed to the agent dispatch backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub address: String,
    pub chain: Chain,
    pub name: String,
    pub program: String,
    pub max_bounty: u64,
}
