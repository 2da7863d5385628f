pub mod bounty;
pub mod cache;
pub mod tvl;

pub use bounty::{BountyBoardFetcher, BountyFeed, BountyTarget};
pub use cache::ProviderCache;
pub use tvl::{ProtocolTarget, TvlFeed, TvlFetcher};

/// Syntactic check for an on-chain contract address: 0x prefix followed by
/// exactly 40 hex characters.
pub fn is_contract_address(raw: &str) -> bool {
    let raw = raw.trim();
    raw.len() == 42
        && raw.starts_with("0x")
        && raw[2..].bytes().all(|b| b.is_ascii_hexdigit())
}
