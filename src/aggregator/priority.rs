use crate::config::ScoringConfig;
use crate::models::Chain;

/// Compute the priority score for a target. Pure function of the target's
/// bounty, TVL, disclosure-channel flag, and chain; deterministic, capped at
/// the configured maximum and rounded to 2 decimal places.
///
/// With the default policy:
/// - bounty, log scale: $10k=10, $100k=20, $1M=30, $10M=40 (cap)
/// - TVL, log scale: $1M=10, $10M=15, $100M=20, $1B=25, $10B=30 (cap)
/// - +20 flat for having any bounty program at all
/// - chain preference up to 10, less-audited chains ranked higher
pub fn priority_score(
    cfg: &ScoringConfig,
    max_bounty: u64,
    tvl: f64,
    has_bounty: bool,
    chain: Chain,
) -> f64 {
    let mut score = 0.0;

    if max_bounty > 0 {
        let component = cfg.bounty_coefficient * (max_bounty as f64 / 1_000.0 + 1.0).log10();
        score += component.min(cfg.bounty_cap);
    }

    if tvl > 0.0 {
        let component = cfg.tvl_coefficient * (tvl / 100_000.0 + 1.0).log10();
        score += component.min(cfg.tvl_cap);
    }

    if has_bounty {
        score += cfg.bounty_bonus;
    }

    score += cfg
        .chain_scores
        .get(chain.as_str())
        .copied()
        .unwrap_or(cfg.default_chain_score);

    (score.min(cfg.max_score) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ScoringConfig {
        ScoringConfig::default()
    }

    #[test]
    fn test_score_is_deterministic_and_rounded() {
        let a = priority_score(&cfg(), 100_000, 50_000_000.0, true, Chain::Ethereum);
        let b = priority_score(&cfg(), 100_000, 50_000_000.0, true, Chain::Ethereum);
        assert_eq!(a, b);
        assert_eq!((a * 100.0).round() / 100.0, a);
    }

    #[test]
    fn test_bounty_monotonicity() {
        let mut prev = 0.0;
        for bounty in [0u64, 10_000, 100_000, 1_000_000, 10_000_000] {
            let score = priority_score(&cfg(), bounty, 0.0, true, Chain::Ethereum);
            assert!(score >= prev, "score decreased at bounty {bounty}");
            prev = score;
        }
    }

    #[test]
    fn test_tvl_monotonicity() {
        let mut prev = 0.0;
        for tvl in [0.0, 1e6, 1e7, 1e8, 1e9] {
            let score = priority_score(&cfg(), 0, tvl, false, Chain::Base);
            assert!(score >= prev, "score decreased at tvl {tvl}");
            prev = score;
        }
    }

    #[test]
    fn test_bounty_component_is_capped() {
        // Both are far past the $10M log ceiling, so the cap makes them equal.
        let ten_billion = priority_score(&cfg(), 10_000_000_000, 0.0, false, Chain::Ethereum);
        let one_trillion = priority_score(&cfg(), 1_000_000_000_000, 0.0, false, Chain::Ethereum);
        assert_eq!(ten_billion, one_trillion);
        // 40 bounty cap + 10 ethereum
        assert_eq!(ten_billion, 50.0);
    }

    #[test]
    fn test_tvl_component_is_capped() {
        let huge = priority_score(&cfg(), 0, 1e13, false, Chain::Ethereum);
        let huger = priority_score(&cfg(), 0, 1e15, false, Chain::Ethereum);
        assert_eq!(huge, huger);
        // 30 TVL cap + 10 ethereum
        assert_eq!(huge, 40.0);
    }

    #[test]
    fn test_bounty_bonus_is_flat() {
        let without = priority_score(&cfg(), 0, 0.0, false, Chain::Bsc);
        let with = priority_score(&cfg(), 0, 0.0, true, Chain::Bsc);
        assert_eq!(with - without, 20.0);
    }

    #[test]
    fn test_chain_preference_table() {
        assert_eq!(priority_score(&cfg(), 0, 0.0, false, Chain::Ethereum), 10.0);
        assert_eq!(priority_score(&cfg(), 0, 0.0, false, Chain::Base), 9.0);
        assert_eq!(priority_score(&cfg(), 0, 0.0, false, Chain::Arbitrum), 8.0);
        assert_eq!(priority_score(&cfg(), 0, 0.0, false, Chain::Optimism), 7.0);
        assert_eq!(priority_score(&cfg(), 0, 0.0, false, Chain::Polygon), 6.0);
        assert_eq!(priority_score(&cfg(), 0, 0.0, false, Chain::Bsc), 5.0);
        // Unlisted chains get the low default
        assert_eq!(priority_score(&cfg(), 0, 0.0, false, Chain::Solana), 3.0);
    }

    #[test]
    fn test_known_reference_points() {
        // $10k bounty alone: 10 * log10(11) ~= 10.41
        let score = priority_score(&cfg(), 10_000, 0.0, false, Chain::Solana);
        assert_eq!(score, 13.41); // 10.41 + 3 chain default
    }
}
