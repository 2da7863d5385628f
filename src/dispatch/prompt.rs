use crate::models::DispatchRecord;
use crate::utils::formatting::format_usd;

/// Build the audit prompt for a single target.
pub fn audit_prompt(record: &DispatchRecord) -> String {
    format!(
        "Perform a security audit of the smart contract below. Focus on \
exploitable issues: reentrancy, flash loan attacks, oracle manipulation, \
access control gaps, integer overflow, inflation attacks, and logic errors.\n\
\n\
Contract: {name}\n\
Address: {address}\n\
Chain: {chain}\n\
Bounty program: {program}\n\
Maximum payout: {bounty}\n\
\n\
For every issue found, report a markdown section headed by its severity \
(Critical, High, Medium, or Low), a description of the flaw, and a \
confidence percentage. Include proof-of-concept code where possible.",
        name = record.name,
        address = record.address,
        chain = record.chain,
        program = record.program,
        bounty = format_usd(record.max_bounty as f64),
    )
}

/// Build a combined prompt for a batch of targets, one numbered entry each.
/// Batching squeezes more audits out of a per-session quota.
pub fn batch_audit_prompt(records: &[DispatchRecord]) -> String {
    let mut listing = String::new();
    for (i, record) in records.iter().enumerate() {
        listing.push_str(&format!(
            "{n}. {name} ({chain}) - {address} - program: {program}, up to {bounty}\n",
            n = i + 1,
            name = record.name,
            chain = record.chain,
            address = record.address,
            program = record.program,
            bounty = format_usd(record.max_bounty as f64),
        ));
    }

    format!(
        "Perform security audits of the following {count} smart contracts. \
Audit each one independently and report findings per contract.\n\
\n\
{listing}\n\
For every issue found, report a markdown section headed by its severity \
(Critical, High, Medium, or Low), the affected contract address, a \
description, and a confidence percentage.",
        count = records.len(),
        listing = listing,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chain;

    fn record() -> DispatchRecord {
        DispatchRecord {
            address: "0xdbdb4d16eda451d0503b854cf79d55697f90c8df".to_string(),
            chain: Chain::Ethereum,
            name: "Foo Vault".to_string(),
            program: "Foo".to_string(),
            max_bounty: 100_000,
        }
    }

    #[test]
    fn test_audit_prompt_carries_target_identity() {
        let prompt = audit_prompt(&record());
        assert!(prompt.contains("0xdbdb4d16eda451d0503b854cf79d55697f90c8df"));
        assert!(prompt.contains("ethereum"));
        assert!(prompt.contains("$100,000"));
    }

    #[test]
    fn test_batch_prompt_numbers_entries() {
        let records = vec![record(), record()];
        let prompt = batch_audit_prompt(&records);
        assert!(prompt.contains("1. Foo Vault"));
        assert!(prompt.contains("2. Foo Vault"));
        assert!(prompt.contains("following 2 smart contracts"));
    }
}
