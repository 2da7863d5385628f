use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::ledger::SentLedger;
use crate::config::NotifyConfig;
use crate::errors::HuntsmanError;
use crate::models::{Finding, SessionResult, Severity};
use crate::utils::formatting::format_usd;

/// Dedup identity of a finding: contract address, vulnerability class, and
/// severity. Deliberately coarse: repeated mentions of the same bug class
/// on the same contract collapse into one notification, even when the
/// description text differs.
pub fn finding_hash(finding: &Finding) -> String {
    let key = format!(
        "{}:{}:{}",
        finding.contract_address, finding.vuln_type, finding.severity
    );
    let digest = Sha256::digest(key.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..12].to_string()
}

/// Filters findings down to the ones worth a notification: confident enough,
/// severe enough, and not a recent repeat.
pub struct FindingsNotifier {
    config: NotifyConfig,
    ledger: SentLedger,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotifierStats {
    pub total_sent: usize,
    pub min_confidence: u8,
    pub min_severity: Severity,
    pub dedupe_hours: i64,
}

impl FindingsNotifier {
    pub fn open(config: NotifyConfig, data_dir: &Path) -> Result<Self, HuntsmanError> {
        Ok(Self {
            ledger: SentLedger::open(&data_dir.join("notifier"))?,
            config,
        })
    }

    /// True iff the finding clears the confidence and severity thresholds
    /// and was not already notified within the dedupe window.
    pub fn should_notify(&self, finding: &Finding) -> bool {
        self.should_notify_at(finding, Utc::now())
    }

    pub fn should_notify_at(&self, finding: &Finding, now: DateTime<Utc>) -> bool {
        if finding.confidence < self.config.min_confidence {
            return false;
        }

        // "At or above" the minimum: equal-or-more-severe rank.
        if finding.severity.rank() > self.config.min_severity.rank() {
            return false;
        }

        if self
            .ledger
            .is_duplicate_at(&finding_hash(finding), now, self.config.dedupe_hours)
        {
            debug!(hash = %finding_hash(finding), "Suppressing duplicate finding");
            return false;
        }

        true
    }

    /// Mark a finding as notified. The ledger persists immediately; a later
    /// delivery failure does not roll this back (at-most-once delivery).
    pub fn mark_sent(&mut self, finding: &Finding) -> Result<(), HuntsmanError> {
        self.ledger.mark_sent_at(&finding_hash(finding), Utc::now())
    }

    /// Run every harvested finding through the notify decision, returning
    /// the ones to deliver alongside their formatted payloads. Passing
    /// findings are marked sent right away, not after delivery.
    pub fn process_results(
        &mut self,
        results: &[SessionResult],
    ) -> Result<Vec<(Finding, String)>, HuntsmanError> {
        let mut to_notify = Vec::new();

        for result in results {
            for finding in &result.findings {
                if self.should_notify(finding) {
                    let message = format_notification(finding);
                    self.mark_sent(finding)?;
                    to_notify.push((finding.clone(), message));
                }
            }
        }

        Ok(to_notify)
    }

    pub fn stats(&self) -> NotifierStats {
        NotifierStats {
            total_sent: self.ledger.len(),
            min_confidence: self.config.min_confidence,
            min_severity: self.config.min_severity,
            dedupe_hours: self.config.dedupe_hours,
        }
    }
}

/// Format a finding as a chat-ready notification message.
pub fn format_notification(finding: &Finding) -> String {
    let emoji = match finding.severity {
        Severity::Critical => "🚨",
        Severity::High => "⚠️",
        Severity::Medium => "📋",
        Severity::Low => "ℹ️",
    };

    let bounty_info = match finding.max_bounty {
        Some(bounty) if bounty > 0 => format!("\n💰 Bounty: up to {}", format_usd(bounty as f64)),
        _ => String::new(),
    };

    let pr_info = match &finding.pr_url {
        Some(url) => format!("\n🔗 PR: {url}"),
        None => String::new(),
    };

    let description: String = if finding.description.len() > 300 {
        let mut end = 300;
        while !finding.description.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &finding.description[..end])
    } else {
        finding.description.clone()
    };

    format!(
        "{emoji} **POTENTIAL VULNERABILITY FOUND**\n\n\
📍 **Contract:** {name}\n\
🔗 Address: `{address}`\n\
⛓️ Chain: {chain}\n\n\
🔍 **Type:** {vuln_type}\n\
⚡ **Severity:** {severity}\n\
📊 **Confidence:** {confidence}%\n\
{bounty_info}\n\n\
📝 **Description:**\n{description}\n\
{pr_info}\n\n\
⚡ **Action Required:** Manual review before submission",
        name = finding.contract_name,
        address = finding.contract_address,
        chain = finding.chain,
        vuln_type = finding.vuln_type,
        severity = finding.severity,
        confidence = finding.confidence,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn finding(severity: Severity, confidence: u8) -> Finding {
        Finding {
            contract_name: "Foo Vault".to_string(),
            contract_address: "0xdbdb4d16eda451d0503b854cf79d55697f90c8df".to_string(),
            chain: "ethereum".to_string(),
            vuln_type: "reentrancy".to_string(),
            severity,
            confidence,
            description: "State is updated after the external call.".to_string(),
            poc_code: None,
            bounty_program: Some("Foo".to_string()),
            max_bounty: Some(100_000),
            pr_url: None,
            session_id: None,
        }
    }

    fn notifier(dir: &std::path::Path) -> FindingsNotifier {
        FindingsNotifier::open(NotifyConfig::default(), dir).unwrap()
    }

    #[test]
    fn test_hash_ignores_description() {
        let a = finding(Severity::High, 90);
        let mut b = finding(Severity::High, 90);
        b.description = "Completely different wording.".to_string();
        assert_eq!(finding_hash(&a), finding_hash(&b));
    }

    #[test]
    fn test_hash_distinguishes_severity_and_type() {
        let a = finding(Severity::High, 90);
        let b = finding(Severity::Low, 90);
        assert_ne!(finding_hash(&a), finding_hash(&b));

        let mut c = finding(Severity::High, 90);
        c.vuln_type = "flash loan".to_string();
        assert_ne!(finding_hash(&a), finding_hash(&c));
    }

    #[test]
    fn test_confidence_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let n = notifier(dir.path());
        assert!(n.should_notify(&finding(Severity::High, 70)));
        assert!(!n.should_notify(&finding(Severity::High, 69)));
    }

    #[test]
    fn test_severity_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let n = notifier(dir.path());
        // min_severity defaults to Medium
        assert!(n.should_notify(&finding(Severity::Critical, 90)));
        assert!(n.should_notify(&finding(Severity::Medium, 90)));
        assert!(!n.should_notify(&finding(Severity::Low, 90)));
    }

    #[test]
    fn test_duplicate_suppressed_within_window_despite_different_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut n = notifier(dir.path());

        let first = finding(Severity::High, 90);
        assert!(n.should_notify(&first));
        n.mark_sent(&first).unwrap();

        let mut second = finding(Severity::High, 90);
        second.description = "Different description, same bug class.".to_string();
        assert!(!n.should_notify(&second));
    }

    #[test]
    fn test_duplicate_eligible_again_after_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut n = notifier(dir.path());

        let f = finding(Severity::High, 90);
        n.mark_sent(&f).unwrap();

        let now = Utc::now();
        assert!(!n.should_notify_at(&f, now + Duration::hours(24) - Duration::minutes(1)));
        assert!(n.should_notify_at(&f, now + Duration::hours(24) + Duration::minutes(1)));
    }

    #[test]
    fn test_process_results_marks_sent_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut n = notifier(dir.path());

        let result = SessionResult {
            session_id: "s1".to_string(),
            state: "COMPLETED".to_string(),
            title: String::new(),
            created: None,
            findings: vec![finding(Severity::High, 90), finding(Severity::High, 90)],
            pr_url: None,
            raw_output: None,
        };

        // Second identical finding in the same batch is already a duplicate.
        let to_notify = n.process_results(&[result]).unwrap();
        assert_eq!(to_notify.len(), 1);
        assert_eq!(n.stats().total_sent, 1);
    }

    #[test]
    fn test_format_notification_content() {
        let message = format_notification(&finding(Severity::Critical, 95));
        assert!(message.contains("🚨"));
        assert!(message.contains("Foo Vault"));
        assert!(message.contains("reentrancy"));
        assert!(message.contains("Critical"));
        assert!(message.contains("95%"));
        assert!(message.contains("$100,000"));
        assert!(message.contains("Manual review"));
    }
}
