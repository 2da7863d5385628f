use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity level for a finding, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Returns a numeric rank where lower values indicate higher severity.
    /// Critical = 0, High = 1, Medium = 2, Low = 3.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }

    pub fn parse(raw: &str) -> Option<Severity> {
        match raw.trim().to_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A potential vulnerability mention extracted from agent output.
///
/// Produced by best-effort text mining; unverified by construction. Findings
/// are transient: parsed, run through the notification decision, and archived
/// as a JSON snapshot only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub contract_name: String,
    pub contract_address: String,
    pub chain: String,
    pub vuln_type: String,
    pub severity: Severity,
    /// 0-100.
    pub confidence: u8,
    pub description: String,
    pub poc_code: Option<String>,
    pub bounty_program: Option<String>,
    pub max_bounty: Option<u64>,
    pub pr_url: Option<String>,
    pub session_id: Option<String>,
}

/// Harvested output of one completed agent session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    pub session_id: String,
    pub state: String,
    pub title: String,
    pub created: Option<DateTime<Utc>>,
    pub findings: Vec<Finding>,
    pub pr_url: Option<String>,
    /// Truncated raw activity dump kept for manual review.
    pub raw_output: Option<String>,
}
