//! Best-effort text mining for vulnerability mentions.
//!
//! Agent output is free-form markdown at best. The matchers below segment it
//! into candidate findings by severity markers and guess a vulnerability
//! class from keywords. This is lossy by construction: false negatives and
//! false positives are expected, and downstream consumers treat every
//! extracted finding as unverified.

use regex::Regex;

use crate::models::{Finding, Severity};

/// Keyword sets for guessing a vulnerability class. First matching category
/// wins.
const VULN_KEYWORDS: &[(&str, &[&str])] = &[
    ("reentrancy", &["reentrancy", "reentrant", "re-entrancy"]),
    ("flash loan", &["flash loan", "flashloan", "flash-loan"]),
    ("oracle manipulation", &["oracle", "price manipulation"]),
    ("access control", &["access control", "unauthorized", "permission"]),
    ("integer overflow", &["overflow", "underflow", "integer"]),
    ("inflation attack", &["inflation", "first depositor", "donation"]),
    ("front-running", &["front-run", "frontrun", "mev", "sandwich"]),
    ("logic error", &["logic", "edge case", "off-by-one"]),
];

const DEFAULT_CONFIDENCE: u8 = 70;
const MAX_DESCRIPTION_LEN: usize = 500;

/// Extract candidate findings from free text.
///
/// Three matchers run in order: markdown headings carrying a severity word
/// (the following section becomes the description), explicit "Severity: X"
/// labels, and bold-emphasized severity words. A trailing
/// "confidence: N%" marker overrides the confidence of the most recently
/// parsed finding only.
pub fn parse_findings(text: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    findings.extend(parse_heading_findings(text));
    findings.extend(parse_labeled_findings(text));
    findings.extend(parse_bold_findings(text));

    // Explicit confidence scores apply to the last finding seen before them;
    // with a single marker that collapses to "the most recent finding".
    let conf_re = Regex::new(r"(?i)confidence[:\s]*(\d+)%?").unwrap();
    if let Some(cap) = conf_re.captures(text) {
        if let Some(last) = findings.last_mut() {
            if let Ok(value) = cap[1].parse::<u8>() {
                last.confidence = value.min(100);
            }
        }
    }

    findings
}

/// Markdown headings: `## High: reentrancy in withdraw()`; everything up to
/// the next heading is the description.
fn parse_heading_findings(text: &str) -> Vec<Finding> {
    let re = Regex::new(r"(?mi)^#{1,6}[ \t]*(critical|high|medium|low)\b[:\s]*").unwrap();

    let matches: Vec<(usize, usize, Severity)> = re
        .captures_iter(text)
        .filter_map(|cap| {
            let m = cap.get(0)?;
            let severity = Severity::parse(&cap[1])?;
            Some((m.start(), m.end(), severity))
        })
        .collect();

    matches
        .iter()
        .enumerate()
        .map(|(i, (_, body_start, severity))| {
            let body_end = matches
                .get(i + 1)
                .map(|(next_start, _, _)| *next_start)
                .unwrap_or(text.len());
            let desc = text[*body_start..body_end].trim();
            make_finding(*severity, desc, text)
        })
        .collect()
}

/// Explicit labels: `Severity: High`.
fn parse_labeled_findings(text: &str) -> Vec<Finding> {
    let re = Regex::new(r"(?i)severity:\s*(critical|high|medium|low)").unwrap();
    re.captures_iter(text)
        .filter_map(|cap| Severity::parse(&cap[1]))
        .map(|severity| make_finding(severity, "", text))
        .collect()
}

/// Bold emphasis: `**Critical**`.
fn parse_bold_findings(text: &str) -> Vec<Finding> {
    let re = Regex::new(r"(?i)\*\*(critical|high|medium|low)\*\*").unwrap();
    re.captures_iter(text)
        .filter_map(|cap| Severity::parse(&cap[1]))
        .map(|severity| make_finding(severity, "", text))
        .collect()
}

fn make_finding(severity: Severity, desc: &str, full_text: &str) -> Finding {
    let description = if desc.is_empty() {
        "See PR for details".to_string()
    } else {
        truncate(desc, MAX_DESCRIPTION_LEN)
    };

    Finding {
        contract_name: "Unknown".to_string(),
        contract_address: String::new(),
        chain: String::new(),
        vuln_type: guess_vuln_type(if desc.is_empty() { full_text } else { desc }),
        severity,
        confidence: DEFAULT_CONFIDENCE,
        description,
        poc_code: None,
        bounty_program: None,
        max_bounty: None,
        pr_url: None,
        session_id: None,
    }
}

/// Guess a vulnerability class by keyword-set membership.
pub fn guess_vuln_type(text: &str) -> String {
    let text_lower = text.to_lowercase();
    for (vuln_type, keywords) in VULN_KEYWORDS {
        if keywords.iter().any(|kw| text_lower.contains(kw)) {
            return vuln_type.to_string();
        }
    }
    "unknown".to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}
