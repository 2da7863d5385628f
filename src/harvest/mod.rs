pub mod extractor;

pub use extractor::{guess_vuln_type, parse_findings};

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::dispatch::AgentBackend;
use crate::errors::HuntsmanError;
use crate::models::{Finding, SessionResult};

const RAW_OUTPUT_LIMIT: usize = 5_000;

/// Pulls completed sessions off the agent backend and turns their output
/// into findings. Each harvested session is archived as a JSON snapshot for
/// manual review; the archive is best-effort and never blocks harvesting.
pub struct SessionHarvester<'a> {
    backend: &'a dyn AgentBackend,
    findings_dir: PathBuf,
}

impl<'a> SessionHarvester<'a> {
    pub fn new(backend: &'a dyn AgentBackend, data_dir: &Path) -> Self {
        Self {
            backend,
            findings_dir: data_dir.join("findings"),
        }
    }

    /// Harvest one session: fetch its output, mine findings out of every
    /// activity blob, and stamp the session id and PR link on each.
    pub async fn harvest_session(&self, session_id: &str) -> Result<SessionResult, HuntsmanError> {
        let output = self.backend.session_output(session_id).await?;

        let mut findings: Vec<Finding> = output
            .activity_text
            .iter()
            .flat_map(|text| parse_findings(text))
            .collect();

        for finding in &mut findings {
            finding.session_id = Some(session_id.to_string());
            finding.pr_url = output.pr_url.clone();
        }

        let raw = output.activity_text.join("\n\n");
        let raw_output = if raw.is_empty() {
            None
        } else {
            Some(truncate_chars(&raw, RAW_OUTPUT_LIMIT))
        };

        let result = SessionResult {
            session_id: session_id.to_string(),
            state: output.state,
            title: output.title,
            created: output.created,
            findings,
            pr_url: output.pr_url,
            raw_output,
        };

        self.archive(&result);
        Ok(result)
    }

    /// Harvest every completed session carrying the given tags. A session
    /// that fails to harvest is skipped with a warning; partial results beat
    /// no results.
    pub async fn harvest_completed(&self, tags: &[String]) -> Vec<SessionResult> {
        let sessions = match self
            .backend
            .list_sessions(tags, &["COMPLETED".to_string()])
            .await
        {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "Could not list completed sessions");
                return Vec::new();
            }
        };

        info!(count = sessions.len(), "Harvesting completed sessions");

        let mut results = Vec::new();
        for session in sessions {
            match self.harvest_session(&session.id).await {
                Ok(result) => results.push(result),
                Err(e) => warn!(session_id = %session.id, error = %e, "Harvest failed, skipping"),
            }
        }
        results
    }

    fn archive(&self, result: &SessionResult) {
        if let Err(e) = std::fs::create_dir_all(&self.findings_dir) {
            warn!(error = %e, "Cannot create findings directory");
            return;
        }
        let path = self.findings_dir.join(format!("{}.json", result.session_id));
        match serde_json::to_string_pretty(result) {
            Ok(raw) => {
                if let Err(e) = std::fs::write(&path, raw) {
                    warn!(path = %path.display(), error = %e, "Failed to archive session result");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize session result"),
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{SessionOutput, SessionSummary};
    use async_trait::async_trait;

    struct StubBackend {
        sessions: Vec<SessionSummary>,
        output_text: Vec<String>,
        pr_url: Option<String>,
    }

    #[async_trait]
    impl AgentBackend for StubBackend {
        async fn create_session(
            &self,
            _title: &str,
            _prompt: &str,
            _tags: &[String],
        ) -> Result<String, HuntsmanError> {
            Ok("stub".to_string())
        }

        async fn list_sessions(
            &self,
            _tags: &[String],
            _states: &[String],
        ) -> Result<Vec<SessionSummary>, HuntsmanError> {
            Ok(self.sessions.clone())
        }

        async fn session_output(&self, _session_id: &str) -> Result<SessionOutput, HuntsmanError> {
            Ok(SessionOutput {
                state: "COMPLETED".to_string(),
                title: "audit".to_string(),
                created: None,
                pr_url: self.pr_url.clone(),
                activity_text: self.output_text.clone(),
            })
        }
    }

    #[tokio::test]
    async fn test_harvest_session_stamps_session_and_pr() {
        let dir = tempfile::tempdir().unwrap();
        let backend = StubBackend {
            sessions: vec![],
            output_text: vec!["# High: reentrancy in withdraw\nbad state ordering".to_string()],
            pr_url: Some("https://github.com/x/y/pull/1".to_string()),
        };
        let harvester = SessionHarvester::new(&backend, dir.path());

        let result = harvester.harvest_session("sess-42").await.unwrap();
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].session_id.as_deref(), Some("sess-42"));
        assert_eq!(
            result.findings[0].pr_url.as_deref(),
            Some("https://github.com/x/y/pull/1")
        );

        // Archived snapshot exists
        assert!(dir.path().join("findings").join("sess-42.json").exists());
    }

    #[tokio::test]
    async fn test_harvest_completed_collects_all_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let backend = StubBackend {
            sessions: vec![
                SessionSummary {
                    id: "a".to_string(),
                    state: "COMPLETED".to_string(),
                    title: String::new(),
                    created: None,
                },
                SessionSummary {
                    id: "b".to_string(),
                    state: "COMPLETED".to_string(),
                    title: String::new(),
                    created: None,
                },
            ],
            output_text: vec!["Severity: Medium\naccess control hole".to_string()],
            pr_url: None,
        };
        let harvester = SessionHarvester::new(&backend, dir.path());

        let results = harvester.harvest_completed(&["security-hunt".to_string()]).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.findings.len() == 1));
    }

    #[tokio::test]
    async fn test_harvest_session_with_clean_output_has_no_findings() {
        let dir = tempfile::tempdir().unwrap();
        let backend = StubBackend {
            sessions: vec![],
            output_text: vec!["No issues identified.".to_string()],
            pr_url: None,
        };
        let harvester = SessionHarvester::new(&backend, dir.path());

        let result = harvester.harvest_session("sess-7").await.unwrap();
        assert!(result.findings.is_empty());
    }
}
