use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::HuntsmanError;

/// Session listing entry as reported by the agent backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub state: String,
    pub title: String,
    pub created: Option<DateTime<Utc>>,
}

/// Everything the harvester needs from one completed session.
#[derive(Debug, Clone)]
pub struct SessionOutput {
    pub state: String,
    pub title: String,
    pub created: Option<DateTime<Utc>>,
    pub pr_url: Option<String>,
    /// Loosely-structured text blobs emitted by the agent, in order.
    pub activity_text: Vec<String>,
}

/// Narrow interface to the external AI agent backend. The aggregator and
/// extractor never depend on the backend's internals; they pass dispatch
/// records in and get loosely-structured text back.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Create a session for the given prompt, returning its opaque id.
    async fn create_session(
        &self,
        title: &str,
        prompt: &str,
        tags: &[String],
    ) -> Result<String, HuntsmanError>;

    /// List sessions, optionally filtered by tags and states.
    async fn list_sessions(
        &self,
        tags: &[String],
        states: &[String],
    ) -> Result<Vec<SessionSummary>, HuntsmanError>;

    /// Fetch one session's metadata and accumulated output.
    async fn session_output(&self, session_id: &str) -> Result<SessionOutput, HuntsmanError>;
}

/// HTTP implementation of the agent backend interface.
pub struct HttpAgentBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAgentBackend {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value, HuntsmanError> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| HuntsmanError::Dispatch(format!("Backend request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HuntsmanError::Dispatch(format!("Backend returned HTTP {status}")));
        }

        resp.json()
            .await
            .map_err(|e| HuntsmanError::Dispatch(format!("Backend response is not JSON: {e}")))
    }
}

#[async_trait]
impl AgentBackend for HttpAgentBackend {
    async fn create_session(
        &self,
        title: &str,
        prompt: &str,
        tags: &[String],
    ) -> Result<String, HuntsmanError> {
        let body = json!({
            "title": title,
            "prompt": prompt,
            "tags": tags,
            "automation": true,
        });

        let resp = self
            .client
            .post(format!("{}/sessions", self.base_url))
            .timeout(Duration::from_secs(30))
            .json(&body)
            .send()
            .await
            .map_err(|e| HuntsmanError::Dispatch(format!("Session create failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HuntsmanError::Dispatch(format!("Session create returned HTTP {status}")));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| HuntsmanError::Dispatch(format!("Session create response is not JSON: {e}")))?;

        let id = data["id"]
            .as_str()
            .ok_or_else(|| HuntsmanError::Dispatch("Session create response has no id".into()))?
            .to_string();

        debug!(session_id = %id, "Created agent session");
        Ok(id)
    }

    async fn list_sessions(
        &self,
        tags: &[String],
        states: &[String],
    ) -> Result<Vec<SessionSummary>, HuntsmanError> {
        let mut path = "/sessions".to_string();
        let mut params = Vec::new();
        if !tags.is_empty() {
            params.push(format!("tags={}", tags.join(",")));
        }
        if !states.is_empty() {
            params.push(format!("states={}", states.join(",")));
        }
        if !params.is_empty() {
            path = format!("{path}?{}", params.join("&"));
        }

        let data = self.get_json(&path).await?;
        let sessions = data["sessions"].as_array().cloned().unwrap_or_default();

        Ok(sessions
            .iter()
            .filter_map(|s| {
                Some(SessionSummary {
                    id: s["id"].as_str()?.to_string(),
                    state: s["state"].as_str().unwrap_or("UNKNOWN").to_string(),
                    title: s["title"].as_str().unwrap_or("").to_string(),
                    created: s["createTime"]
                        .as_str()
                        .and_then(|t| t.parse::<DateTime<Utc>>().ok()),
                })
            })
            .collect())
    }

    async fn session_output(&self, session_id: &str) -> Result<SessionOutput, HuntsmanError> {
        let data = self.get_json(&format!("/sessions/{session_id}/output")).await?;

        let activity_text = data["activities"]
            .as_array()
            .map(|acts| {
                acts.iter()
                    .filter_map(|a| {
                        a["output"]
                            .as_str()
                            .or_else(|| a["agentOutput"]["output"].as_str())
                            .map(str::to_string)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(SessionOutput {
            state: data["state"].as_str().unwrap_or("UNKNOWN").to_string(),
            title: data["title"].as_str().unwrap_or("").to_string(),
            created: data["createTime"]
                .as_str()
                .and_then(|t| t.parse::<DateTime<Utc>>().ok()),
            pr_url: data["pullRequest"]["url"].as_str().map(str::to_string),
            activity_text,
        })
    }
}
