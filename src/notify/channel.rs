use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::errors::HuntsmanError;

/// Delivery endpoint for notification payloads. Fire-and-forget: a failed
/// send is reported to the caller for logging but the dedup ledger marking
/// stands, so delivery is at-most-once.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), HuntsmanError>;
}

/// Posts payloads to a chat webhook.
pub struct WebhookChannel {
    client: reqwest::Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn send(&self, message: &str) -> Result<(), HuntsmanError> {
        let resp = self
            .client
            .post(&self.url)
            .timeout(Duration::from_secs(15))
            .json(&json!({ "content": message }))
            .send()
            .await
            .map_err(|e| HuntsmanError::Notification(format!("Webhook request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HuntsmanError::Notification(format!(
                "Webhook returned HTTP {status}"
            )));
        }

        debug!("Delivered webhook notification");
        Ok(())
    }
}

/// Prints payloads to stdout. Used when no webhook is configured and in
/// dry runs.
pub struct StdoutChannel;

#[async_trait]
impl NotificationChannel for StdoutChannel {
    async fn send(&self, message: &str) -> Result<(), HuntsmanError> {
        println!("{}", "=".repeat(60));
        println!("{message}");
        println!("{}", "=".repeat(60));
        Ok(())
    }
}
