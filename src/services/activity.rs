use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::core::ports::{ActivityEntry, ActivityError, ActivitySink};

/// Sends activity entries to the logs service
pub struct HttpActivityLog {
    base_url: String,
    client: Client,
}

impl HttpActivityLog {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ActivityError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }
}

#[async_trait]
impl ActivitySink for HttpActivityLog {
    async fn record_activity(&self, entry: ActivityEntry) -> Result<(), ActivityError> {
        let url = format!("{}/logs", self.base_url.trim_end_matches('/'));

        let response = self.client.post(&url).json(&entry).send().await?;

        if !response.status().is_success() {
            return Err(ActivityError::Rejected(format!("{} for '{}'", response.status(), entry.action_type)));
        }

        tracing::debug!("Logged activity '{}' for user {}", entry.action_type, entry.user_id);
        Ok(())
    }
}

/// Writes activity entries to the service log only, for deployments without a logs service
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActivityLog;

#[async_trait]
impl ActivitySink for TracingActivityLog {
    async fn record_activity(&self, entry: ActivityEntry) -> Result<(), ActivityError> {
        tracing::info!(
            user_id = entry.user_id,
            action_type = %entry.action_type,
            "{}",
            entry.details
        );
        Ok(())
    }
}
