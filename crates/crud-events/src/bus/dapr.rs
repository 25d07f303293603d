//! Dapr sidecar publisher.
//!
//! Events are posted to `POST <dapr_url>/v1.0/publish/<pubsub>/<topic>` with
//! `metadata.rawPayload=true`, so subscribers receive the envelope bytes
//! without a CloudEvents wrapper.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::EventBus;
use crate::config::BrokerConfig;
use crate::error::BusError;

const DAPR_API_TOKEN_HEADER: &str = "dapr-api-token";

pub struct DaprBus {
    http_client: reqwest::Client,
    base_url: Url,
    api_token: Option<String>,
}

impl DaprBus {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BusError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BusError::InvalidConfig(format!("invalid Dapr URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BusError::InvalidConfig(format!(
                "Dapr URL {base_url} cannot be used as a base"
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BusError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            api_token: None,
        })
    }

    /// Build a client from configuration, picking up the sidecar API token
    /// from the configured environment variable when it is set.
    pub fn from_config(config: &BrokerConfig) -> Result<Self, BusError> {
        let bus = Self::new(&config.dapr_url, Duration::from_secs(config.timeout_secs))?;
        let token = std::env::var(&config.api_token_env)
            .ok()
            .filter(|t| !t.is_empty());
        Ok(bus.with_api_token(token))
    }

    #[must_use]
    pub fn with_api_token(mut self, token: Option<String>) -> Self {
        self.api_token = token;
        self
    }

    fn publish_url(&self, bus_name: &str, topic: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v1.0", "publish", bus_name, topic]);
        }
        url.query_pairs_mut()
            .append_pair("metadata.rawPayload", "true");
        url
    }
}

impl std::fmt::Debug for DaprBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaprBus")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[async_trait]
impl EventBus for DaprBus {
    async fn publish_event(
        &self,
        bus_name: &str,
        topic: &str,
        data: Vec<u8>,
    ) -> Result<(), BusError> {
        let url = self.publish_url(bus_name, topic);

        let mut request = self
            .http_client
            .post(url.as_str())
            .header("Content-Type", "application/octet-stream");
        if let Some(token) = &self.api_token {
            request = request.header(DAPR_API_TOKEN_HEADER, token);
        }

        let response = request
            .body(data)
            .send()
            .await
            .map_err(|e| BusError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BusError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::trace!(bus_name, topic, "Published to Dapr sidecar");
        Ok(())
    }
}
