//! HTTP client for the flag-evaluation backend.
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::events::{EventBuffer, FeatureEvent};
use super::{BackendError, FlagBackend, Result};
use crate::evaluation::{EvaluationContext, FlagState, FlagsState};

const INIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct HttpFlagClientConfig {
    pub base_url: String,
    /// Account/service identifier the backend knows this client by.
    pub service_id: String,
    pub send_events: bool,
    pub init_timeout: Duration,
    pub events_capacity: usize,
}

#[derive(Deserialize)]
struct InitStatus {
    #[serde(default)]
    initialized: bool,
}

#[derive(Serialize)]
struct VariationRequest<'a> {
    context: &'a EvaluationContext,
    default: &'a Value,
}

pub struct HttpFlagClient {
    // reqwest keeps a connection pool, so one client serves every request
    client: reqwest::Client,
    base_url: Url,
    service_id: String,
    send_events: bool,
    init_timeout: Duration,
    events: EventBuffer,
}

impl HttpFlagClient {
    pub fn new(config: HttpFlagClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidBaseUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        Ok(HttpFlagClient {
            client: reqwest::Client::new(),
            base_url,
            service_id: config.service_id,
            send_events: config.send_events,
            init_timeout: config.init_timeout,
            events: EventBuffer::new(config.events_capacity),
        })
    }

    #[cfg(test)]
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn poll_until_initialized(&self) -> Result<()> {
        let url = self.endpoint(&["sdk", &self.service_id, "status"]);
        loop {
            let response = check_status(&url, self.client.get(url.clone()).send().await?)?;
            let status: InitStatus = response.json().await?;
            if status.initialized {
                return Ok(());
            }
            tracing::debug!("backend not initialized yet, polling again");
            tokio::time::sleep(INIT_POLL_INTERVAL).await;
        }
    }
}

fn check_status(url: &Url, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        tracing::warn!(endpoint = url.path(), %status, "non-success response from flag backend");
        Err(BackendError::Status {
            endpoint: url.path().to_string(),
            status,
        })
    }
}

#[async_trait]
impl FlagBackend for HttpFlagClient {
    async fn wait_for_initialization(&self) -> Result<()> {
        tracing::info!(service_id = %self.service_id, "waiting for flag backend initialization");
        tokio::time::timeout(self.init_timeout, self.poll_until_initialized())
            .await
            .map_err(|_| BackendError::InitTimeout(self.init_timeout))??;
        tracing::info!(service_id = %self.service_id, "flag backend initialized");
        Ok(())
    }

    async fn all_flags_state(
        &self,
        context: &EvaluationContext,
        with_reasons: bool,
    ) -> Result<FlagsState> {
        let mut url = self.endpoint(&["sdk", &self.service_id, "flags"]);
        url.query_pairs_mut()
            .append_pair("withReasons", if with_reasons { "true" } else { "false" });

        let response = self.client.post(url.clone()).json(context).send().await?;
        let snapshot: FlagsState = check_status(&url, response)?.json().await?;
        tracing::debug!(flags = snapshot.len(), "fetched flag snapshot");

        Ok(snapshot)
    }

    async fn variation(
        &self,
        flag_key: &str,
        context: &EvaluationContext,
        default: Value,
    ) -> Result<Value> {
        let url = self.endpoint(&["sdk", &self.service_id, "flags", flag_key]);
        let body = VariationRequest {
            context,
            default: &default,
        };

        let response = self.client.post(url.clone()).json(&body).send().await?;
        let state: FlagState = check_status(&url, response)?.json().await?;

        let value = if state.value.is_null() {
            default.clone()
        } else {
            state.value
        };

        if self.send_events {
            self.events.push(FeatureEvent::new(
                flag_key,
                context,
                value.clone(),
                default,
                state.reason,
            ));
        }

        Ok(value)
    }

    async fn flush(&self) -> Result<usize> {
        if !self.send_events {
            return Ok(0);
        }

        let events = self.events.drain();
        if events.is_empty() {
            return Ok(0);
        }

        let url = self.endpoint(&["events", "bulk", &self.service_id]);
        let response = self.client.post(url.clone()).json(&events).send().await?;
        check_status(&url, response)?;

        Ok(events.len())
    }
}
