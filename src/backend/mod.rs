//! Connection to the remote flag-evaluation backend.
//!
//! The backend owns flag definitions, targeting rules and bucketing. This
//! service only asks it for values and forwards analytics events.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::evaluation::{EvaluationContext, FlagsState};

pub mod accessor;
pub mod events;
pub mod http;

pub use accessor::ClientAccessor;
pub use http::{HttpFlagClient, HttpFlagClientConfig};

pub type Result<T, E = BackendError> = std::result::Result<T, E>;

pub type SharedBackend = Arc<dyn FlagBackend>;

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("HTTP client error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend returned {status} for {endpoint}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("backend did not finish initializing within {0:?}")]
    InitTimeout(Duration),

    #[error("invalid backend url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

#[async_trait]
pub trait FlagBackend: Send + Sync {
    /// Resolves once the backend reports it is ready to serve evaluations.
    async fn wait_for_initialization(&self) -> Result<()>;

    /// Every flag evaluated for `context`. Records no analytics events.
    async fn all_flags_state(
        &self,
        context: &EvaluationContext,
        with_reasons: bool,
    ) -> Result<FlagsState>;

    /// Evaluate one flag. Records an analytics event when events are enabled.
    async fn variation(
        &self,
        flag_key: &str,
        context: &EvaluationContext,
        default: Value,
    ) -> Result<Value>;

    /// Send buffered analytics events. Returns how many were sent.
    async fn flush(&self) -> Result<usize>;
}
