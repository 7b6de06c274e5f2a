//! Flag overview page: fetch every flag for a context, fire analytics for the
//! ones that targeted it, and render the lot as an HTML table.

use futures::future::join_all;
use serde_json::Value;

use crate::backend::{FlagBackend, Result};
use crate::evaluation::{EvaluationContext, FlagState, FlagsState};

pub mod html;

pub use html::NO_FLAGS_NOTICE;

pub const DEFAULT_MARKER: &str = "(default)";
const NO_REASON: &str = "-";

/// One display row of the overview table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagRow {
    pub key: String,
    pub value: String,
    pub reason: String,
    pub in_experiment: &'static str,
}

impl FlagRow {
    pub fn new(key: &str, state: &FlagState) -> Self {
        let value = match &state.value {
            Value::Null => DEFAULT_MARKER.to_string(),
            value => value.to_string(),
        };
        let reason = state
            .reason
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| NO_REASON.to_string());

        FlagRow {
            key: key.to_string(),
            value,
            reason,
            in_experiment: if state.in_experiment() { "Yes" } else { "No" },
        }
    }
}

/// A row for every flag in the snapshot, relevant or not.
pub fn flag_rows(snapshot: &FlagsState) -> Vec<FlagRow> {
    snapshot
        .iter()
        .map(|(key, state)| FlagRow::new(key, state))
        .collect()
}

/// Evaluate each flag individually so the backend records an analytics event
/// for it. The bulk snapshot records none. Results are discarded.
async fn trigger_evaluations(client: &dyn FlagBackend, context: &EvaluationContext, keys: &[&str]) {
    let results = join_all(
        keys.iter()
            .map(|key| client.variation(key, context, Value::Bool(false))),
    )
    .await;

    for (key, result) in keys.iter().zip(results) {
        if let Err(e) = result {
            tracing::debug!(flag = *key, error = %e, "evaluation trigger failed");
        }
    }
}

pub async fn build_overview(client: &dyn FlagBackend, context: &EvaluationContext) -> Result<String> {
    let snapshot = client.all_flags_state(context, true).await?;
    if snapshot.is_empty() {
        return Ok(NO_FLAGS_NOTICE.to_string());
    }

    let relevant = snapshot.relevant_keys();
    tracing::info!(
        flags = snapshot.len(),
        relevant = relevant.len(),
        path = %context.path,
        "building flag overview"
    );

    trigger_evaluations(client, context, &relevant).await;

    Ok(html::render_page(context, &flag_rows(&snapshot)))
}
