use axum::extract::State;
use serde_json::Value;

use super::schedule_flush;
use crate::error::AppError;
use crate::evaluation::static_context;
use crate::state::AppState;

pub const HOMEPAGE_FLAG: &str = "homepage-flag";

/// Plain-text greeting carrying the homepage flag for a fixed user.
pub async fn greeting(State(state): State<AppState>) -> Result<String, AppError> {
    let client = state.flags.get_or_create().await?;
    let value = client
        .variation(HOMEPAGE_FLAG, &static_context(), Value::Bool(false))
        .await?;

    schedule_flush(state.background.as_ref(), client);

    Ok(format!("Hello World! The value of the homepage flag is: {}", value))
}
