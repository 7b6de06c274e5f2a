use axum::{extract::State, http::Uri, response::Html};

use super::schedule_flush;
use crate::error::AppError;
use crate::evaluation::build_context;
use crate::overview::build_overview;
use crate::state::AppState;

/// HTML overview of every flag for a fresh context built from the request path.
pub async fn overview(State(state): State<AppState>, uri: Uri) -> Result<Html<String>, AppError> {
    let client = state.flags.get_or_create().await?;
    let context = build_context(uri.path());

    let page = build_overview(client.as_ref(), &context).await?;
    schedule_flush(state.background.as_ref(), client);

    Ok(Html(page))
}
