use axum::Router;
use futures::FutureExt;

mod greeting;
mod overview;

use crate::backend::SharedBackend;
use crate::background::BackgroundTasks;
use crate::config::HandlerVariant;
use crate::state::AppState;

/// Every method and path goes to the one handler for `variant`.
pub fn routes(variant: HandlerVariant) -> Router<AppState> {
    match variant {
        HandlerVariant::Static => Router::new().fallback(greeting::greeting),
        HandlerVariant::Overview => Router::new().fallback(overview::overview),
    }
}

/// Send buffered analytics after the response is on its way.
fn schedule_flush(background: &dyn BackgroundTasks, client: SharedBackend) {
    background.defer(
        "flush-events",
        async move {
            match client.flush().await {
                Ok(sent) => tracing::debug!(sent, "flushed analytics events"),
                Err(e) => tracing::warn!(error = %e, "failed to flush analytics events"),
            }
        }
        .boxed(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ClientAccessor;
    use crate::background::TrackedTasks;
    use crate::evaluation::{EvaluationReason, FlagState, FlagsState, ReasonKind};
    use crate::testing::FakeFlagBackend;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn snapshot() -> FlagsState {
        FlagsState::from_iter([
            (
                "homepage-flag".to_string(),
                FlagState {
                    value: json!(true),
                    reason: Some(EvaluationReason::new(ReasonKind::TargetMatch)),
                },
            ),
            (
                "banner-flag".to_string(),
                FlagState {
                    value: json!("spring"),
                    reason: Some(EvaluationReason::new(ReasonKind::Fallthrough)),
                },
            ),
        ])
    }

    fn app(variant: HandlerVariant, backend: Arc<FakeFlagBackend>) -> (Router, TrackedTasks) {
        let tasks = TrackedTasks::new();
        let state = AppState {
            flags: Arc::new(ClientAccessor::new(move || Ok(backend.clone() as SharedBackend))),
            background: Arc::new(tasks.clone()),
        };
        (routes(variant).with_state(state), tasks)
    }

    async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, String, String) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_static_greeting() {
        let backend = Arc::new(FakeFlagBackend::with_snapshot(snapshot()));
        let (app, _) = app(HandlerVariant::Static, backend.clone());

        let (status, content_type, body) = send(&app, Method::GET, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(body, "Hello World! The value of the homepage flag is: true");
        assert_eq!(backend.evaluated_keys(), vec!["homepage-flag"]);
    }

    #[tokio::test]
    async fn test_static_greeting_ignores_method_and_path() {
        let backend = Arc::new(FakeFlagBackend::with_snapshot(snapshot()));
        let (app, _) = app(HandlerVariant::Static, backend);

        let (_, _, get_root) = send(&app, Method::GET, "/").await;
        let (status, _, post_elsewhere) = send(&app, Method::POST, "/some/other/path").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(get_root, post_elsewhere);
    }

    #[tokio::test]
    async fn test_static_greeting_defaults_to_false() {
        let backend = Arc::new(FakeFlagBackend::default());
        let (app, _) = app(HandlerVariant::Static, backend);

        let (_, _, body) = send(&app, Method::GET, "/").await;

        assert_eq!(body, "Hello World! The value of the homepage flag is: false");
    }

    #[tokio::test]
    async fn test_overview_page() {
        let backend = Arc::new(FakeFlagBackend::with_snapshot(snapshot()));
        let (app, tasks) = app(HandlerVariant::Overview, backend.clone());

        let (status, content_type, body) = send(&app, Method::PUT, "/pricing").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/html; charset=utf-8");
        assert!(body.contains("<a href=\"/pricing\" class=\"active\">"));
        assert_eq!(body.matches("<tr class=\"flag\">").count(), 2);
        assert_eq!(backend.evaluated_keys(), vec!["homepage-flag"]);

        let contexts = backend.snapshot_contexts();
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].path, "/pricing");

        tasks.drain().await;
        assert_eq!(backend.flushed(), 1);
    }

    #[tokio::test]
    async fn test_overview_responds_before_flush_completes() {
        let backend = Arc::new(FakeFlagBackend::with_snapshot(snapshot()).with_flush_delay_ms(800));
        let (app, tasks) = app(HandlerVariant::Overview, backend.clone());

        let start = std::time::Instant::now();
        let (status, _, _) = send(&app, Method::GET, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(start.elapsed() < std::time::Duration::from_millis(400));
        assert_eq!(tasks.pending(), 1);
        assert_eq!(backend.flushed(), 0);

        tasks.drain().await;
        assert_eq!(tasks.pending(), 0);
        assert_eq!(backend.flushed(), 1);
    }

    #[tokio::test]
    async fn test_overview_initializes_backend_once() {
        let backend = Arc::new(FakeFlagBackend::with_snapshot(snapshot()));
        let (app, _) = app(HandlerVariant::Overview, backend.clone());

        send(&app, Method::GET, "/").await;
        send(&app, Method::GET, "/docs").await;

        assert_eq!(backend.initializations(), 1);
        let contexts = backend.snapshot_contexts();
        assert_ne!(contexts[0].key, contexts[1].key);
    }

    #[tokio::test]
    async fn test_overview_without_flags() {
        let backend = Arc::new(FakeFlagBackend::default());
        let (app, _) = app(HandlerVariant::Overview, backend);

        let (status, _, body) = send(&app, Method::GET, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, crate::overview::NO_FLAGS_NOTICE);
    }

    #[tokio::test]
    async fn test_backend_failure_is_server_error() {
        let backend = Arc::new(FakeFlagBackend::default().with_failing_inits(1));
        let (app, _) = app(HandlerVariant::Overview, backend);

        let (status, _, _) = send(&app, Method::GET, "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _, _) = send(&app, Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
    }
}
