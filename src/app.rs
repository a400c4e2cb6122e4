//! Service routes and request handlers

use crate::aggregator;
use crate::app_state::{AppState, SharedAppState};
use crate::cli::CommandLineArgs;
use crate::error::PassSummaryError;
use crate::metrics;
use crate::models;
use crate::upstream::PassSource;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// `axum` service type returned by [service]
pub type Service = NormalizePath<Router>;

/// Returns a [axum::Router] for the pass summary API.
///
/// # Arguments
///
/// * `args`: Command line arguments
pub fn router(args: &CommandLineArgs) -> Result<Router, PassSummaryError> {
    let state: SharedAppState = Arc::new(AppState::new(args)?);

    let router = Router::new()
        .route("/ping", get(ping))
        .route("/summary", get(summary))
        .route("/summary/slow", get(summary_slow))
        .with_state(state)
        .route("/metrics", get(metrics::metrics_handler));

    let router = match args.request_timeout {
        Some(seconds) => router.layer(middleware::from_fn_with_state(seconds, request_deadline)),
        None => router,
    };

    Ok(router.layer(
        TraceLayer::new_for_http()
            .on_request(metrics::request_counter)
            .on_response(metrics::record_response_metrics),
    ))
}

/// Returns an [axum::Router] wrapped to trim trailing slashes from request paths.
///
/// # Arguments
///
/// * `args`: Command line arguments
pub fn service(args: &CommandLineArgs) -> Result<Service, PassSummaryError> {
    Ok(NormalizePathLayer::trim_trailing_slash().layer(router(args)?))
}

/// Abort a request that runs longer than `seconds`.
///
/// Dropping the handler future cancels any pass API requests still pending.
async fn request_deadline<B>(
    State(seconds): State<u64>,
    request: Request<B>,
    next: Next<B>,
) -> Response {
    match tokio::time::timeout(Duration::from_secs(seconds), next.run(request)).await {
        Ok(response) => response,
        Err(_) => PassSummaryError::DeadlineExceeded { seconds }.into_response(),
    }
}

/// Liveness check.
async fn ping() -> Json<models::Ping> {
    Json(models::Ping { ok: true })
}

/// Summarise all passes from a single bulk fetch.
#[tracing::instrument(level = "DEBUG", skip(state))]
async fn summary(
    State(state): State<SharedAppState>,
) -> Result<Json<models::Summary>, PassSummaryError> {
    let passes = state.client.fetch_all().await?;
    let summary = aggregator::summarize_fast(&passes);
    tracing::debug!(
        pass_count = summary.pass_count,
        total_ascent = summary.total_ascent,
        "summarised passes"
    );
    Ok(Json(summary))
}

/// Summarise all passes, fetching each one individually after the bulk fetch.
///
/// This is deliberately inefficient, every pass costs an extra sequential round trip to the pass
/// API.
#[tracing::instrument(level = "DEBUG", skip(state))]
async fn summary_slow(
    State(state): State<SharedAppState>,
) -> Result<Json<models::Summary>, PassSummaryError> {
    let passes = state.client.fetch_all().await?;
    let summary = aggregator::summarize_slow(&state.client, &passes).await?;
    tracing::debug!(
        pass_count = summary.pass_count,
        total_ascent = summary.total_ascent,
        method = ?summary.method,
        "summarised passes"
    );
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    // https://github.com/tokio-rs/axum/blob/main/examples/testing/src/main.rs

    use super::*;
    use crate::test_utils;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use clap::Parser;
    use httpmock::prelude::*;
    use serde_json::{json, Value};
    use tower::ServiceExt; // for `oneshot`

    fn args(upstream_url: &str, extra: &[&str]) -> CommandLineArgs {
        let mut argv = vec!["pass-summary", "--upstream-url", upstream_url];
        argv.extend_from_slice(extra);
        CommandLineArgs::try_parse_from(argv).unwrap()
    }

    // Build the service and make a oneshot GET request.
    async fn request(args: &CommandLineArgs, uri: &str) -> Response {
        service(args)
            .unwrap()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    // Jump through the hoops to get the body as JSON.
    async fn body_json(response: Response) -> Value {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // Serve the test passes as a listing and individually.
    async fn mock_pass_api(server: &MockServer) -> Vec<httpmock::Mock<'_>> {
        let mut mocks = vec![
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/passes");
                    then.status(200)
                        .json_body(json!(test_utils::get_test_passes()));
                })
                .await,
        ];
        for pass in test_utils::get_test_passes() {
            let path = format!("/passes/{}", pass.id);
            mocks.push(
                server
                    .mock_async(|when, then| {
                        when.method(GET).path(path);
                        then.status(200).json_body(json!(pass));
                    })
                    .await,
            );
        }
        mocks
    }

    #[tokio::test]
    async fn ping() {
        let response = request(&args("http://127.0.0.1:1", &[]), "/ping").await;
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(json!({"ok": true}), body_json(response).await);
    }

    #[tokio::test]
    async fn summary() {
        let server = MockServer::start_async().await;
        let mocks = mock_pass_api(&server).await;
        let response = request(&args(&server.base_url(), &[]), "/summary").await;
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            json!({"pass_count": 3, "total_ascent": 6518}),
            body_json(response).await
        );
        assert_eq!(1, mocks[0].hits_async().await);
        for mock in &mocks[1..] {
            assert_eq!(0, mock.hits_async().await);
        }
    }

    #[tokio::test]
    async fn summary_trailing_slash() {
        let server = MockServer::start_async().await;
        mock_pass_api(&server).await;
        let response = request(&args(&server.base_url(), &[]), "/summary/").await;
        assert_eq!(StatusCode::OK, response.status());
    }

    #[tokio::test]
    async fn summary_slow() {
        let server = MockServer::start_async().await;
        let mocks = mock_pass_api(&server).await;
        let response = request(&args(&server.base_url(), &[]), "/summary/slow").await;
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            json!({
                "pass_count": 3,
                "total_ascent": 6518,
                "method": "inefficient-individual-requests"
            }),
            body_json(response).await
        );
        for mock in &mocks {
            assert_eq!(1, mock.hits_async().await);
        }
    }

    #[tokio::test]
    async fn summary_idempotent() {
        let server = MockServer::start_async().await;
        mock_pass_api(&server).await;
        let args = args(&server.base_url(), &[]);
        for uri in ["/summary", "/summary/slow"] {
            let first = body_json(request(&args, uri).await).await;
            let second = body_json(request(&args, uri).await).await;
            assert_eq!(first, second);
        }
    }

    #[tokio::test]
    async fn summary_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/passes");
                then.status(200).json_body(json!([]));
            })
            .await;
        let args = args(&server.base_url(), &[]);
        let response = request(&args, "/summary").await;
        assert_eq!(
            json!({"pass_count": 0, "total_ascent": 0}),
            body_json(response).await
        );
        let response = request(&args, "/summary/slow").await;
        assert_eq!(
            json!({
                "pass_count": 0,
                "total_ascent": 0,
                "method": "inefficient-individual-requests"
            }),
            body_json(response).await
        );
    }

    #[tokio::test]
    async fn summary_upstream_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/passes");
                then.status(500);
            })
            .await;
        let response = request(&args(&server.base_url(), &[]), "/summary").await;
        assert_eq!(StatusCode::BAD_GATEWAY, response.status());
        let body = body_json(response).await;
        assert_eq!(
            json!("pass API returned a bad response"),
            body["error"]["message"]
        );
    }

    #[tokio::test]
    async fn summary_upstream_unavailable() {
        // Nothing listens on port 1.
        let response = request(&args("http://127.0.0.1:1", &[]), "/summary").await;
        assert_eq!(StatusCode::BAD_GATEWAY, response.status());
        let body = body_json(response).await;
        assert_eq!(json!("pass API is unavailable"), body["error"]["message"]);
    }

    #[tokio::test]
    async fn summary_slow_pass_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/passes");
                then.status(200)
                    .json_body(json!(test_utils::get_test_passes()));
            })
            .await;
        let first = server
            .mock_async(|when, then| {
                when.method(GET).path("/passes/1");
                then.status(200)
                    .json_body(json!(test_utils::get_test_passes()[0]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/passes/2");
                then.status(404).json_body(json!({"error": "Pass not found"}));
            })
            .await;
        let third = server
            .mock_async(|when, then| {
                when.method(GET).path("/passes/3");
                then.status(200)
                    .json_body(json!(test_utils::get_test_passes()[2]));
            })
            .await;
        let response = request(&args(&server.base_url(), &[]), "/summary/slow").await;
        assert_eq!(StatusCode::BAD_GATEWAY, response.status());
        let body = body_json(response).await;
        assert_eq!(json!("pass 2 not found"), body["error"]["message"]);
        assert_eq!(1, first.hits_async().await);
        assert_eq!(0, third.hits_async().await);
    }

    #[tokio::test]
    async fn summary_request_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/passes");
                then.status(200)
                    .delay(Duration::from_secs(5))
                    .json_body(json!([]));
            })
            .await;
        let args = args(&server.base_url(), &["--request-timeout", "1"]);
        let response = request(&args, "/summary").await;
        assert_eq!(StatusCode::GATEWAY_TIMEOUT, response.status());
        let body = body_json(response).await;
        assert_eq!(
            json!("request did not complete within 1s"),
            body["error"]["message"]
        );
    }

    #[tokio::test]
    async fn summary_slow_request_timeout_cancels_pending_requests() {
        let server = MockServer::start_async().await;
        let listing = server
            .mock_async(|when, then| {
                when.method(GET).path("/passes");
                then.status(200)
                    .json_body(json!(test_utils::get_test_passes()));
            })
            .await;
        let first = server
            .mock_async(|when, then| {
                when.method(GET).path("/passes/1");
                then.status(200)
                    .delay(Duration::from_secs(5))
                    .json_body(json!(test_utils::get_test_passes()[0]));
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method(GET).path("/passes/2");
                then.status(200)
                    .json_body(json!(test_utils::get_test_passes()[1]));
            })
            .await;
        let third = server
            .mock_async(|when, then| {
                when.method(GET).path("/passes/3");
                then.status(200)
                    .json_body(json!(test_utils::get_test_passes()[2]));
            })
            .await;
        let args = args(&server.base_url(), &["--request-timeout", "1"]);
        let response = request(&args, "/summary/slow").await;
        assert_eq!(StatusCode::GATEWAY_TIMEOUT, response.status());
        assert_eq!(1, listing.hits_async().await);
        assert_eq!(1, first.hits_async().await);
        assert_eq!(0, second.hits_async().await);
        assert_eq!(0, third.hits_async().await);
    }

    #[tokio::test]
    async fn metrics() {
        let response = request(&args("http://127.0.0.1:1", &[]), "/metrics").await;
        assert_eq!(StatusCode::OK, response.status());
    }

    #[tokio::test]
    async fn unknown_route() {
        let response = request(&args("http://127.0.0.1:1", &[]), "/pass-summary").await;
        assert_eq!(StatusCode::NOT_FOUND, response.status());
    }

    #[test]
    fn invalid_upstream_url() {
        let result = router(&args("mailto:passes@example.com", &[]));
        assert!(matches!(
            result,
            Err(PassSummaryError::InvalidUpstreamUrl { url: _ })
        ));
    }
}
