//! Pass API client.

use crate::error::{BadResponse, PassSummaryError};
use crate::metrics;
use crate::models::{Pass, PassCollection};

use std::time::Instant;

use opentelemetry::propagation::{Injector, TextMapPropagator};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use url::Url;

/// Pass source trait.
///
/// Defines the interface to a source of pass records.
///
/// # Methods
/// * `fetch_all`: Fetch every pass in a single request.
/// * `fetch_by_id`: Fetch one pass by its ID.
pub trait PassSource {
    /// Fetch all passes.
    fn fetch_all(
        &self,
    ) -> impl std::future::Future<Output = Result<PassCollection, PassSummaryError>> + Send;

    /// Fetch a single pass.
    ///
    /// Returns [PassSummaryError::NotFound] if the source has no pass with this ID.
    ///
    /// # Arguments
    ///
    /// * `id`: ID of the pass
    fn fetch_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Pass, PassSummaryError>> + Send;
}

/// HTTP pass API client.
///
/// Implements [PassSource] against `GET <base>/passes` and `GET <base>/passes/{id}`.
#[derive(Clone, Debug)]
pub struct PassApiClient {
    reqwest_client: reqwest::Client,
    passes_url: Url,
}

impl PassApiClient {
    /// Create a new pass API client.
    ///
    /// # Arguments
    ///
    /// * `base_url`: URL of the pass API, optionally including a path prefix
    pub fn new(base_url: &Url) -> Result<Self, PassSummaryError> {
        let mut passes_url = base_url.clone();
        passes_url
            .path_segments_mut()
            .map_err(|_| PassSummaryError::InvalidUpstreamUrl {
                url: base_url.to_string(),
            })?
            .pop_if_empty()
            .push("passes");
        Ok(Self {
            reqwest_client: reqwest::Client::new(),
            passes_url,
        })
    }

    /// URL of the pass collection.
    pub fn passes_url(&self) -> &Url {
        &self.passes_url
    }

    /// URL of a single pass.
    fn pass_url(&self, id: i64) -> Url {
        let mut url = self.passes_url.clone();
        // Cannot fail, the base was checked in new().
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&id.to_string());
        }
        url
    }

    /// Send a GET request and deserialise a JSON response body.
    ///
    /// # Arguments
    ///
    /// * `url`: URL to fetch
    /// * `pass_id`: ID of the pass being fetched, if any. A 404 response maps to
    ///   [PassSummaryError::NotFound] only when this is set.
    async fn get_json<T>(&self, url: Url, pass_id: Option<i64>) -> Result<T, PassSummaryError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);
        let response = self
            .reqwest_client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(PassSummaryError::UpstreamUnavailable)?;
        let status = response.status();
        if let (reqwest::StatusCode::NOT_FOUND, Some(id)) = (status, pass_id) {
            return Err(PassSummaryError::NotFound { id });
        }
        if !status.is_success() {
            return Err(BadResponse::Status(status).into());
        }
        let body = response
            .bytes()
            .await
            .map_err(PassSummaryError::UpstreamUnavailable)?;
        let value = serde_json::from_slice(&body).map_err(BadResponse::from)?;
        Ok(value)
    }
}

impl PassSource for PassApiClient {
    #[tracing::instrument(level = "DEBUG", skip(self))]
    async fn fetch_all(&self) -> Result<PassCollection, PassSummaryError> {
        let start = Instant::now();
        let result = self.get_json(self.passes_url.clone(), None).await;
        metrics::record_upstream_request("fetch_all", outcome(&result), start.elapsed());
        result
    }

    #[tracing::instrument(level = "DEBUG", skip(self))]
    async fn fetch_by_id(&self, id: i64) -> Result<Pass, PassSummaryError> {
        let start = Instant::now();
        let result = self.get_json(self.pass_url(id), Some(id)).await;
        metrics::record_upstream_request("fetch_by_id", outcome(&result), start.elapsed());
        result
    }
}

/// Metric label for the result of a pass API request.
fn outcome<T>(result: &Result<T, PassSummaryError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(PassSummaryError::UpstreamUnavailable(_)) => "unavailable",
        Err(PassSummaryError::UpstreamBadResponse(_)) => "bad_response",
        Err(PassSummaryError::NotFound { id: _ }) => "not_found",
        Err(PassSummaryError::DeadlineExceeded { seconds: _ }) => "deadline_exceeded",
        Err(PassSummaryError::InvalidUpstreamUrl { url: _ }) => "invalid_url",
    }
}

/// Writes propagation fields into outgoing request headers.
struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            self.0.insert(name, value);
        }
    }
}

/// Add the trace context of the current span to `headers`.
///
/// This is a no-op unless a propagator has been installed, see [crate::tracing::init_tracing].
fn inject_trace_context(headers: &mut HeaderMap) {
    let context = tracing::Span::current().context();
    opentelemetry::global::get_text_map_propagator(|propagator| {
        propagator.inject_context(&context, &mut HeaderInjector(headers))
    });
}
