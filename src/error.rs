//! Error handling.

use axum::{
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tracing::{event, Level};

/// Pass summary service error type
///
/// This type encapsulates the various errors that may occur.
/// Each variant may result in a different API error response.
#[derive(Debug, Error)]
pub enum PassSummaryError {
    /// The pass API could not be reached
    #[error("pass API is unavailable")]
    UpstreamUnavailable(#[source] reqwest::Error),

    /// The pass API responded, but not with what was expected
    #[error("pass API returned a bad response")]
    UpstreamBadResponse(#[from] BadResponse),

    /// The pass API has no pass with the requested ID
    #[error("pass {id} not found")]
    NotFound { id: i64 },

    /// The request did not complete within the configured deadline
    #[error("request did not complete within {seconds}s")]
    DeadlineExceeded { seconds: u64 },

    /// The configured pass API URL cannot have paths appended to it
    #[error("pass API URL {url} cannot be used as a base URL")]
    InvalidUpstreamUrl { url: String },
}

/// Ways in which a pass API response may be unusable
#[derive(Debug, Error)]
pub enum BadResponse {
    /// Non-success HTTP status
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    /// Body could not be deserialised
    #[error("malformed response body")]
    Body(#[from] serde_json::Error),
}

impl PassSummaryError {
    /// Return true if this is an upstream response that could not be used.
    pub fn is_bad_response(&self) -> bool {
        matches!(self, Self::UpstreamBadResponse(_))
    }
}

impl IntoResponse for PassSummaryError {
    /// Convert from a `PassSummaryError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let message = error.to_string();
        let mut causes = Vec::new();
        let mut current = error.source();
        while let Some(source) = current {
            causes.push(source.to_string());
            current = source.source();
        }
        causes.dedup();
        let caused_by = if causes.is_empty() { None } else { Some(causes) };
        ErrorBody { message, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Response body
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            error: ErrorBody::new(error),
        }
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    /// Return a 502 bad gateway ErrorResponse
    fn bad_gateway<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_GATEWAY, error)
    }

    /// Return a 504 gateway timeout ErrorResponse
    fn gateway_timeout<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::GATEWAY_TIMEOUT, error)
    }
}

impl From<PassSummaryError> for ErrorResponse {
    /// Convert from a `PassSummaryError` into an `ErrorResponse`.
    fn from(error: PassSummaryError) -> Self {
        let response = match &error {
            PassSummaryError::UpstreamUnavailable(reqwest_error) if reqwest_error.is_timeout() => {
                Self::gateway_timeout(&error)
            }
            PassSummaryError::DeadlineExceeded { seconds: _ } => Self::gateway_timeout(&error),

            // NotFound only arises for passes the pass API has just listed.
            PassSummaryError::UpstreamUnavailable(_)
            | PassSummaryError::UpstreamBadResponse(_)
            | PassSummaryError::NotFound { id: _ } => Self::bad_gateway(&error),

            PassSummaryError::InvalidUpstreamUrl { url: _ } => Self::internal_server_error(&error),
        };

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}
