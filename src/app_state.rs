use crate::cli::CommandLineArgs;
use crate::error::PassSummaryError;
use crate::upstream::PassApiClient;

use std::sync::Arc;

/// Shared application state passed to each request handler.
pub struct AppState {
    /// Pass API client.
    pub client: PassApiClient,
}

impl AppState {
    /// Create and return an [AppState].
    pub fn new(args: &CommandLineArgs) -> Result<Self, PassSummaryError> {
        Ok(Self {
            client: PassApiClient::new(&args.upstream_url)?,
        })
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
