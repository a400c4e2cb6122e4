//! This file defines the pass-summary binary entry point.

use pass_summary::app;
use pass_summary::cli;
use pass_summary::metrics;
use pass_summary::server;
use pass_summary::tracing;

use std::process::exit;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing(&args);
    metrics::register_metrics();
    let service = match app::service(&args) {
        Ok(service) => service,
        Err(err) => {
            ::tracing::error!("{}", err);
            tracing::shutdown_tracing();
            exit(1)
        }
    };
    server::serve(&args, service).await;
    tracing::shutdown_tracing();
}
