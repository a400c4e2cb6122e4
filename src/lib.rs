//! This crate provides a pass summary service. It reads mountain passes from an upstream pass API
//! and reports how many there are and their total ascent.
//!
//! Two strategies are offered. `GET /summary` fetches the passes once and sums them locally.
//! `GET /summary/slow` additionally fetches every pass again by ID, one request after another. It
//! returns the same numbers but makes the N+1 request pattern stand out in distributed traces.
//!
//! The service is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the [hyper] HTTP library.
//! * [reqwest] performs requests to the pass API.
//! * [Serde](serde) performs (de)serialisation of JSON request and response data.
//! * [tracing] with optional export of spans to Jaeger via [opentelemetry].

pub mod aggregator;
pub mod app;
pub mod app_state;
pub mod cli;
pub mod error;
pub mod metrics;
pub mod models;
pub mod server;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod upstream;
