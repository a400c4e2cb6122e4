//! Tracing (logging)

use crate::cli::CommandLineArgs;

use opentelemetry::sdk::propagation::TraceContextPropagator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Service name reported to Jaeger
const SERVICE_NAME: &str = "pass-summary";

/// Initlialise tracing (logging)
///
/// Applies a filter based on the `RUST_LOG` environment variable, falling back to enable debug
/// logging for this crate and tower_http if not set.
///
/// When Jaeger is enabled, spans are also exported to a Jaeger agent and the W3C trace context
/// propagator is installed so that pass API requests join the same trace.
///
/// # Arguments
///
/// * `args`: Command line arguments
pub fn init_tracing(args: &CommandLineArgs) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pass_summary=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());
    if args.enable_jaeger {
        opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());
        let tracer = opentelemetry_jaeger::new_agent_pipeline()
            .with_service_name(SERVICE_NAME)
            .install_batch(opentelemetry::runtime::Tokio)
            .expect("Failed to initialise Jaeger tracer");
        registry
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .init();
    } else {
        registry.init();
    }
}

/// Flush and shut down the tracer provider, if any.
pub fn shutdown_tracing() {
    opentelemetry::global::shutdown_tracer_provider();
}
