//! Web server

use crate::cli;

use std::{net::SocketAddr, path::PathBuf, process::exit, str::FromStr, time::Duration};

use axum::ServiceExt;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use expanduser::expanduser;
use tokio::signal;

/// Serve the pass summary service
///
/// # Arguments
///
/// * `args`: Command line arguments
/// * `service`: The [crate::app::Service] to serve
pub async fn serve(args: &cli::CommandLineArgs, service: crate::app::Service) {
    let addr = SocketAddr::from_str(&format!("{}:{}", args.host, args.port))
        .expect("invalid host name, IP address or port number");

    // Catch ctrl+c and try to shutdown gracefully
    let handle = Handle::new();
    tokio::spawn(shutdown_signal(
        handle.clone(),
        args.graceful_shutdown_timeout,
    ));

    tracing::info!(%addr, upstream_url = %args.upstream_url, https = args.https, "listening");

    if args.https {
        let Some(abs_cert_file) = tls_file_path(&args.cert_file, "TLS certificate file") else {
            exit(1)
        };
        let Some(abs_key_file) = tls_file_path(&args.key_file, "TLS key file") else {
            exit(1)
        };
        let tls_config = RustlsConfig::from_pem_file(abs_cert_file, abs_key_file)
            .await
            .expect("Failed to load TLS certificate files");
        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(service.into_make_service())
            .await
            .expect("HTTPS server failed");
    } else {
        axum_server::bind(addr)
            .handle(handle)
            .serve(service.into_make_service())
            .await
            .expect("HTTP server failed");
    }
}

/// Return the absolute path of a TLS file, or log an error and return None if it does not exist.
///
/// # Arguments
///
/// * `path`: Path to the file, which may start with `~`
/// * `description`: What the file is, for the error message
fn tls_file_path(path: &str, description: &str) -> Option<PathBuf> {
    let expanded = expanduser(path)
        .expect("Failed to expand ~ to user name. Please provide an absolute path instead.");
    // Canonicalising a missing file fails, so check existence first.
    if !expanded.exists() {
        tracing::error!(
            "{} expected at '{}' but not found.",
            description,
            expanded.display()
        );
        return None;
    }
    let absolute = expanded
        .canonicalize()
        .unwrap_or_else(|_| panic!("failed to determine absolute path to {}", description));
    Some(absolute)
}

/// Graceful shutdown handler
///
/// Installs signal handlers to catch Ctrl-C or SIGTERM and trigger a graceful shutdown.
async fn shutdown_signal(handle: Handle, timeout: u64) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("signal received, starting graceful shutdown");
    // Force shutdown if in-flight requests take longer than the timeout
    handle.graceful_shutdown(Some(Duration::from_secs(timeout)));
}
