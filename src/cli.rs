//! Command Line Interface (CLI) arguments.

use clap::Parser;
use url::Url;

/// Pass summary command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the service should listen
    #[arg(long, default_value = "0.0.0.0", env = "PASS_SUMMARY_HOST")]
    pub host: String,
    /// The port to which the service should bind
    #[arg(long, default_value_t = 8080, env = "PASS_SUMMARY_PORT")]
    pub port: u16,
    /// Base URL of the pass API. Requests are sent to `<url>/passes` and `<url>/passes/{id}`.
    #[arg(
        long,
        default_value = "http://pass-api:8080",
        env = "PASS_SUMMARY_UPSTREAM_URL"
    )]
    pub upstream_url: Url,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "PASS_SUMMARY_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/pass-summary/certs/cert.pem",
        env = "PASS_SUMMARY_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/pass-summary/certs/key.pem",
        env = "PASS_SUMMARY_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for requests to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "PASS_SUMMARY_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Whether to enable sending traces to Jaeger.
    #[arg(long, default_value_t = false, env = "PASS_SUMMARY_ENABLE_JAEGER")]
    pub enable_jaeger: bool,
    /// Optional deadline in seconds for each request, including all pass API calls it makes.
    #[arg(long, env = "PASS_SUMMARY_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
