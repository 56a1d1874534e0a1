use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `SPARKLY_LOG=sparkly=debug`.
pub const LOG_ENV: &str = "SPARKLY_LOG";

/// Install the global subscriber, writing to stderr.
///
/// `SPARKLY_LOG` wins when set; otherwise `--verbose` selects `debug` and the
/// default is `warn`.
pub fn setup_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
