use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive
pub const LOG_ENV: &str = "JOBSEARCH_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Initialize the global tracing subscriber, writing to stderr.
///
/// Filter precedence: `JOBSEARCH_LOG`, then `RUST_LOG`, then `fallback`
/// (usually the config's `log_level`), then `warn`. Safe to call twice.
pub fn init_tracing(fallback: Option<&str>) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(fallback.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
