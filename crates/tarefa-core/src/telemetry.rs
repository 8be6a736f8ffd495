use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber for the worker process.
///
/// The log level comes from `RUST_LOG`, defaulting to `info`. Debug builds
/// get human-readable output; release builds emit JSON lines for log
/// aggregation.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if cfg!(debug_assertions) {
        builder.init();
    } else {
        builder.json().init();
    }
}
