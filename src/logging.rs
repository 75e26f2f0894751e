use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`STK_LOG=stickies=debug`)
pub const LOG_ENV: &str = "STK_LOG";

/// Install the global subscriber. Logs go to stderr so `--json` output on
/// stdout stays clean. Calling twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
