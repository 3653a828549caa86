use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "daily_notify=info";

/// Installs the global subscriber.
///
/// The filter comes from `RUST_LOG` and falls back to `daily_notify=info`.
/// Set `DISABLE_COLOR` to turn off ANSI escapes, e.g. when output goes to a
/// cron mail.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_ansi(std::env::var_os("DISABLE_COLOR").is_none())
        .try_init();
}
