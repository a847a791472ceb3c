use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "veldkeur=info,sqlx=warn";

/// Install the tracing subscriber for standalone binaries and tests.
///
/// The filter is taken from `VELDKEUR_LOG` when set. Repeated calls are
/// harmless; only the first subscriber wins.
pub fn init() {
    let filter = std::env::var("VELDKEUR_LOG").unwrap_or_else(|_| DEFAULT_FILTER.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .json()
        .with_target(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .try_init();
}
