//! Tracing setup: env-filtered, with a `LOG_FORMAT=json` switch for
//! structured log shipping. No span exporter; this engine only ever runs
//! behind the tasking driver or the demo API, both short-lived enough that
//! stdout logs are the right surface.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Initializes the global tracing subscriber from `RUST_LOG` (defaulting to
/// `info`) and `LOG_FORMAT` (`json` or anything else for human-readable).
/// Must be called once, before the first `tracing::` call.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = Registry::default().with(env_filter);

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        let fmt_layer = tracing_subscriber::fmt::layer().json().flatten_event(true);
        registry.with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer();
        registry.with(fmt_layer).init();
    }
}
