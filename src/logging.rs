// Process-wide tracing subscriber. The client only emits events; installing a
// sink is left to the application, once, at startup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "ryanair_fares=info";

/// Installs a fmt subscriber filtered by `RUST_LOG` (falling back to
/// `ryanair_fares=info`). Returns false if a global subscriber was already set.
pub fn init() -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
