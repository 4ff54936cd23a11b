//! Tracing initialization (fmt subscriber with env-filter).
//!
//! Log verbosity is controlled with the standard `RUST_LOG` environment
//! variable; the default level is `info`. Example:
//!
//! ```bash
//! RUST_LOG=rosterctl=debug,tower_http=debug rosterctl
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// Safe to call once at startup; returns an error if a subscriber has
/// already been installed (e.g. by a test harness).
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}
