//! Logging initialization.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info,swapframe=debug,swapframe_rhi=debug,swapframe_renderer=debug";

/// Installs the global tracing subscriber.
///
/// Filtering follows `RUST_LOG` when present, otherwise [`DEFAULT_FILTER`].
/// Output goes through the fmt layer with targets and thread ids.
///
/// # Example
/// ```
/// swapframe_core::init_logging();
/// tracing::info!("Logging ready");
/// ```
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A subscriber may already be installed (tests, embedding hosts).
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init();
}
