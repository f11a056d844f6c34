//! Diagnostic logging for the engine itself
//!
//! The TAP report owns stdout, so engine logs always go to stderr.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter, e.g. `TAPLINE_LOG=tapline=debug`
pub const LOG_ENV: &str = "TAPLINE_LOG";

/// Install a stderr subscriber
///
/// `TAPLINE_LOG` wins over `default_directive` when set and valid. Returns
/// false if a global subscriber was already installed.
pub fn init(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}
