//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system with a default level filter
///
/// `RUST_LOG` still takes precedence when set. Safe to call more than once;
/// later calls are ignored.
pub fn init_with_level(level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .try_init();
}
