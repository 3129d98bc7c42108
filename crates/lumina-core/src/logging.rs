//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Default filter: font-table diagnostics at debug, everything else at info.
pub const DEFAULT_FILTER: &str = "info,lumina_font=debug";

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over [`DEFAULT_FILTER`]. Calling this more than once is
/// harmless; later calls are ignored.
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Install a global `tracing` subscriber with a custom fallback filter.
pub fn init_with_filter(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init_with_filter("warn");
        tracing::debug!("still logging after a second init");
    }
}
