//! Public SDK surface for Maeum.
//!
//! This crate re-exports the building blocks and provides a small
//! initialization helper to keep binary setup consistent.

/// Re-export for convenience.
pub use maeum_rs_config as config;
pub use maeum_rs_core as core;
/// Re-export for convenience.
pub use maeum_rs_memory as memory;
/// Re-export for convenience.
pub use maeum_rs_protocol as protocol;
pub use maeum_rs_server as server;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// Verbosity follows `RUST_LOG` and defaults to `info`. Safe to call more
/// than once.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_millis()
            .try_init();
    }
}
