#![deny(missing_docs)]
//! Shared logging utilities for the scout workspace.
//!
//! Library crates log through the `engine_*` macros so every pipeline message
//! carries the same target and can be filtered as one unit. The binary picks
//! the backend; tests use [`initialize_for_tests`].

/// Log target shared by all pipeline messages.
pub const TARGET: &str = "scout";

/// Logs a trace-level message under the pipeline target.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message under the pipeline target.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an info-level message under the pipeline target.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message under the pipeline target.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an error-level message under the pipeline target.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Initializes a terminal logger for tests.
///
/// Safe to call from every test; later calls are no-ops. The level can be
/// raised with `SCOUT_TEST_LOG=trace`.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, TermLogger, TerminalMode};

    let level = match std::env::var("SCOUT_TEST_LOG").ok().as_deref() {
        Some("trace") => log::LevelFilter::Trace,
        Some("info") => log::LevelFilter::Info,
        Some("warn") => log::LevelFilter::Warn,
        _ if cfg!(debug_assertions) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Info,
    };

    // Dependencies such as hyper and wiremock are noisy at debug level.
    let config = ConfigBuilder::new()
        .add_filter_allow_str(TARGET)
        .build();

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
