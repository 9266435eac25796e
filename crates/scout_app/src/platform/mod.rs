//! Headless runner: configuration, logging and pipeline wiring.
mod app;
mod events;
mod logging;
mod settings;

pub use app::run_app;
