//! Testdeck: reactive settings and refresh coordination for test tooling
//!
//! Persisted user settings, a pluggable test runner, and per-project test
//! output bookkeeping, kept current in response to workspace lifecycle events.

pub mod cleaner;
pub mod config;
pub mod error;
pub mod logging;
pub mod observable;
pub mod runner;
pub mod settings;
pub mod store;
pub mod tooling;
pub mod types;
pub mod workspace;
