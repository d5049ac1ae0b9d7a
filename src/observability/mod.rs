//! # Observability
//!
//! Structured logging setup. Request logging lives with the HTTP router.

pub mod logging;

pub use logging::init_logging;
