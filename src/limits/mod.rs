//! # Creation Limits
//!
//! Counters backing the creation caps. The caps are a soft admission check:
//! the count is read, compared and later incremented in separate steps, so
//! concurrent creations can overshoot a cap by up to the number of requests
//! in flight minus one.

pub mod counters;

pub use counters::DailyCreationCounter;
