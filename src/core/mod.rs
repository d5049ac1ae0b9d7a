pub mod config;
pub mod context;
pub mod error;
pub mod query;
pub mod types;
pub mod validation;
