//! Schema module - Configuration and report types for evolution runs.

mod config;
mod progress;

pub use config::*;
pub use progress::*;
