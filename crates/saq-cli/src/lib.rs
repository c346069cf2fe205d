//! CLI library components for the SAQ tool.

pub mod config;
pub mod logging;
pub mod summary;
