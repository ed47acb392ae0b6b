//! CLI commands implementation

pub mod check;
pub mod config;

pub use check::*;
pub use config::*;
