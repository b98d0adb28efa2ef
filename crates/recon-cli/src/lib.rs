//! CLI library components for the `recon` binary.

pub mod args;
pub mod config;
pub mod logging;
pub mod summary;
