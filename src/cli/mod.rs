//! Command-line interface for the eDNE loader

pub mod commands;
pub mod error;
pub mod progress;

pub use error::CliError;
