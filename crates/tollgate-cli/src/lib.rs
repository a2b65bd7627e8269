//! Tollgate CLI library
//!
//! Command definitions and handlers for the `tollgate` binary.

pub mod cli;
pub mod error;

pub use error::{CliError, Result};
