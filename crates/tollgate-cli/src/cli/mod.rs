//! Command-line interface definitions

pub mod args;
pub mod commands;
pub mod handlers;

pub use args::Args;
pub use commands::Commands;

/// Log filter used when neither `-v/-q` nor `RUST_LOG` is given
pub const DEFAULT_LOG_FILTER: &str = "tollgate_cli=warn,tollgate_sdk=warn";
