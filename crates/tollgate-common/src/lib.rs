//! Shared building blocks for the Tollgate crates

pub mod dirs;
pub mod logging;

pub use dirs::{data_dir, DirsError};
