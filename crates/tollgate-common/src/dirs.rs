//! Platform directory resolution

use etcetera::{choose_base_strategy, BaseStrategy};
use std::path::PathBuf;

/// Application directory name shared by the SDK and the CLI
pub const APP_DIR_NAME: &str = "tollgate";

#[derive(Debug, thiserror::Error)]
#[error("Failed to determine base directories: {0}")]
pub struct DirsError(String);

/// Get the data directory used for persisted session state
/// Returns platform-specific data directory (e.g., ~/.local/share/tollgate on Linux)
pub fn data_dir() -> Result<PathBuf, DirsError> {
    let strategy = choose_base_strategy().map_err(|e| DirsError(e.to_string()))?;
    Ok(strategy.data_dir().join(APP_DIR_NAME))
}
