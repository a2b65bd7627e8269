//! Error types for the Tollgate CLI

use color_eyre::eyre::Report;
use thiserror::Error;

/// CLI error type with minimal variants
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration or credential storage issues
    #[error(transparent)]
    Auth(#[from] tollgate_sdk::auth::AuthError),

    /// API communication errors
    #[error("API error: {0}")]
    Api(#[from] tollgate_sdk::ApiError),

    /// Bad command-line input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Everything else (using color-eyre's Report for rich errors)
    #[error(transparent)]
    Internal(#[from] Report),
}

impl CliError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CliError::InvalidArgument(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CliError::Internal(Report::msg(message.into()))
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
