//! Tollgate SDK
//!
//! An HTTP client that keeps a short-lived access token usable: it attaches
//! the token to every request, renews it ahead of expiry or after a 401, and
//! makes sure concurrent requests share a single renewal.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;

pub use auth::{
    ChannelSink, CredentialPair, CredentialStore, RefreshCoordinator, RenewalFailure,
    SessionTermination, TerminationReason, TerminationSink,
};
pub use client::{AuthClient, ClientBuilder};
pub use config::ClientConfig;
pub use error::{ApiError, Result};
