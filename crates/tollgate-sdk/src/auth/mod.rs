//! Authentication module for the Tollgate SDK
//!
//! This module provides everything the request pipeline needs to keep a
//! session alive:
//! - Credential storage with structural validation of stored tokens
//! - Expiry prediction from decoded token claims
//! - Token renewal against the refresh endpoint
//! - Single-flight coordination of concurrent renewals
//! - Session termination when renewal is impossible

pub mod claims;
pub mod coordinator;
pub mod expiry;
pub mod refresh;
pub mod session;
pub mod storage;
pub mod store;
pub mod types;

// Re-export commonly used types and functions
pub use claims::{decode_claims, Claims};
pub use coordinator::{RefreshCoordinator, RenewalOutcome};
pub use expiry::{is_near_expiry, ExpiryPredictor, LEAD_TIME};
pub use refresh::{RenewalExecutor, Renewer};
pub use session::{
    ChannelSink, SessionTermination, SessionTerminator, TerminationContext, TerminationReason,
    TerminationSink, TracingSink,
};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::CredentialStore;
pub use types::{AuthError, AuthResult, CredentialPair, RenewalFailure};
