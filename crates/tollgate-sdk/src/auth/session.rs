//! Session termination
//!
//! When credentials can no longer be renewed the session is torn down and the
//! navigation layer is told where to send the user to authenticate again.

use super::store::CredentialStore;
use super::types::RenewalFailure;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Default re-authentication entry point
pub const DEFAULT_REAUTH_PATH: &str = "/login";

/// Which message the UI should show after termination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The session was created by a registration moments ago
    RegistrationAuthError,
    /// An established session could not be renewed
    SessionExpired,
}

impl TerminationReason {
    pub fn as_query_value(&self) -> &'static str {
        match self {
            TerminationReason::RegistrationAuthError => "registration_auth_error",
            TerminationReason::SessionExpired => "session_expired",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

/// What caused the termination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationContext {
    /// Renewal failed, reactively or otherwise
    RenewalFailed(RenewalFailure),
    /// The server rejected a request with 401 or 403 and it will not be replayed
    AuthorizationFailure { status: u16, url: String },
}

/// Event handed to the navigation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTermination {
    pub reason: TerminationReason,
    /// Re-authentication target, e.g. `/login?reason=session_expired`
    pub redirect: String,
    pub context: TerminationContext,
}

/// Receiver of termination events (navigation, banners, exit codes)
pub trait TerminationSink: Send + Sync {
    fn on_terminated(&self, event: &SessionTermination);
}

/// Sink that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TerminationSink for TracingSink {
    fn on_terminated(&self, event: &SessionTermination) {
        warn!(
            reason = %event.reason,
            redirect = %event.redirect,
            "Session terminated: {:?}",
            event.context
        );
    }
}

/// Sink forwarding events over a channel to a UI loop
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<SessionTermination>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionTermination>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TerminationSink for ChannelSink {
    fn on_terminated(&self, event: &SessionTermination) {
        if self.sender.send(event.clone()).is_err() {
            warn!("Termination event dropped, receiver is gone");
        }
    }
}

/// Clears the session and signals re-authentication
#[derive(Clone)]
pub struct SessionTerminator {
    store: CredentialStore,
    sink: Arc<dyn TerminationSink>,
    reauth_path: String,
}

impl fmt::Debug for SessionTerminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTerminator")
            .field("reauth_path", &self.reauth_path)
            .finish_non_exhaustive()
    }
}

impl SessionTerminator {
    pub fn new(
        store: CredentialStore,
        sink: Arc<dyn TerminationSink>,
        reauth_path: impl Into<String>,
    ) -> Self {
        Self {
            store,
            sink,
            reauth_path: reauth_path.into(),
        }
    }

    fn redirect_for(&self, reason: TerminationReason) -> String {
        let separator = if self.reauth_path.contains('?') { '&' } else { '?' };
        format!(
            "{}{}reason={}",
            self.reauth_path,
            separator,
            reason.as_query_value()
        )
    }

    /// Clear stored credentials and notify the sink.
    ///
    /// Storage errors are logged; the sink is notified regardless.
    pub async fn terminate(&self, context: TerminationContext) -> SessionTermination {
        if let Err(e) = self.store.clear_session().await {
            warn!("Failed to clear session state: {}", e);
        }

        let registered = self.store.take_registration_marker().await.unwrap_or_else(|e| {
            warn!("Failed to read registration marker: {}", e);
            false
        });
        let reason = if registered {
            TerminationReason::RegistrationAuthError
        } else {
            TerminationReason::SessionExpired
        };

        let event = SessionTermination {
            reason,
            redirect: self.redirect_for(reason),
            context,
        };
        self.sink.on_terminated(&event);
        event
    }
}
