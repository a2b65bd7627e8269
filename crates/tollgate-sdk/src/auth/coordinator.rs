//! Single-flight refresh coordination
//!
//! At most one renewal runs at a time. Callers arriving while a renewal is in
//! flight are queued and receive that renewal's outcome, in arrival order,
//! once it settles.
//!
//! The check of the state and the transition to `InFlight` happen under one
//! lock acquisition before the renewal future is first polled, so two callers
//! can never both observe `Idle` and start separate renewals.

use super::refresh::Renewer;
use super::types::RenewalFailure;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Outcome delivered to every participant of a renewal
pub type RenewalOutcome = Result<String, RenewalFailure>;

enum State {
    Idle,
    InFlight {
        waiters: Vec<oneshot::Sender<RenewalOutcome>>,
    },
}

/// Gate ensuring a single outstanding renewal
pub struct RefreshCoordinator {
    renewer: Arc<dyn Renewer>,
    state: Mutex<State>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("idle", &self.is_idle())
            .field("waiters", &self.waiter_count())
            .finish()
    }
}

enum Role {
    Leader,
    Waiter(oneshot::Receiver<RenewalOutcome>),
}

impl RefreshCoordinator {
    pub fn new(renewer: Arc<dyn Renewer>) -> Self {
        Self {
            renewer,
            state: Mutex::new(State::Idle),
        }
    }

    // The state is only touched in short non-async sections, so a poisoned
    // lock still holds a consistent value.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether no renewal is currently in flight
    pub fn is_idle(&self) -> bool {
        matches!(*self.lock(), State::Idle)
    }

    /// Number of callers queued behind the in-flight renewal
    pub fn waiter_count(&self) -> usize {
        match &*self.lock() {
            State::Idle => 0,
            State::InFlight { waiters } => waiters.len(),
        }
    }

    /// Obtain a fresh access token, renewing at most once across concurrent callers.
    pub async fn coordinate_refresh(&self) -> RenewalOutcome {
        match self.enter() {
            Role::Leader => self.lead().await,
            Role::Waiter(receiver) => {
                debug!("Renewal already in flight, waiting for its outcome");
                receiver.await.unwrap_or(Err(RenewalFailure::Abandoned))
            }
        }
    }

    fn enter(&self) -> Role {
        let mut state = self.lock();
        match &mut *state {
            State::Idle => {
                *state = State::InFlight {
                    waiters: Vec::new(),
                };
                Role::Leader
            }
            State::InFlight { waiters } => {
                let (sender, receiver) = oneshot::channel();
                waiters.push(sender);
                Role::Waiter(receiver)
            }
        }
    }

    async fn lead(&self) -> RenewalOutcome {
        let mut guard = SettleGuard {
            coordinator: self,
            settled: false,
        };

        let outcome = self.renewer.renew().await;
        guard.settle(&outcome);
        outcome
    }

    /// Return to `Idle` and hand `outcome` to every queued waiter, oldest first.
    fn settle(&self, outcome: &RenewalOutcome) {
        let waiters = match std::mem::replace(&mut *self.lock(), State::Idle) {
            State::InFlight { waiters } => waiters,
            State::Idle => Vec::new(),
        };

        debug!("Renewal settled, notifying {} waiter(s)", waiters.len());
        for waiter in waiters {
            // A waiter that went away no longer needs the outcome
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Releases waiters if the leading future is dropped before the renewal settles.
struct SettleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl SettleGuard<'_> {
    fn settle(&mut self, outcome: &RenewalOutcome) {
        self.settled = true;
        self.coordinator.settle(outcome);
    }
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Renewal dropped before settling, releasing waiters");
            self.coordinator.settle(&Err(RenewalFailure::Abandoned));
        }
    }
}
