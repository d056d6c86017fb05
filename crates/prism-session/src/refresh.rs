//! Single-flight coordination of token refreshes.
//!
//! The first request that needs a refresh becomes the leader and performs
//! the `/auth/refresh` exchange. Requests that arrive while it is in flight
//! park on a oneshot channel and receive a clone of the leader's outcome.
//!
//! Each cycle walks `Idle -> Refreshing -> {Succeeded, Failed}` and is
//! discarded after broadcasting; the next 401 opens a fresh cycle. The
//! leader's [`RefreshGuard`] resets the slot on every exit path, so a
//! leader that panics or is cancelled releases its waiters with
//! [`RefreshError::Abandoned`].

use crate::{BearerToken, RefreshError};
use parking_lot::Mutex;
use rust_fsm::*;
use tokio::sync::oneshot;
use tracing::{debug, warn};

state_machine! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub refresh_cycle(Idle)

    Idle => {
        Unauthorized => Refreshing
    },
    Refreshing => {
        TokensIssued => Succeeded,
        RefreshRejected => Failed
    }
}

/// Result broadcast to every participant of a refresh cycle.
pub(crate) type RefreshOutcome = Result<BearerToken, RefreshError>;

type Waiters = Vec<oneshot::Sender<RefreshOutcome>>;

/// Holds the in-flight slot: `Some(waiters)` while a cycle runs.
#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    in_flight: Mutex<Option<Waiters>>,
}

/// Role assigned to a caller joining a refresh.
pub(crate) enum RefreshTicket<'a> {
    /// Perform the refresh, then call [`RefreshGuard::finish`].
    Leader(RefreshGuard<'a>),
    /// Await the leader's outcome.
    Follower(oneshot::Receiver<RefreshOutcome>),
}

impl RefreshCoordinator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Join the in-flight cycle, or open one and become its leader.
    pub(crate) fn join(&self) -> RefreshTicket<'_> {
        let mut slot = self.in_flight.lock();
        match slot.as_mut() {
            Some(waiters) => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                debug!(waiters = waiters.len(), "Joined in-flight refresh");
                RefreshTicket::Follower(rx)
            }
            None => {
                *slot = Some(Vec::new());
                RefreshTicket::Leader(RefreshGuard::new(self))
            }
        }
    }

    pub(crate) fn in_flight(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    /// Number of followers parked on the current cycle.
    pub(crate) fn waiters(&self) -> usize {
        self.in_flight.lock().as_ref().map_or(0, Vec::len)
    }

    fn take_waiters(&self) -> Waiters {
        self.in_flight.lock().take().unwrap_or_default()
    }
}

/// Leader's handle on a cycle. Dropping it unfinished abandons the cycle.
pub(crate) struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    cycle: refresh_cycle::StateMachine,
    finished: bool,
}

impl<'a> RefreshGuard<'a> {
    fn new(coordinator: &'a RefreshCoordinator) -> Self {
        let mut cycle = refresh_cycle::StateMachine::new();
        let _ = cycle.consume(&refresh_cycle::Input::Unauthorized);
        Self {
            coordinator,
            cycle,
            finished: false,
        }
    }

    pub(crate) fn state(&self) -> refresh_cycle::State {
        *self.cycle.state()
    }

    /// Close the cycle and hand `outcome` to every waiter.
    pub(crate) fn finish(mut self, outcome: RefreshOutcome) -> RefreshOutcome {
        let input = match outcome {
            Ok(_) => refresh_cycle::Input::TokensIssued,
            Err(_) => refresh_cycle::Input::RefreshRejected,
        };
        let _ = self.cycle.consume(&input);
        self.finished = true;

        let waiters = self.coordinator.take_waiters();
        debug!(
            state = ?self.cycle.state(),
            waiters = waiters.len(),
            "Refresh cycle finished"
        );
        for waiter in waiters {
            // A waiter whose request was dropped is not an error.
            let _ = waiter.send(outcome.clone());
        }
        outcome
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let waiters = self.coordinator.take_waiters();
        warn!(
            waiters = waiters.len(),
            "Refresh leader dropped before finishing; releasing waiters"
        );
        for waiter in waiters {
            let _ = waiter.send(Err(RefreshError::Abandoned));
        }
    }
}
