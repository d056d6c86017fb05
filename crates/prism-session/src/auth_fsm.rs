//! Session-level auth state, driven by a rust-fsm machine.
//!
//! ## Transitions
//!
//! ```text
//! ┌─────────────────┐  SessionRestored (stored credentials at startup)
//! │   NotLoggedIn   │ ─────────────────────────────────────┐
//! └────────┬────────┘                                      │
//!          │ LoginAttempt                                  │
//!          ▼                                               │
//! ┌─────────────────┐                                      │
//! │   LoggingIn     │ ── LoginFailed ──► NotLoggedIn       │
//! └────────┬────────┘                                      │
//!          │ LoginSuccess                                  │
//!          ▼                                               │
//! ┌─────────────────┐     TokenRejected   ┌─────────────────┐
//! │    LoggedIn     │ ──────────────────► │   Refreshing    │
//! │                 │ ◄────────────────── │                 │
//! └────────┬────────┘    RefreshSuccess   └────────┬────────┘
//!          │                                       │ RefreshFailed
//!          │ LogoutRequested                       ▼
//!          ▼                                  NotLoggedIn
//! ┌─────────────────┐
//! │  LoggingOut     │ ── LogoutComplete ──► NotLoggedIn
//! └─────────────────┘
//! ```
//!
//! `TokenRejected` is fed in when an API call comes back 401; the refresh
//! cycle that follows decides between `RefreshSuccess` and `RefreshFailed`.
//! A cycle abandoned midway feeds `SessionRestored` when the stored set is
//! still complete. `LoginAttempt` and `LogoutRequested` are also accepted
//! while `Refreshing`.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub auth_machine(NotLoggedIn)

    NotLoggedIn => {
        SessionRestored => LoggedIn,
        LoginAttempt => LoggingIn
    },
    LoggingIn => {
        LoginSuccess => LoggedIn,
        LoginFailed => NotLoggedIn
    },
    LoggedIn => {
        TokenRejected => Refreshing,
        LoginAttempt => LoggingIn,
        LogoutRequested => LoggingOut
    },
    Refreshing => {
        RefreshSuccess => LoggedIn,
        RefreshFailed => NotLoggedIn,
        SessionRestored => LoggedIn,
        LoginAttempt => LoggingIn,
        LogoutRequested => LoggingOut
    },
    LoggingOut => {
        LogoutComplete => NotLoggedIn
    }
}

pub use auth_machine::Input as AuthMachineInput;
pub use auth_machine::State as AuthMachineState;
pub use auth_machine::StateMachine as AuthMachine;

/// Authentication state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No stored session.
    NotLoggedIn,
    /// A password login is in flight.
    LoggingIn,
    /// Logged in with stored credentials.
    LoggedIn,
    /// A 401 was received and the token pair is being refreshed.
    Refreshing,
    /// Credentials are being cleared.
    LoggingOut,
}

impl AuthState {
    /// Returns true if the user has a usable session.
    ///
    /// `Refreshing` counts: the stored identity is intact while a new token
    /// pair is fetched.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::LoggedIn | AuthState::Refreshing)
    }

    /// An operation is in progress.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AuthState::LoggingIn | AuthState::Refreshing | AuthState::LoggingOut
        )
    }
}

impl From<&AuthMachineState> for AuthState {
    fn from(state: &AuthMachineState) -> Self {
        match state {
            AuthMachineState::NotLoggedIn => AuthState::NotLoggedIn,
            AuthMachineState::LoggingIn => AuthState::LoggingIn,
            AuthMachineState::LoggedIn => AuthState::LoggedIn,
            AuthMachineState::Refreshing => AuthState::Refreshing,
            AuthMachineState::LoggingOut => AuthState::LoggingOut,
        }
    }
}

/// Delivered to the state callback on every state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStateChangedPayload {
    pub state: AuthState,
    /// User email if a credential set is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name if a credential set is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::AuthMachineInput as In;
    use super::AuthMachineState as St;

    /// Feed `inputs` from the initial state; returns the state after each step.
    fn walk(inputs: &[In]) -> Vec<St> {
        let mut machine = AuthMachine::new();
        inputs
            .iter()
            .map(|input| {
                machine
                    .consume(input)
                    .unwrap_or_else(|_| panic!("{:?} rejected in {:?}", input, machine.state()));
                machine.state().clone()
            })
            .collect()
    }

    #[test]
    fn test_session_lifecycles() {
        let cases: &[(&[In], St)] = &[
            (&[In::LoginAttempt, In::LoginSuccess], St::LoggedIn),
            (&[In::LoginAttempt, In::LoginFailed], St::NotLoggedIn),
            (&[In::SessionRestored], St::LoggedIn),
            (
                &[In::SessionRestored, In::TokenRejected, In::RefreshSuccess],
                St::LoggedIn,
            ),
            (
                &[In::SessionRestored, In::TokenRejected, In::RefreshFailed],
                St::NotLoggedIn,
            ),
            (
                &[In::SessionRestored, In::LoginAttempt, In::LoginFailed, In::SessionRestored],
                St::LoggedIn,
            ),
            (
                &[In::SessionRestored, In::LogoutRequested, In::LogoutComplete],
                St::NotLoggedIn,
            ),
            (
                &[In::SessionRestored, In::TokenRejected, In::SessionRestored],
                St::LoggedIn,
            ),
            (
                &[In::SessionRestored, In::TokenRejected, In::LoginAttempt, In::LoginSuccess],
                St::LoggedIn,
            ),
        ];

        for (inputs, expected) in cases {
            assert_eq!(walk(inputs).last(), Some(expected), "inputs: {:?}", inputs);
        }
    }

    #[test]
    fn test_refresh_needs_a_session() {
        let mut machine = AuthMachine::new();
        for input in [In::TokenRejected, In::RefreshSuccess, In::RefreshFailed] {
            assert!(machine.consume(&input).is_err());
        }
        assert_eq!(*machine.state(), St::NotLoggedIn);
    }

    #[test]
    fn test_logout_wins_over_late_refresh() {
        let states = walk(&[In::SessionRestored, In::TokenRejected, In::LogoutRequested]);
        assert_eq!(states, vec![St::LoggedIn, St::Refreshing, St::LoggingOut]);

        let mut machine = AuthMachine::new();
        for input in [In::SessionRestored, In::TokenRejected, In::LogoutRequested] {
            machine.consume(&input).unwrap();
        }
        assert!(machine.consume(&In::RefreshSuccess).is_err());
        assert!(machine.consume(&In::RefreshFailed).is_err());
    }

    #[test]
    fn test_public_state_flags() {
        let authenticated: Vec<_> = [
            St::NotLoggedIn,
            St::LoggingIn,
            St::LoggedIn,
            St::Refreshing,
            St::LoggingOut,
        ]
        .iter()
        .map(AuthState::from)
        .filter(AuthState::is_authenticated)
        .collect();
        assert_eq!(authenticated, vec![AuthState::LoggedIn, AuthState::Refreshing]);

        assert!(AuthState::Refreshing.is_transient());
        assert!(!AuthState::LoggedIn.is_transient());
    }

    #[test]
    fn test_payload_serialization() {
        let payload = AuthStateChangedPayload {
            state: AuthState::NotLoggedIn,
            email: None,
            name: None,
        };
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"state":"not_logged_in"}"#
        );

        let payload = AuthStateChangedPayload {
            state: AuthState::LoggedIn,
            email: Some("mentor@prism.dev".to_string()),
            name: None,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"state": "logged_in", "email": "mentor@prism.dev"})
        );
    }
}
