//! Authenticated session layer for the PRISM REST API.
//!
//! This crate provides:
//! - [`SessionClient`]: bearer-token attachment, transparent refresh on 401,
//!   single-flight refresh coordination, and one-shot request replay
//! - Auth operations: login, OTP signup, profile, logout
//! - [`PrismApi`]: typed calls for worklets, feedback, evaluations, statistics
//! - Explicit FSM-based auth state with change notifications
//! - [`HttpTransport`]: the network seam, implemented over reqwest

mod api;
mod auth;
mod auth_fsm;
mod error;
mod models;
mod refresh;
mod request;
mod session;
mod transport;

#[cfg(test)]
mod tests;

pub use api::PrismApi;
pub use auth_fsm::auth_machine;
pub use auth_fsm::{
    AuthMachine, AuthMachineInput, AuthMachineState, AuthState, AuthStateChangedPayload,
};
pub use error::{AuthError, AuthResult, RefreshError};
pub use models::{
    AuthSnapshot, CompletedWorklet, EvaluationPerks, EvaluationSubmission, FeedbackSubmission,
    MentorProfile, MessageResponse, ProfileUpdate, ProfileUpdateResponse, ReferralSubmission,
    SuggestionSubmission, UpdatePriority, UserAccount, UserProfile,
};
pub use refresh::refresh_cycle;
pub use request::{ApiRequest, ApiResponse, BearerToken, RequestBody};
pub use session::{AuthStateCallback, SessionClient};
pub use transport::{resolve_url, HttpTransport, ReqwestTransport};

/// Path of the password login endpoint.
pub const LOGIN_PATH: &str = "/auth/login";
/// Path of the token refresh endpoint.
pub const REFRESH_PATH: &str = "/auth/refresh";
