//! Integration tests for the session layer.
//!
//! - `harness.rs`         - Scripted mock transport and session fixtures
//! - `interception.rs`    - I. Request/response interception (token attachment, pass-through)
//! - `single_flight.rs`   - II. Refresh coordination (one refresh per cycle, broadcast, abandonment)
//! - `retry_limits.rs`    - III. Loop prevention (retried marker, auth endpoints, missing token)
//! - `refresh_failure.rs` - IV. Failure handling (all-or-nothing clear, original error, logout)
//! - `scenarios.rs`       - V. End-to-end flows (login, refresh, signup, profile, resources)

mod single_flight;
