//! II. Refresh coordination
//!
//! Rules:
//! - 10: Concurrent 401s share exactly one refresh call
//! - 11: A failed refresh is delivered to every waiting request
//! - 12: A finished cycle does not absorb later 401s; they open a new one
//! - 13: A leader that goes away releases its waiters with the original 401
//! - 14: An abandoned cycle leaves the auth state usable for a new login
//! - 15: Login is accepted while another request is refreshing

use super::harness::*;
use crate::{ApiRequest, AuthError, AuthState};
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;

const CONCURRENT_REQUESTS: usize = 6;

fn spawn_gets(h: &TestHarness, path: &'static str, n: usize) -> Vec<tokio::task::JoinHandle<crate::AuthResult<crate::ApiResponse>>> {
    (0..n)
        .map(|_| {
            let client = Arc::clone(&h.client);
            tokio::spawn(async move { client.send(ApiRequest::get(path)).await })
        })
        .collect()
}

/// Rule 10: Concurrent 401s share exactly one refresh call.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rule_10_concurrent_unauthorized_share_one_refresh() {
    let h = TestHarness::logged_in("A1", "R1");
    h.transport.protect("/worklets/", "A2", json!([]));
    h.transport.always("/auth/refresh", MockReply::tokens("A2", "R2"));
    h.transport.hold_refresh();

    let handles = spawn_gets(&h, "/worklets/", CONCURRENT_REQUESTS);

    // One leader is blocked in the refresh call; everyone else waits on it.
    h.wait_for_refresh_waiters(CONCURRENT_REQUESTS - 1).await;
    assert!(h.client.refresh_in_flight());
    assert_eq!(h.client.auth_state(), AuthState::Refreshing);

    h.transport.release_refresh();

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(h.transport.count("/auth/refresh"), 1);
    assert!(!h.client.refresh_in_flight());
    assert_eq!(h.client.auth_state(), AuthState::LoggedIn);

    let attempts = h.transport.requests_to("/worklets/");
    assert_eq!(attempts.len(), CONCURRENT_REQUESTS * 2);
    let retries: Vec<_> = attempts.iter().filter(|r| r.retried).collect();
    assert_eq!(retries.len(), CONCURRENT_REQUESTS);
    assert!(retries
        .iter()
        .all(|r| r.authorization.as_deref() == Some("Bearer A2")));

    let stored = h.credentials().unwrap();
    assert_eq!(stored.access_token, "A2");
    assert_eq!(stored.refresh_token, "R2");
}

/// Rule 11: A failed refresh is delivered to every waiting request.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rule_11_refresh_failure_reaches_every_waiter() {
    let h = TestHarness::logged_in("A1", "R1");
    h.transport.protect("/worklets/", "A2", json!([]));
    h.transport.always("/auth/refresh", MockReply::unauthorized());
    h.transport.hold_refresh();

    let handles = spawn_gets(&h, "/worklets/", CONCURRENT_REQUESTS);
    h.wait_for_refresh_waiters(CONCURRENT_REQUESTS - 1).await;
    h.transport.release_refresh();

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert!(
            matches!(err, AuthError::Unauthorized { ref url, .. } if url.ends_with("/worklets/")),
            "unexpected error: {err:?}"
        );
    }

    assert_eq!(h.transport.count("/auth/refresh"), 1);
    assert!(h
        .transport
        .requests_to("/worklets/")
        .iter()
        .all(|r| !r.retried));
    assert!(h.credentials().is_none());
    assert_eq!(h.client.auth_state(), AuthState::NotLoggedIn);
}

/// Rule 12: A finished cycle does not absorb later 401s; they open a new one.
#[tokio::test]
async fn rule_12_sequential_expiries_refresh_again() {
    let h = TestHarness::logged_in("A1", "R1");
    h.transport.always("/worklets/", MockReply::ok(json!([])));
    h.transport.queue("/worklets/", MockReply::unauthorized());
    h.transport.queue("/auth/refresh", MockReply::tokens("A2", "R2"));

    h.client.send(ApiRequest::get("/worklets/")).await.unwrap();
    assert_eq!(h.credentials().unwrap().access_token, "A2");

    h.transport.queue("/worklets/", MockReply::unauthorized());
    h.transport.queue("/auth/refresh", MockReply::tokens("A3", "R3"));

    h.client.send(ApiRequest::get("/worklets/")).await.unwrap();

    let refreshes = h.transport.requests_to("/auth/refresh");
    assert_eq!(refreshes.len(), 2);
    assert_eq!(refreshes[0].json_body(), Some(&json!({"refresh_token": "R1"})));
    assert_eq!(refreshes[1].json_body(), Some(&json!({"refresh_token": "R2"})));

    let stored = h.credentials().unwrap();
    assert_eq!((stored.access_token.as_str(), stored.refresh_token.as_str()), ("A3", "R3"));
}

/// Rule 13: A leader that goes away releases its waiters with the original 401.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rule_13_abandoned_leader_releases_waiters() {
    let h = TestHarness::logged_in("A1", "R1");
    h.transport.protect("/worklets/", "A2", json!([]));
    h.transport.always("/auth/refresh", MockReply::tokens("A2", "R2"));
    h.transport.hold_refresh();

    let leader = spawn_gets(&h, "/worklets/", 1).remove(0);
    h.wait_for_refresh_start().await;

    let follower = spawn_gets(&h, "/worklets/", 1).remove(0);
    h.wait_for_refresh_waiters(1).await;

    leader.abort();
    assert!(leader.await.unwrap_err().is_cancelled());

    let err = follower.await.unwrap().unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized { .. }));

    // Nothing was decided about the session, so it is kept.
    assert!(!h.client.refresh_in_flight());
    assert_eq!(h.credentials().unwrap().access_token, "A1");
}

/// Rule 14: An abandoned cycle leaves the auth state usable for a new login.
#[tokio::test]
async fn rule_14_abandoned_cycle_settles_auth_state() {
    let h = TestHarness::logged_in("A1", "R1");
    h.transport.protect("/worklets/", "A2", json!([]));
    h.transport.always("/auth/refresh", MockReply::tokens("A2", "R2"));
    h.transport.always("/auth/login", MockReply::tokens("B1", "S1"));
    h.transport.hold_refresh();

    let leader = spawn_gets(&h, "/worklets/", 1).remove(0);
    h.wait_for_refresh_start().await;
    assert_eq!(h.client.auth_state(), AuthState::Refreshing);

    leader.abort();
    assert!(leader.await.unwrap_err().is_cancelled());

    assert!(!h.client.refresh_in_flight());
    assert_eq!(h.client.auth_state(), AuthState::LoggedIn);
    let status = h.client.status().unwrap();
    assert_eq!(status.state, AuthState::LoggedIn);
    assert!(status.authenticated);

    let states: Vec<_> = h.transitions().into_iter().map(|t| t.state).collect();
    assert_eq!(states, vec![AuthState::Refreshing, AuthState::LoggedIn]);

    let snapshot = h.client.login(USER_EMAIL, "hunter2", None).await.unwrap();
    assert_eq!(snapshot.state, AuthState::LoggedIn);
    assert_eq!(h.credentials().unwrap().access_token, "B1");
}

/// Rule 15: Login is accepted while another request is refreshing.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rule_15_login_during_refresh() {
    let h = TestHarness::logged_in("A1", "R1");
    h.transport.protect("/worklets/", "A2", json!([]));
    h.transport.always("/auth/refresh", MockReply::tokens("A2", "R2"));
    h.transport.always("/auth/login", MockReply::tokens("B1", "S1"));
    h.transport.hold_refresh();

    let pending = spawn_gets(&h, "/worklets/", 1).remove(0);
    h.wait_for_refresh_start().await;

    let snapshot = h.client.login(USER_EMAIL, "hunter2", None).await.unwrap();
    assert_eq!(snapshot.state, AuthState::LoggedIn);

    h.transport.release_refresh();
    let response = pending.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(h.client.auth_state(), AuthState::LoggedIn);
}
