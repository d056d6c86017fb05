//! Authenticated session client.
//!
//! Every outbound call passes through [`SessionClient::send`], which:
//! 1. attaches `Authorization: Bearer <access_token>` when the request has
//!    none and a token is stored;
//! 2. passes non-401 responses (and transport errors) straight through;
//! 3. on a first 401 outside the auth endpoints, joins or starts the single
//!    in-flight refresh and replays the request once with the new token;
//! 4. when the refresh fails, clears the stored credential set, moves the
//!    auth FSM to `NotLoggedIn` and surfaces the original 401.

use crate::auth_fsm::{AuthMachine, AuthMachineInput, AuthState, AuthStateChangedPayload};
use crate::models::{RefreshRequest, TokenPayload};
use crate::refresh::{RefreshCoordinator, RefreshOutcome, RefreshTicket};
use crate::transport::{resolve_url, HttpTransport, ReqwestTransport};
use crate::{
    ApiRequest, ApiResponse, AuthError, AuthResult, BearerToken, RefreshError, LOGIN_PATH,
    REFRESH_PATH,
};
use parking_lot::Mutex;
use prism_config::{Config, Paths};
use prism_storage::{CredentialStore, FileStorage, TokenPair};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

/// Receives every auth state change along with the stored identity.
pub type AuthStateCallback = Box<dyn Fn(AuthStateChangedPayload) + Send + Sync>;

type SharedCallback = Arc<dyn Fn(AuthStateChangedPayload) + Send + Sync>;

/// Session client shared by every API call of one application.
pub struct SessionClient {
    base_url: Url,
    transport: Arc<dyn HttpTransport>,
    store: Arc<CredentialStore>,
    refresh: RefreshCoordinator,
    fsm: Mutex<AuthMachine>,
    state_callback: Mutex<Option<SharedCallback>>,
}

impl SessionClient {
    /// Create a session client.
    ///
    /// The FSM starts in `LoggedIn` when the store already holds a complete
    /// credential set, `NotLoggedIn` otherwise.
    pub fn new(base_url: Url, transport: Arc<dyn HttpTransport>, store: Arc<CredentialStore>) -> Self {
        let mut fsm = AuthMachine::new();
        match store.load() {
            Ok(Some(credentials)) => {
                let _ = fsm.consume(&AuthMachineInput::SessionRestored);
                debug!(user_email = %credentials.user_email, "Restored stored session");
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not read stored credentials"),
        }

        Self {
            base_url,
            transport,
            store,
            refresh: RefreshCoordinator::new(),
            fsm: Mutex::new(fsm),
            state_callback: Mutex::new(None),
        }
    }

    /// Build a client from configuration: reqwest transport and a credential
    /// file under the configured base directory.
    pub fn from_config(config: &Config, paths: &Paths) -> AuthResult<Self> {
        paths.ensure_dirs()?;
        let transport = ReqwestTransport::new(config.request_timeout())?;
        let store = CredentialStore::new(Box::new(FileStorage::new(paths.credentials_file())));
        Ok(Self::new(
            config.api_url()?,
            Arc::new(transport),
            Arc::new(store),
        ))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Replaces any earlier callback.
    pub fn set_state_callback(&self, callback: AuthStateCallback) {
        *self.state_callback.lock() = Some(Arc::from(callback));
    }

    pub fn auth_state(&self) -> AuthState {
        AuthState::from(self.fsm.lock().state())
    }

    /// Whether a refresh cycle is currently in flight.
    pub fn refresh_in_flight(&self) -> bool {
        self.refresh.in_flight()
    }

    /// Number of requests parked on the in-flight refresh (excluding its leader).
    pub fn pending_refresh_waiters(&self) -> usize {
        self.refresh.waiters()
    }

    /// Feed `input` to the auth machine. The state callback fires only
    /// when the state actually changes, after the FSM lock is released.
    pub(crate) fn transition(&self, input: &AuthMachineInput) -> AuthResult<AuthState> {
        let (before, after) = {
            let mut fsm = self.fsm.lock();
            let before = AuthState::from(fsm.state());
            if fsm.consume(input).is_err() {
                return Err(AuthError::InvalidStateTransition(format!(
                    "{input:?} not allowed while {before:?}"
                )));
            }
            (before, AuthState::from(fsm.state()))
        };

        if before != after {
            debug!(from = ?before, to = ?after, "auth state changed");
            self.notify_state_change(after);
        }
        Ok(after)
    }

    /// Runs the callback outside the lock so it may call back into the client.
    fn notify_state_change(&self, state: AuthState) {
        let Some(callback) = self.state_callback.lock().clone() else {
            return;
        };
        let identity = self.store.load().ok().flatten();
        callback(AuthStateChangedPayload {
            state,
            email: identity.as_ref().map(|c| c.user_email.clone()),
            name: identity.map(|c| c.user_name),
        });
    }

    /// Resolve a request target against the base URL.
    pub fn url_for(&self, target: &str) -> AuthResult<Url> {
        resolve_url(&self.base_url, target)
    }

    /// Attach the stored access token unless the request already carries
    /// an Authorization header. Never fails: without a usable token the
    /// request goes out unauthenticated.
    pub fn attach_token(&self, request: ApiRequest) -> ApiRequest {
        if request.has_authorization() {
            return request;
        }

        match self.store.access_token() {
            Ok(Some(token)) => match BearerToken::new(&token) {
                Some(bearer) => request.bearer(&bearer),
                None => {
                    warn!("Stored access token is not a valid header value; sending unauthenticated");
                    request
                }
            },
            Ok(None) => request,
            Err(e) => {
                warn!(error = %e, "Could not read access token; sending unauthenticated");
                request
            }
        }
    }

    /// Send a request through the session layer.
    ///
    /// Non-401 responses are returned as-is, whatever their status. A 401
    /// is answered by at most one refresh and one replay; if that does not
    /// succeed the caller gets [`AuthError::Unauthorized`] describing the
    /// original 401.
    pub async fn send(&self, request: ApiRequest) -> AuthResult<ApiResponse> {
        let url = self.url_for(request.target())?;
        let mut request = self.attach_token(request);

        loop {
            let response = self.transport.execute(url.clone(), &request).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            let unauthorized = AuthError::Unauthorized {
                method: request.method().to_string(),
                url: url.to_string(),
                body_summary: response.body_summary(),
            };

            if request.is_retried() {
                warn!(method = %request.method(), url = %url, "Request rejected again after refresh");
                return Err(unauthorized);
            }
            if is_auth_endpoint(&url) {
                debug!(url = %url, "401 from auth endpoint; not refreshing");
                return Err(unauthorized);
            }

            debug!(method = %request.method(), url = %url, "Received 401; refreshing session");
            match self.refresh_bearer().await {
                Ok(bearer) => {
                    request = request.into_retry().bearer(&bearer);
                }
                Err(e) => {
                    warn!(error = %e, url = %url, "Session refresh failed");
                    return Err(unauthorized);
                }
            }
        }
    }

    /// Send a request and decode a 2xx JSON body; other statuses become
    /// [`AuthError::Api`].
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> AuthResult<T> {
        let method = request.method().clone();
        let target = request.target().to_string();
        let response = self.send(request).await?;

        if !response.is_success() {
            let status = response.status();
            let body_summary = response.body_summary();
            error!(
                method = %method,
                target = %target,
                status = %status,
                body_summary = %body_summary,
                "PRISM API request failed"
            );
            return Err(AuthError::Api {
                status: status.as_u16(),
                body_summary,
            });
        }

        response.json()
    }

    /// Force a refresh, joining one already in flight.
    pub async fn refresh(&self) -> AuthResult<()> {
        self.refresh_bearer().await?;
        Ok(())
    }

    /// Join the in-flight refresh or lead a new one.
    async fn refresh_bearer(&self) -> RefreshOutcome {
        match self.refresh.join() {
            RefreshTicket::Follower(rx) => rx.await.unwrap_or(Err(RefreshError::Abandoned)),
            RefreshTicket::Leader(guard) => {
                let outcome = self.run_refresh().await;
                guard.finish(outcome)
            }
        }
    }

    /// Leader side of a cycle: exchange tokens, then settle auth state.
    async fn run_refresh(&self) -> RefreshOutcome {
        let _ = self.transition(&AuthMachineInput::TokenRejected);
        let settle = SettleOnAbandon {
            client: self,
            armed: true,
        };

        let outcome = self.exchange_refresh_token().await;
        settle.disarm();
        match &outcome {
            Ok(_) => {
                let _ = self.transition(&AuthMachineInput::RefreshSuccess);
                info!("Token refreshed successfully");
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed; clearing credentials");
                if let Err(clear_err) = self.store.clear() {
                    error!(error = %clear_err, "Failed to clear credentials after refresh failure");
                }
                if self.transition(&AuthMachineInput::RefreshFailed).is_err() {
                    debug!(state = ?self.auth_state(), "Auth state left unchanged after refresh failure");
                }
            }
        }
        outcome
    }

    /// POST the stored refresh token and persist the new pair.
    async fn exchange_refresh_token(&self) -> RefreshOutcome {
        let refresh_token = match self.store.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => return Err(RefreshError::MissingRefreshToken),
            Err(e) => return Err(RefreshError::Storage(e.to_string())),
        };

        let url = self
            .url_for(REFRESH_PATH)
            .map_err(|e| RefreshError::Transport(e.to_string()))?;
        let request = ApiRequest::post(REFRESH_PATH)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        debug!(url = %url, "Refreshing token");

        let response = self
            .transport
            .execute(url, &request)
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        if !response.is_success() {
            let status = response.status();
            warn!(
                status = %status,
                body_summary = %response.body_summary(),
                "Token refresh rejected"
            );
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
            });
        }

        let payload: TokenPayload =
            response.json().map_err(|_| RefreshError::MalformedPayload)?;
        let tokens = TokenPair::new(
            payload.access_token.unwrap_or_default(),
            payload.refresh_token.unwrap_or_default(),
        )
        .ok_or(RefreshError::MalformedPayload)?;
        let bearer = BearerToken::new(&tokens.access_token).ok_or(RefreshError::MalformedPayload)?;

        match self.store.rotate_tokens(&tokens) {
            Ok(true) => Ok(bearer),
            Ok(false) => Err(RefreshError::SessionCleared),
            Err(e) => Err(RefreshError::Storage(e.to_string())),
        }
    }

    /// Execute on the transport without interception.
    pub(crate) async fn execute_raw(&self, request: &ApiRequest) -> AuthResult<ApiResponse> {
        let url = self.url_for(request.target())?;
        self.transport.execute(url, request).await
    }
}

/// Requests to these endpoints never trigger a refresh.
fn is_auth_endpoint(url: &Url) -> bool {
    let path = url.path().trim_end_matches('/');
    path.ends_with(LOGIN_PATH) || path.ends_with(REFRESH_PATH)
}

/// Moves the auth state out of `Refreshing` when the leader is cancelled
/// or panics before the exchange finishes.
struct SettleOnAbandon<'a> {
    client: &'a SessionClient,
    armed: bool,
}

impl SettleOnAbandon<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SettleOnAbandon<'_> {
    fn drop(&mut self) {
        if !self.armed || self.client.auth_state() != AuthState::Refreshing {
            return;
        }
        // Abandoned cycles keep the store, so a complete set means still logged in.
        let input = match self.client.store.load() {
            Ok(Some(_)) => AuthMachineInput::SessionRestored,
            _ => AuthMachineInput::RefreshFailed,
        };
        warn!(input = ?input, "Refresh abandoned; settling auth state");
        let _ = self.client.transition(&input);
    }
}
