//! Account operations: login, OTP signup, profile, logout.

use crate::auth_fsm::AuthMachineInput;
use crate::models::{
    AuthSnapshot, MessageResponse, OtpRequest, OtpVerification, ProfileUpdate,
    ProfileUpdateResponse, SetPasswordRequest, TokenPayload, UserAccount, UserProfile,
};
use crate::{ApiRequest, AuthError, AuthResult, BearerToken, SessionClient, LOGIN_PATH};
use prism_storage::{Credentials, TokenPair};
use tracing::{debug, info, warn};

const ME_PATH: &str = "/auth/me";
const PROFILE_PATH: &str = "/auth/profile";
const PROFILE_UPDATE_PATH: &str = "/auth/me/profile";
const REQUEST_OTP_PATH: &str = "/auth/request-otp";
const VERIFY_OTP_PATH: &str = "/auth/verify-otp";
const SET_PASSWORD_PATH: &str = "/auth/set-password";

impl SessionClient {
    /// Login with email and password.
    ///
    /// Uses the FSM to track the login operation:
    /// - NotLoggedIn/LoggedIn -> LoggingIn -> (LoggedIn | NotLoggedIn)
    ///
    /// `role` travels in the OAuth2 `scope` field. On success the whole
    /// credential set is stored; the display name comes from `/auth/me`
    /// and falls back to the email.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> AuthResult<AuthSnapshot> {
        self.transition(&AuthMachineInput::LoginAttempt)?;

        match self.perform_login(email, password, role).await {
            Ok(credentials) => {
                self.transition(&AuthMachineInput::LoginSuccess)?;
                info!(user_email = %credentials.user_email, "Login successful");
                self.status()
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                let _ = self.transition(&AuthMachineInput::LoginFailed);
                // A failed re-login leaves an earlier session in place.
                if matches!(self.store().load(), Ok(Some(_))) {
                    let _ = self.transition(&AuthMachineInput::SessionRestored);
                }
                Err(e)
            }
        }
    }

    async fn perform_login(
        &self,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> AuthResult<Credentials> {
        let mut form = vec![("username", email), ("password", password)];
        if let Some(role) = role.filter(|r| !r.is_empty()) {
            form.push(("scope", role));
        }

        debug!(user_email = %email, "Attempting password login");

        let response = match self.send(ApiRequest::post(LOGIN_PATH).form(form)).await {
            Ok(response) => response,
            Err(AuthError::Unauthorized { .. }) => {
                return Err(AuthError::InvalidCredentials(
                    "email or password rejected".to_string(),
                ))
            }
            Err(e) => return Err(e),
        };
        let response = response.error_for_status()?;

        let payload: TokenPayload = response.json()?;
        let tokens = TokenPair::new(
            payload.access_token.unwrap_or_default(),
            payload.refresh_token.unwrap_or_default(),
        )
        .ok_or_else(|| AuthError::InvalidResponse("login response missing tokens".to_string()))?;

        let user_name = self
            .lookup_display_name(&tokens.access_token)
            .await
            .unwrap_or_else(|| email.to_string());

        let credentials = Credentials::new(tokens, email, user_name);
        self.store().save(&credentials)?;
        Ok(credentials)
    }

    /// Fetch the display name with a freshly issued token. Best effort.
    async fn lookup_display_name(&self, access_token: &str) -> Option<String> {
        let bearer = BearerToken::new(access_token)?;
        let request = ApiRequest::get(ME_PATH).bearer(&bearer);

        match self.execute_raw(&request).await {
            Ok(response) if response.is_success() => response
                .json::<UserAccount>()
                .ok()
                .map(|user| user.name)
                .filter(|name| !name.trim().is_empty()),
            Ok(response) => {
                debug!(status = %response.status(), "Display name lookup failed");
                None
            }
            Err(e) => {
                debug!(error = %e, "Display name lookup failed");
                None
            }
        }
    }

    /// Ask the server to email a signup OTP.
    pub async fn request_otp(&self, name: &str, email: &str, role: &str) -> AuthResult<MessageResponse> {
        let request = ApiRequest::post(REQUEST_OTP_PATH).json(&OtpRequest { name, email, role })?;
        self.send_json(request).await
    }

    /// Confirm the emailed OTP.
    pub async fn verify_otp(&self, email: &str, otp_code: &str) -> AuthResult<MessageResponse> {
        let request =
            ApiRequest::post(VERIFY_OTP_PATH).json(&OtpVerification { email, otp_code })?;
        self.send_json(request).await
    }

    /// Create the account after OTP verification.
    pub async fn set_password(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> AuthResult<MessageResponse> {
        let request = ApiRequest::post(SET_PASSWORD_PATH).json(&SetPasswordRequest {
            name,
            email,
            password,
            role,
        })?;
        self.send_json(request).await
    }

    /// Final signup step: set the password, then log in with it.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> AuthResult<AuthSnapshot> {
        let created = self.set_password(name, email, password, role).await?;
        info!(user_email = %email, message = %created.message, "Account created");
        self.login(email, password, Some(role)).await
    }

    /// Current user from `/auth/me`.
    pub async fn me(&self) -> AuthResult<UserAccount> {
        self.require_session()?;
        self.send_json(ApiRequest::get(ME_PATH)).await
    }

    /// Full profile from `/auth/profile`.
    pub async fn profile(&self) -> AuthResult<UserProfile> {
        self.require_session()?;
        self.send_json(ApiRequest::get(PROFILE_PATH)).await
    }

    /// Update the current user's profile and keep the stored name in sync.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> AuthResult<ProfileUpdateResponse> {
        self.require_session()?;
        let request = ApiRequest::put(PROFILE_UPDATE_PATH).json(update)?;
        let response: ProfileUpdateResponse = self.send_json(request).await?;

        if !response.user.name.trim().is_empty() && !self.store().set_user_name(&response.user.name)? {
            debug!("Profile updated but no stored session to rename");
        }
        Ok(response)
    }

    /// Logout by clearing all session data.
    ///
    /// Uses the FSM to track the logout operation:
    /// - LoggedIn/Refreshing -> LoggingOut -> NotLoggedIn
    pub fn logout(&self) -> AuthResult<()> {
        // Storage is cleared regardless of the current state.
        let _ = self.transition(&AuthMachineInput::LogoutRequested);

        self.store().clear()?;

        let _ = self.transition(&AuthMachineInput::LogoutComplete);

        info!("Logged out");
        Ok(())
    }

    /// Snapshot of the local session.
    pub fn status(&self) -> AuthResult<AuthSnapshot> {
        let credentials = self.store().load()?;
        Ok(AuthSnapshot {
            state: self.auth_state(),
            authenticated: credentials.is_some(),
            email: credentials.as_ref().map(|c| c.user_email.clone()),
            name: credentials.map(|c| c.user_name),
        })
    }

    fn require_session(&self) -> AuthResult<()> {
        match self.store().load()? {
            Some(_) => Ok(()),
            None => Err(AuthError::NotLoggedIn),
        }
    }
}
