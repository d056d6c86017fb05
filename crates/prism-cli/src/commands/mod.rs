//! CLI command implementations.

mod auth;
mod worklets;

pub use auth::{
    login, logout, profile_show, profile_update, signup_complete, signup_request_otp,
    signup_verify_otp, status, whoami, ProfileArgs,
};
pub use worklets::{
    evaluate, feedback, refer, request_update, stats_dashboard, stats_mentor, suggest,
    worklets_associations, worklets_completed, worklets_list, worklets_mentor, worklets_ongoing,
    worklets_show, worklets_students, EvaluateArgs, ReferArgs,
};

use anyhow::{Context as _, Result};
use prism_config::{Config, Paths};
use prism_session::{PrismApi, SessionClient};
use std::sync::Arc;
use tracing::debug;

/// Shared state for one CLI invocation.
pub struct Context {
    session: Arc<SessionClient>,
}

impl Context {
    pub fn new(config: Config, paths: Paths) -> Result<Self> {
        let session = SessionClient::from_config(&config, &paths)
            .with_context(|| format!("cannot set up session for {}", config.api_url))?;
        debug!(
            api_url = %session.base_url(),
            base_dir = %paths.base_dir().display(),
            "CLI session ready"
        );
        Ok(Self {
            session: Arc::new(session),
        })
    }

    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    pub fn api(&self) -> PrismApi {
        PrismApi::new(Arc::clone(&self.session))
    }

    /// Email of the stored session.
    pub fn current_email(&self) -> Result<String> {
        self.session
            .status()?
            .email
            .context("not logged in; run 'prism login' first")
    }
}

/// Use the given password or prompt for one without echo.
fn password_or_prompt(password: Option<String>) -> Result<String> {
    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}
