//! PRISM REST resource client.
//!
//! Thin typed wrappers over [`SessionClient::send_json`]. Worklet,
//! association and statistics payloads are loosely shaped on the server
//! side, so they are returned as `serde_json::Value`.

use crate::models::UpdateRequest;
use crate::{
    ApiRequest, AuthError, AuthResult, CompletedWorklet, EvaluationSubmission, FeedbackSubmission,
    ReferralSubmission, SessionClient, SuggestionSubmission, UpdatePriority,
};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Build an absolute API path from raw segments, escaping each one.
fn resource_path(segments: &[&str]) -> AuthResult<String> {
    let mut url = Url::parse("http://prism.invalid/")?;
    url.path_segments_mut()
        .map_err(|_| AuthError::Config("cannot build resource path".to_string()))?
        .clear()
        .extend(segments);
    Ok(url.path().to_string())
}

/// Client for the PRISM worklet, evaluation and dashboard endpoints.
#[derive(Clone)]
pub struct PrismApi {
    session: Arc<SessionClient>,
}

impl PrismApi {
    pub fn new(session: Arc<SessionClient>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<SessionClient> {
        &self.session
    }

    async fn get(&self, segments: &[&str]) -> AuthResult<Value> {
        let path = resource_path(segments)?;
        self.session.send_json(ApiRequest::get(path)).await
    }

    async fn post<T: serde::Serialize + ?Sized>(&self, segments: &[&str], body: &T) -> AuthResult<Value> {
        let path = resource_path(segments)?;
        self.session
            .send_json(ApiRequest::post(path).json(body)?)
            .await
    }

    /// All worklets.
    pub async fn worklets(&self) -> AuthResult<Value> {
        self.get(&["worklets", ""]).await
    }

    /// One worklet by numeric id or certificate id.
    pub async fn worklet(&self, identifier: &str) -> AuthResult<Value> {
        self.get(&["worklets", identifier]).await
    }

    /// Worklets mentored by `email`.
    pub async fn mentor_worklets(&self, email: &str) -> AuthResult<Value> {
        self.get(&["worklets", "mentor", email, "worklets"]).await
    }

    /// Students assigned to a worklet.
    pub async fn worklet_students(&self, identifier: &str) -> AuthResult<Value> {
        self.get(&["worklets", identifier, "students"]).await
    }

    /// Ask a worklet's students for a progress update.
    pub async fn request_update(
        &self,
        identifier: &str,
        message: &str,
        priority: UpdatePriority,
    ) -> AuthResult<Value> {
        self.post(
            &["worklets", identifier, "request-update"],
            &UpdateRequest { message, priority },
        )
        .await
    }

    pub async fn submit_feedback(&self, feedback: &FeedbackSubmission) -> AuthResult<Value> {
        self.post(&["worklets", "submit-feedback"], feedback).await
    }

    pub async fn submit_suggestion(&self, suggestion: &SuggestionSubmission) -> AuthResult<Value> {
        self.post(&["worklets", "submit-suggestion-flexible"], suggestion)
            .await
    }

    /// Refer students of a worklet for an internship.
    pub async fn submit_referral(&self, referral: &ReferralSubmission) -> AuthResult<Value> {
        self.post(&["worklets", "internship-referral"], referral).await
    }

    /// Completed worklets a mentor can evaluate.
    pub async fn completed_worklets(&self, mentor_email: &str) -> AuthResult<Vec<CompletedWorklet>> {
        let path = resource_path(&["worklets", "completed", mentor_email])?;
        self.session.send_json(ApiRequest::get(path)).await
    }

    pub async fn submit_evaluation(&self, evaluation: &EvaluationSubmission) -> AuthResult<Value> {
        self.post(&["evaluations", "submit"], evaluation).await
    }

    /// Statistics for the logged-in mentor.
    pub async fn mentor_statistics(&self) -> AuthResult<Value> {
        self.get(&["api", "dashboard", "mentor-statistics"]).await
    }

    /// Platform-wide dashboard statistics.
    pub async fn dashboard_statistics(&self) -> AuthResult<Value> {
        self.get(&["api", "dashboard", "statistics"]).await
    }

    /// Ongoing worklets of a mentor, by user id.
    pub async fn ongoing_worklets(&self, mentor_id: i64) -> AuthResult<Value> {
        let mentor_id = mentor_id.to_string();
        self.get(&["api", "associations", "mentor", mentor_id.as_str(), "ongoing-worklets"])
            .await
    }

    /// Users associated with a worklet.
    pub async fn worklet_associations(&self, worklet_id: i64) -> AuthResult<Value> {
        let worklet_id = worklet_id.to_string();
        self.get(&["api", "associations", "worklet", worklet_id.as_str()]).await
    }
}
