//! Wire types for the PRISM REST API.

use crate::AuthState;
use serde::{Deserialize, Serialize};

/// `{ "message": ... }` acknowledgement returned by the signup endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Token pair as returned by `/auth/login` and `/auth/refresh`.
///
/// Fields are optional so a response missing one decodes and is rejected
/// by the caller rather than failing inside serde.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TokenPayload {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct OtpRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub role: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct OtpVerification<'a> {
    pub email: &'a str,
    pub otp_code: &'a str,
}

#[derive(Serialize)]
pub(crate) struct SetPasswordRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: &'a str,
}

/// A PRISM user as returned by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Mentor-specific profile details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentorProfile {
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub expertise: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

/// `/auth/profile`: the account plus a mentor profile for mentors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub account: UserAccount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentor_profile: Option<MentorProfile>,
}

/// Fields accepted by `PUT /auth/me/profile`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Response of `PUT /auth/me/profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub user: UserAccount,
}

/// Local view of the session: FSM state plus the stored identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSnapshot {
    pub state: AuthState,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Urgency attached to an update request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateRequest<'a> {
    pub message: &'a str,
    pub priority: UpdatePriority,
}

/// Body of `POST /worklets/submit-feedback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub worklet_id: i64,
    pub feedback_type: String,
    pub feedback_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

/// Body of `POST /worklets/submit-suggestion-flexible`.
///
/// `worklet_identifier` is either the numeric id or the certificate id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSubmission {
    pub worklet_identifier: String,
    pub suggestion_title: String,
    pub suggestion_content: String,
}

/// Body of `POST /worklets/internship-referral`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralSubmission {
    pub worklet_id: i64,
    /// Student emails.
    pub selected_students: Vec<String>,
    pub referral_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_title: Option<String>,
}

/// A finished worklet, the candidates for an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedWorklet {
    pub id: i64,
    pub cert_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Rewards granted with an evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPerks {
    #[serde(default)]
    pub points_awarded: u32,
    #[serde(default)]
    pub certificate_type: String,
    #[serde(default)]
    pub recommendation_letter: bool,
    #[serde(default)]
    pub internship_opportunity: bool,
    #[serde(default)]
    pub bonus_credits: u32,
    #[serde(default)]
    pub special_recognition: String,
    #[serde(default)]
    pub mentorship_extension: bool,
}

/// Body of `POST /evaluations/submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSubmission {
    pub worklet_id: i64,
    pub performance_rating: String,
    pub completion_quality: String,
    pub innovation_score: String,
    pub teamwork_rating: String,
    #[serde(default)]
    pub perks: EvaluationPerks,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub feedback: String,
    pub evaluated_by: String,
    /// RFC 3339 timestamp.
    pub evaluation_date: String,
}
