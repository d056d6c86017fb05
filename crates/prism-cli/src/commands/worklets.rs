//! Worklet, evaluation and statistics commands.

use super::Context;
use crate::output;
use anyhow::Result;
use clap::Args;
use prism_session::{
    EvaluationPerks, EvaluationSubmission, FeedbackSubmission, ReferralSubmission,
    SuggestionSubmission, UpdatePriority,
};

pub async fn worklets_list(ctx: &Context) -> Result<()> {
    output::print_json(&ctx.api().worklets().await?)
}

pub async fn worklets_show(ctx: &Context, worklet: &str) -> Result<()> {
    output::print_json(&ctx.api().worklet(worklet).await?)
}

/// Worklets of a mentor; defaults to the logged-in user.
pub async fn worklets_mentor(ctx: &Context, email: Option<&str>) -> Result<()> {
    let email = match email {
        Some(email) => email.to_string(),
        None => ctx.current_email()?,
    };
    output::print_json(&ctx.api().mentor_worklets(&email).await?)
}

/// Completed worklets open for evaluation; defaults to the logged-in mentor.
pub async fn worklets_completed(ctx: &Context, email: Option<&str>) -> Result<()> {
    let email = match email {
        Some(email) => email.to_string(),
        None => ctx.current_email()?,
    };
    output::print_json(&ctx.api().completed_worklets(&email).await?)
}

pub async fn worklets_students(ctx: &Context, worklet: &str) -> Result<()> {
    output::print_json(&ctx.api().worklet_students(worklet).await?)
}

pub async fn worklets_ongoing(ctx: &Context, mentor_id: i64) -> Result<()> {
    output::print_json(&ctx.api().ongoing_worklets(mentor_id).await?)
}

pub async fn worklets_associations(ctx: &Context, worklet_id: i64) -> Result<()> {
    output::print_json(&ctx.api().worklet_associations(worklet_id).await?)
}

pub async fn stats_mentor(ctx: &Context) -> Result<()> {
    output::print_json(&ctx.api().mentor_statistics().await?)
}

pub async fn stats_dashboard(ctx: &Context) -> Result<()> {
    output::print_json(&ctx.api().dashboard_statistics().await?)
}

pub async fn request_update(
    ctx: &Context,
    worklet: &str,
    message: &str,
    priority: UpdatePriority,
) -> Result<()> {
    output::print_json(&ctx.api().request_update(worklet, message, priority).await?)
}

pub async fn feedback(
    ctx: &Context,
    worklet_id: i64,
    feedback_type: String,
    feedback_content: String,
    month: Option<String>,
    rating: Option<u8>,
) -> Result<()> {
    let submission = FeedbackSubmission {
        worklet_id,
        feedback_type,
        feedback_content,
        month,
        rating,
    };
    output::print_json(&ctx.api().submit_feedback(&submission).await?)
}

pub async fn suggest(
    ctx: &Context,
    worklet_identifier: String,
    suggestion_title: String,
    suggestion_content: String,
) -> Result<()> {
    let submission = SuggestionSubmission {
        worklet_identifier,
        suggestion_title,
        suggestion_content,
    };
    output::print_json(&ctx.api().submit_suggestion(&submission).await?)
}

/// Arguments for `prism refer`.
#[derive(Debug, Args)]
pub struct ReferArgs {
    /// Worklet id
    pub worklet_id: i64,
    /// Student email; repeat for several students
    #[arg(short, long = "student", required = true)]
    pub students: Vec<String>,
    /// Note sent with the referral
    #[arg(short, long)]
    pub message: String,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub position: Option<String>,
}

impl From<ReferArgs> for ReferralSubmission {
    fn from(args: ReferArgs) -> Self {
        ReferralSubmission {
            worklet_id: args.worklet_id,
            selected_students: args.students,
            referral_message: args.message,
            company_name: args.company,
            position_title: args.position,
        }
    }
}

/// Refer students of a worklet for an internship.
pub async fn refer(ctx: &Context, args: ReferArgs) -> Result<()> {
    let referral = ReferralSubmission::from(args);
    output::print_json(&ctx.api().submit_referral(&referral).await?)
}

/// Arguments for `prism evaluate`.
#[derive(Debug, Args)]
pub struct EvaluateArgs {
    /// Worklet id
    pub worklet_id: i64,
    #[arg(long, default_value = "0")]
    pub performance: String,
    #[arg(long, default_value = "0")]
    pub quality: String,
    #[arg(long, default_value = "0")]
    pub innovation: String,
    #[arg(long, default_value = "0")]
    pub teamwork: String,
    #[arg(long)]
    pub comments: Option<String>,
    #[arg(long)]
    pub feedback: Option<String>,
    /// Points awarded with the evaluation
    #[arg(long, default_value_t = 0)]
    pub points: u32,
    #[arg(long)]
    pub certificate_type: Option<String>,
    #[arg(long)]
    pub recommendation_letter: bool,
    #[arg(long)]
    pub internship_opportunity: bool,
    #[arg(long, default_value_t = 0)]
    pub bonus_credits: u32,
    #[arg(long)]
    pub special_recognition: Option<String>,
    #[arg(long)]
    pub mentorship_extension: bool,
}

impl EvaluateArgs {
    fn into_submission(self, evaluated_by: String, evaluation_date: String) -> EvaluationSubmission {
        EvaluationSubmission {
            worklet_id: self.worklet_id,
            performance_rating: self.performance,
            completion_quality: self.quality,
            innovation_score: self.innovation,
            teamwork_rating: self.teamwork,
            perks: EvaluationPerks {
                points_awarded: self.points,
                certificate_type: self.certificate_type.unwrap_or_default(),
                recommendation_letter: self.recommendation_letter,
                internship_opportunity: self.internship_opportunity,
                bonus_credits: self.bonus_credits,
                special_recognition: self.special_recognition.unwrap_or_default(),
                mentorship_extension: self.mentorship_extension,
            },
            comments: self.comments.unwrap_or_default(),
            feedback: self.feedback.unwrap_or_default(),
            evaluated_by,
            evaluation_date,
        }
    }
}

/// Submit an evaluation signed with the logged-in user's email.
pub async fn evaluate(ctx: &Context, args: EvaluateArgs) -> Result<()> {
    let evaluated_by = ctx.current_email()?;
    let submission = args.into_submission(evaluated_by, chrono::Utc::now().to_rfc3339());
    output::print_json(&ctx.api().submit_evaluation(&submission).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: EvaluateArgs,
    }

    #[derive(Parser)]
    struct ReferWrapper {
        #[command(flatten)]
        args: ReferArgs,
    }

    #[test]
    fn test_refer_args_collect_students() {
        let parsed = ReferWrapper::try_parse_from([
            "refer",
            "4",
            "-s",
            "lin@prism.dev",
            "--student",
            "omar@prism.dev",
            "-m",
            "Strong finish",
            "--company",
            "Acme Systems",
        ])
        .unwrap();

        let referral = ReferralSubmission::from(parsed.args);
        assert_eq!(referral.worklet_id, 4);
        assert_eq!(referral.selected_students, ["lin@prism.dev", "omar@prism.dev"]);
        assert_eq!(referral.company_name.as_deref(), Some("Acme Systems"));
        assert_eq!(referral.position_title, None);

        assert!(ReferWrapper::try_parse_from(["refer", "4", "-m", "no students"]).is_err());
    }

    #[test]
    fn test_evaluate_args_build_submission() {
        let wrapper = Wrapper::try_parse_from([
            "evaluate",
            "4",
            "--performance",
            "4",
            "--quality",
            "5",
            "--points",
            "50",
            "--recommendation-letter",
            "--comments",
            "Solid work",
        ])
        .unwrap();

        let submission = wrapper.args.into_submission(
            "mentor@prism.dev".to_string(),
            "2024-05-31T12:00:00+00:00".to_string(),
        );

        assert_eq!(submission.worklet_id, 4);
        assert_eq!(submission.performance_rating, "4");
        assert_eq!(submission.innovation_score, "0");
        assert_eq!(submission.perks.points_awarded, 50);
        assert!(submission.perks.recommendation_letter);
        assert!(!submission.perks.internship_opportunity);
        assert_eq!(submission.comments, "Solid work");
        assert_eq!(submission.feedback, "");
        assert_eq!(submission.evaluated_by, "mentor@prism.dev");
    }
}
