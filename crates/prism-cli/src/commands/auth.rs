//! Authentication and profile commands.

use super::{password_or_prompt, Context};
use crate::output;
use anyhow::Result;
use clap::Args;
use prism_session::ProfileUpdate;
use tracing::info;

/// Login with email and password.
pub async fn login(
    ctx: &Context,
    email: &str,
    password: Option<String>,
    role: Option<&str>,
) -> Result<()> {
    let password = password_or_prompt(password)?;
    let snapshot = ctx.session().login(email, &password, role).await?;
    output::print_json(&snapshot)
}

pub async fn signup_request_otp(ctx: &Context, name: &str, email: &str, role: &str) -> Result<()> {
    let response = ctx.session().request_otp(name, email, role).await?;
    output::print_json(&response)
}

pub async fn signup_verify_otp(ctx: &Context, email: &str, code: &str) -> Result<()> {
    let response = ctx.session().verify_otp(email, code).await?;
    output::print_json(&response)
}

/// Set the password for a verified email, then log in.
pub async fn signup_complete(
    ctx: &Context,
    name: &str,
    email: &str,
    role: &str,
    password: Option<String>,
) -> Result<()> {
    let password = password_or_prompt(password)?;
    let snapshot = ctx.session().signup(name, email, &password, role).await?;
    output::print_json(&snapshot)
}

/// Logout and clear the stored session.
pub fn logout(ctx: &Context) -> Result<()> {
    ctx.session().logout()?;
    output::print_success("Logged out successfully")
}

/// Local session state; never touches the network.
pub fn status(ctx: &Context) -> Result<()> {
    output::print_json(&ctx.session().status()?)
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    output::print_json(&ctx.session().me().await?)
}

pub async fn profile_show(ctx: &Context) -> Result<()> {
    output::print_json(&ctx.session().profile().await?)
}

/// Fields for `prism profile update`.
#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub team: Option<String>,
    #[arg(long)]
    pub college: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub website: Option<String>,
}

impl From<ProfileArgs> for ProfileUpdate {
    fn from(args: ProfileArgs) -> Self {
        ProfileUpdate {
            name: args.name,
            team: args.team,
            college: args.college,
            bio: args.bio,
            location: args.location,
            website: args.website,
        }
    }
}

pub async fn profile_update(ctx: &Context, args: ProfileArgs) -> Result<()> {
    let update = ProfileUpdate::from(args);
    if update.is_empty() {
        anyhow::bail!("Nothing to update; pass at least one field (see --help)");
    }

    let response = ctx.session().update_profile(&update).await?;
    info!(user_email = %response.user.email, "Profile updated");
    output::print_json(&response)
}
