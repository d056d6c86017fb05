//! PRISM CLI - command-line client for the PRISM mentorship API.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::Context;
use prism_config::{init_logging, Config, Paths};
use prism_session::UpdatePriority;

/// PRISM CLI - log in and work with worklets, evaluations and statistics.
#[derive(Parser)]
#[command(name = "prism")]
#[command(about = "PRISM client for authentication and mentorship workflows")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config, credentials and logs. Defaults to ~/.prism
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// PRISM API base URL, overriding config and PRISM_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,
        /// Password (prompted when omitted)
        #[arg(short, long, env = "PRISM_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Role to log in as (Student, Mentor, Admin)
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Create an account with an emailed one-time code
    Signup {
        #[command(subcommand)]
        command: SignupCommands,
    },

    /// Logout and clear the stored session
    Logout,

    /// Show the local session state
    Status,

    /// Show the current user as seen by the server
    Whoami,

    /// Show or update your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Browse worklets
    Worklets {
        #[command(subcommand)]
        command: WorkletCommands,
    },

    /// Dashboard statistics
    Stats {
        #[command(subcommand)]
        command: StatsCommands,
    },

    /// Ask a worklet's students for a progress update
    RequestUpdate {
        /// Worklet id or certificate id
        worklet: String,
        /// Message sent to the students
        #[arg(short, long)]
        message: String,
        /// Priority (low, medium, high)
        #[arg(short, long, default_value = "medium", value_parser = parse_priority)]
        priority: UpdatePriority,
    },

    /// Submit feedback on a worklet
    Feedback {
        /// Worklet id
        worklet_id: i64,
        /// Feedback type (e.g. monthly, general)
        #[arg(short = 't', long = "type", default_value = "general")]
        feedback_type: String,
        /// Feedback text
        #[arg(short, long)]
        content: String,
        /// Month the feedback covers (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
        /// Rating from 1 to 5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,
    },

    /// Submit a suggestion for a worklet
    Suggest {
        /// Worklet id or certificate id
        worklet: String,
        /// Suggestion title
        #[arg(short, long)]
        title: String,
        /// Suggestion text
        #[arg(short, long)]
        content: String,
    },

    /// Submit an evaluation for a worklet
    Evaluate(commands::EvaluateArgs),

    /// Refer a worklet's students for an internship
    Refer(commands::ReferArgs),
}

#[derive(Subcommand)]
enum SignupCommands {
    /// Email a one-time code
    RequestOtp {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, default_value = "Student")]
        role: String,
    },
    /// Confirm the emailed code
    VerifyOtp {
        #[arg(short, long)]
        email: String,
        /// The code from the email
        #[arg(short, long)]
        code: String,
    },
    /// Set a password and log in
    Complete {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, default_value = "Student")]
        role: String,
        /// Password (prompted when omitted)
        #[arg(short, long, env = "PRISM_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the full profile
    Show,
    /// Update profile fields; omitted fields are left unchanged
    Update(commands::ProfileArgs),
}

#[derive(Subcommand)]
enum WorkletCommands {
    /// List all worklets
    List,
    /// Show one worklet
    Show {
        /// Worklet id or certificate id
        worklet: String,
    },
    /// List worklets mentored by an email (defaults to you)
    Mentor {
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Completed worklets you can evaluate (defaults to you)
    Completed {
        #[arg(short, long)]
        email: Option<String>,
    },
    /// List students of a worklet
    Students {
        /// Worklet id or certificate id
        worklet: String,
    },
    /// Ongoing worklets of a mentor, by user id
    Ongoing { mentor_id: i64 },
    /// Users associated with a worklet
    Associations { worklet_id: i64 },
}

#[derive(Subcommand)]
enum StatsCommands {
    /// Your mentor statistics
    Mentor,
    /// Platform-wide statistics
    Dashboard,
}

fn parse_priority(raw: &str) -> Result<UpdatePriority, String> {
    match raw.to_lowercase().as_str() {
        "low" => Ok(UpdatePriority::Low),
        "medium" => Ok(UpdatePriority::Medium),
        "high" => Ok(UpdatePriority::High),
        other => Err(format!("unknown priority '{}' (low, medium, high)", other)),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths)?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    let log_level = cli.log_level.unwrap_or_else(|| config.log_level.clone());
    init_logging("prism-cli", &log_level, &paths);

    let ctx = Context::new(config, paths)?;

    match cli.command {
        Commands::Login {
            email,
            password,
            role,
        } => commands::login(&ctx, &email, password, role.as_deref()).await,
        Commands::Signup { command } => match command {
            SignupCommands::RequestOtp { name, email, role } => {
                commands::signup_request_otp(&ctx, &name, &email, &role).await
            }
            SignupCommands::VerifyOtp { email, code } => {
                commands::signup_verify_otp(&ctx, &email, &code).await
            }
            SignupCommands::Complete {
                name,
                email,
                role,
                password,
            } => commands::signup_complete(&ctx, &name, &email, &role, password).await,
        },
        Commands::Logout => commands::logout(&ctx),
        Commands::Status => commands::status(&ctx),
        Commands::Whoami => commands::whoami(&ctx).await,
        Commands::Profile { command } => match command {
            ProfileCommands::Show => commands::profile_show(&ctx).await,
            ProfileCommands::Update(args) => commands::profile_update(&ctx, args).await,
        },
        Commands::Worklets { command } => match command {
            WorkletCommands::List => commands::worklets_list(&ctx).await,
            WorkletCommands::Show { worklet } => commands::worklets_show(&ctx, &worklet).await,
            WorkletCommands::Mentor { email } => {
                commands::worklets_mentor(&ctx, email.as_deref()).await
            }
            WorkletCommands::Completed { email } => {
                commands::worklets_completed(&ctx, email.as_deref()).await
            }
            WorkletCommands::Students { worklet } => {
                commands::worklets_students(&ctx, &worklet).await
            }
            WorkletCommands::Ongoing { mentor_id } => {
                commands::worklets_ongoing(&ctx, mentor_id).await
            }
            WorkletCommands::Associations { worklet_id } => {
                commands::worklets_associations(&ctx, worklet_id).await
            }
        },
        Commands::Stats { command } => match command {
            StatsCommands::Mentor => commands::stats_mentor(&ctx).await,
            StatsCommands::Dashboard => commands::stats_dashboard(&ctx).await,
        },
        Commands::RequestUpdate {
            worklet,
            message,
            priority,
        } => commands::request_update(&ctx, &worklet, &message, priority).await,
        Commands::Feedback {
            worklet_id,
            feedback_type,
            content,
            month,
            rating,
        } => {
            commands::feedback(&ctx, worklet_id, feedback_type, content, month, rating).await
        }
        Commands::Suggest {
            worklet,
            title,
            content,
        } => commands::suggest(&ctx, worklet, title, content).await,
        Commands::Evaluate(args) => commands::evaluate(&ctx, args).await,
        Commands::Refer(args) => commands::refer(&ctx, args).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&e);
        std::process::exit(1);
    }
}
