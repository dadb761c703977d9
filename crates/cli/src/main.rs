//! faqbase CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create or upgrade the schema, including the session store
//! faq-cli migrate
//!
//! # Add demo categories, FAQs and tags to an empty database
//! faq-cli seed
//!
//! # Create a staff account
//! faq-cli admin create -l admin -e admin@example.com -n "Admin Name" -r super_admin
//!
//! # Delete visitor sessions and tracking logs older than 90 days
//! faq-cli sessions prune --days 90
//! ```
//!
//! # Environment Variables
//!
//! - `SITE_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `SITE_DATA_DIR` - data directory holding the tracking logs (default `./data`)
//! - `FAQ_ADMIN_PASSWORD` - password for `admin create`; generated when unset

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "faq-cli")]
#[command(author, version, about = "faqbase CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed an empty database with demo content
    Seed {
        /// Language of the demo content
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// Manage staff accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage visitor sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a staff account
    Create {
        /// Login name
        #[arg(short, long)]
        login: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`super_admin` or `editor`)
        #[arg(short, long, default_value = "editor")]
        role: String,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// Delete sessions and tracking logs older than N days
    Prune {
        /// Retention in days
        #[arg(long)]
        days: u32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { lang } => commands::seed::run(&lang).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                login,
                email,
                name,
                role,
            } => {
                commands::admin::create_user(&login, &email, &name, &role).await?;
            }
        },
        Commands::Sessions { action } => match action {
            SessionsAction::Prune { days } => commands::sessions::prune(days).await?,
        },
    }
    Ok(())
}
