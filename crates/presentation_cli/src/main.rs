//! taskdav CLI
//!
//! Command-line interface for administration.

#![allow(clippy::print_stdout)]

mod admin;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use domain::{ProjectId, UserId};
use infrastructure::{ApiKeyHasher, AppConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// taskdav CLI
#[derive(Parser)]
#[command(name = "taskdav-cli")]
#[command(author, version, about = "taskdav CalDAV server administration", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (default: ./config.toml when present)
    #[arg(short, long, global = true, env = "TASKDAV_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash an API key using Argon2 for secure storage in configuration
    ///
    /// The output can be used in config.toml for secure API key storage.
    /// Example: taskdav-cli hash-api-key sk-my-secret-key
    HashApiKey {
        /// The plaintext API key to hash
        api_key: String,

        /// Verify the hash by re-hashing and comparing (for debugging)
        #[arg(long)]
        verify: bool,
    },

    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Manage calendars
    #[command(subcommand)]
    Calendar(CalendarCommand),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Create a project
    Create {
        /// Owning user
        #[arg(long)]
        user: UserId,

        #[arg(long)]
        name: String,

        /// Make this the user's default project
        #[arg(long)]
        default: bool,
    },
}

#[derive(Subcommand)]
enum CalendarCommand {
    /// Create a calendar
    Create {
        /// Owning user
        #[arg(long)]
        user: UserId,

        #[arg(long)]
        name: String,

        /// Project that imported resources are filed under
        #[arg(long)]
        project: Option<ProjectId>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Make this the user's default calendar
        #[arg(long)]
        default: bool,
    },

    /// List a user's calendars
    List {
        #[arg(long)]
        user: UserId,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    AppConfig::load_from(path.map(PathBuf::as_path)).context("failed to load configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = log_filter_from_verbosity(cli.verbose);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::HashApiKey { api_key, verify } => {
            let hasher = ApiKeyHasher::new();

            match hasher.hash(&api_key) {
                Ok(hash) => {
                    println!("🔐 API Key Hash (Argon2id):");
                    println!();
                    println!("{hash}");
                    println!();
                    println!("📋 Add to config.toml:");
                    println!("   [[security.api_keys]]");
                    println!("   hash = \"{hash}\"");
                    println!("   user_id = \"YOUR-USER-UUID\"");

                    if verify {
                        println!();
                        match hasher.verify(&api_key, &hash) {
                            Ok(true) => println!("✅ Verification: Hash verified successfully"),
                            Ok(false) => {
                                println!("❌ Verification: Hash does NOT match (unexpected)");
                            },
                            Err(e) => println!("❌ Verification error: {e}"),
                        }
                    }
                },
                Err(e) => {
                    println!("❌ Failed to hash API key: {e}");
                    std::process::exit(1);
                },
            }
        },

        Commands::Project(ProjectCommand::Create {
            user,
            name,
            default,
        }) => {
            let config = load_config(cli.config.as_ref())?;
            let project = admin::create_project(&config.database, user, &name, default).await?;
            println!("✅ Project created: {}", project.id);
        },

        Commands::Calendar(CalendarCommand::Create {
            user,
            name,
            project,
            color,
            description,
            default,
        }) => {
            let config = load_config(cli.config.as_ref())?;
            let calendar = admin::create_calendar(
                &config.database,
                user,
                admin::NewCalendar {
                    name,
                    project,
                    color,
                    description,
                    is_default: default,
                },
            )
            .await?;
            println!("✅ Calendar created: {}", calendar.id);
            println!(
                "   🔗 {}calendars/{user}/{}/",
                dav_root(&config),
                calendar.id
            );
        },

        Commands::Calendar(CalendarCommand::List { user }) => {
            let config = load_config(cli.config.as_ref())?;
            let calendars = admin::list_calendars(&config.database, user).await?;
            if calendars.is_empty() {
                println!("No calendars for {user}");
            }
            for calendar in calendars {
                let marker = if calendar.is_default { "*" } else { " " };
                println!("{marker} {}  {}", calendar.id, calendar.name);
            }
        },

        Commands::Config(ConfigCommand::Show) => {
            let config = load_config(cli.config.as_ref())?;
            println!("{}", toml::to_string_pretty(&config)?);
        },
    }

    Ok(())
}

/// DAV tree root with a trailing slash
fn dav_root(config: &AppConfig) -> String {
    let base = config.caldav.base_path.trim().trim_matches('/');
    if base.is_empty() {
        "/".to_string()
    } else {
        format!("/{base}/")
    }
}
