//! Enrollment process entry point.
//!
//! # Responsibility
//! - Resolve configuration from file, environment and flags.
//! - Initialize logging, open and migrate the database.
//! - Seed the administrator identity (idempotent).

use clap::{Parser, Subcommand};
use enrollment_core::db::open_db;
use enrollment_core::{
    ensure_admin, init_logging, permissions, Argon2CredentialHasher, BootstrapOutcome,
    EnrollmentConfig, IdentityService, Role, SqliteStore,
};
use log::warn;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "enrollment")]
#[command(about = "Course enrollment engine setup and inspection.")]
struct CommandLine {
    /// JSON configuration file.
    #[arg(long, value_name = "path")]
    config: Option<PathBuf>,
    /// SQLite database file; overrides the config value.
    #[arg(long, value_name = "path")]
    db: Option<PathBuf>,
    /// Absolute directory for rolling log files.
    #[arg(long, value_name = "dir")]
    log_dir: Option<PathBuf>,
    #[arg(long, value_name = "level")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate the database and seed the administrator (default)
    Bootstrap,
    /// Print the operations a role may perform
    Permissions { role: Role },
    /// Print the core version
    Version,
}

fn main() -> ExitCode {
    let cli = CommandLine::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: CommandLine) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Some(Commands::Version) => {
            println!("enrollment_core version={}", enrollment_core::core_version());
            Ok(())
        }
        Some(Commands::Permissions { role }) => {
            println!("{}", serde_json::to_string_pretty(&permissions(role))?);
            Ok(())
        }
        Some(Commands::Bootstrap) | None => {
            let config = resolve_config(
                cli.config.as_deref(),
                cli.db,
                cli.log_dir,
                cli.log_level,
                |key| std::env::var(key).ok(),
            )?;
            bootstrap(&config)
        }
    }
}

fn resolve_config(
    path: Option<&Path>,
    db: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    log_level: Option<String>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<EnrollmentConfig, Box<dyn Error>> {
    let mut config = EnrollmentConfig::load_with(path, env)?;
    if let Some(db) = db {
        config.database_path = db;
    }
    if log_dir.is_some() {
        config.log_dir = log_dir;
    }
    if let Some(level) = log_level {
        config.log_level = level;
    }
    config.validate()?;
    Ok(config)
}

fn bootstrap(config: &EnrollmentConfig) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.database_path)?;
    let store = SqliteStore::try_new(&conn)?;
    let hasher = Argon2CredentialHasher::new(&config.credential)?;
    let identity = IdentityService::new(store, hasher);

    match ensure_admin(&identity, &config.admin)? {
        BootstrapOutcome::Created(user) => println!(
            "admin created username={} user_id={} db={}",
            user.username,
            user.id,
            config.database_path.display()
        ),
        BootstrapOutcome::AlreadyPresent => println!(
            "admin already present db={}",
            config.database_path.display()
        ),
    }

    if config.admin.uses_default_password() {
        warn!("event=admin_bootstrap module=cli status=warn reason=default_password");
        eprintln!("warning: administrator uses the default password; set ENROLLMENT_ADMIN_PASSWORD");
    }
    Ok(())
}
