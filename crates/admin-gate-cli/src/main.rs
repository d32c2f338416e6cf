//! admin-gate - drive the admin login gate from a terminal.

mod commands;
mod navigator;
mod output;

use clap::{Parser, Subcommand};
use commands::{LoginArgs, RecordKind};
use gate_config_and_utils::{init_logging_for_service, LogFormat};
use std::path::PathBuf;
use tracing::debug;

/// Default login page when none is given.
const DEFAULT_PAGE_URL: &str = "http://localhost:3000/login.html";

/// admin-gate - OTP login, domain checks and record helpers for the admin pages.
#[derive(Parser)]
#[command(name = "admin-gate")]
#[command(about = "Admin gate CLI for OTP sign-in and record helpers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to ADMIN_GATE_LOG_LEVEL
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// JSON config file; environment variables override it
    #[arg(short, long, global = true, env = "ADMIN_GATE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether an email may sign in
    Allowed {
        /// Email address to check
        email: String,
    },

    /// Sign in with an emailed one-time code, then call protected endpoints
    Login {
        /// Email address to sign in with
        #[arg(short, long)]
        email: String,
        /// Login page URL the session starts on
        #[arg(long, default_value = DEFAULT_PAGE_URL)]
        page_url: String,
        /// API path to call once signed in (repeatable)
        #[arg(long = "fetch")]
        fetch: Vec<String>,
    },

    /// Build transcript or summary records
    Records {
        /// Record type
        #[arg(value_enum)]
        kind: RecordKind,
        /// Record fields as JSON, or `-` to read stdin
        fields: String,
        /// Insert the record into this table using the service role key
        #[arg(long)]
        insert: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&e.to_string(), &cli.format);
            std::process::exit(1);
        }
    };

    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging_for_service("admin-gate", &level, LogFormat::from_env());
    debug!(config_file = ?cli.config, "Configuration loaded");

    let result = match cli.command {
        Commands::Allowed { email } => commands::allowed(&config, &email, &cli.format),
        Commands::Login {
            email,
            page_url,
            fetch,
        } => {
            let args = LoginArgs {
                email,
                page_url,
                fetch,
            };
            commands::login(&config, args, &cli.format).await
        }
        Commands::Records {
            kind,
            fields,
            insert,
        } => commands::records(&config, kind, &fields, insert.as_deref(), &cli.format).await,
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e), &cli.format);
        std::process::exit(1);
    }
}
