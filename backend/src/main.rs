//! Main entry point for the FINSIGHT backend.
//!
//! This file parses the command line, initializes tracing, opens the
//! database, and either serves the Axum application or runs one of the
//! user administration commands.

use std::io;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use finsight_backend::auth::{NewAccount, SystemClock};
use finsight_backend::config::{AppConfig, LogFormat};
use finsight_backend::state::AppState;
use finsight_backend::{build_router, database};
use finsight_store::Role;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type BoxError = Box<dyn std::error::Error>;

/// FINSIGHT web backend.
#[derive(Parser, Debug)]
#[command(name = "finsight", version, about = "Personal finance tracking backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web server (default).
    Serve,

    /// Create an account with any role.
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        #[arg(long, value_parser = parse_role, default_value = "student")]
        role: Role,
        /// Read from the environment so it stays out of shell history.
        #[arg(long, env = "FINSIGHT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Enable or disable login for a user.
    SetActive {
        #[arg(long)]
        username: String,
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
}

fn parse_role(value: &str) -> Result<Role, String> {
    value
        .parse()
        .map_err(|_| format!("expected one of: student, staff, admin (got '{value}')"))
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(io::stderr))
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    let store = Arc::new(database::open(&config).await?);
    let state = AppState::new(
        config.clone(),
        store.clone(),
        store.clone(),
        Arc::new(SystemClock),
    );

    let result: Result<(), BoxError> = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, state).await,
        Command::CreateUser {
            username,
            email,
            full_name,
            role,
            password,
        } => state
            .authenticator
            .provision_user(NewAccount {
                username: username.clone(),
                email,
                full_name,
                password,
                role,
            })
            .await
            .map(|id| println!("created {role} '{username}' with id {id}"))
            .map_err(BoxError::from),
        Command::SetActive { username, active } => {
            match state.authenticator.set_active(&username, active).await {
                Ok(true) => {
                    println!("'{username}' is now {}", if active { "active" } else { "inactive" });
                    Ok(())
                }
                Ok(false) => Err(format!("no user named '{username}'").into()),
                Err(e) => Err(BoxError::from(e)),
            }
        }
    };

    store.close().await;
    result
}

async fn serve(config: &AppConfig, state: AppState) -> Result<(), BoxError> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, secure_cookies = config.secure_cookies(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
