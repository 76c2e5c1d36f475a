//! user-auth-service: CLI server
//!
//! Headless user management and authentication API suitable for deployment
//! as a systemd service, Docker container, or standalone process.
//!
//! ```sh
//! # Run with default config (~/.config/user-auth-service/config.toml)
//! user-auth-service
//!
//! # Custom config path
//! user-auth-service --config /etc/user-auth-service/config.toml
//!
//! # Override the port
//! user-auth-service --api-port 8080
//!
//! # Validate config without starting
//! user-auth-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use user_auth::config::{AppConfig, CONFIG_ENV};
use user_auth::infrastructure::database::redact_url;
use user_auth::server::{init_tracing, ServerHandle, ServerOptions};

/// User registration, JWT authentication and role-based user management.
#[derive(Parser, Debug)]
#[command(
    name = "user-auth-service",
    version,
    about = "User management and authentication REST API",
    long_about = "REST API for user registration, JWT sign-in and role-based \
                  user administration.\n\n\
                  Default config: ~/.config/user-auth-service/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Skip seeding the default admin user.
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(user_auth::default_config_path);

    // A malformed file is fatal; a missing one means defaults.
    let mut config = AppConfig::load(&config_path)?;

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.api_port {
        config.server.api_port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}:{}", config.server.api_host, config.server.api_port);
        println!("   Database    : {}", redact_url(&config.database.connection_url()));
        println!("   Log level   : {}", config.logging.level);
        println!("   Log format  : {}", config.logging.format);
        return Ok(());
    }

    init_tracing(&config);
    info!("Configuration loaded from {}", config_path.display());
    if let Some(port) = cli.api_port {
        info!("CLI override: api_port = {}", port);
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        seed_admin: !cli.no_seed,
    })
    .await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
