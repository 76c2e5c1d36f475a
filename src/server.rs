//! Reusable server runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full service lifecycle:
//! database init, migrations, default admin seeding, REST API, metrics and
//! graceful shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::application::UserService;
use crate::config::AppConfig;
use crate::infrastructure::crypto::jwt::{generate_secret, JwtConfig};
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::database::redact_url;
use crate::infrastructure::database::repositories::UserRepository;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::{create_api_router, init_database, DatabaseConfig};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the service.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Create the configured admin user if it does not exist (default: true).
    pub seed_admin: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            seed_admin: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running service.
///
/// # Examples
///
/// ```rust,no_run
/// use user_auth::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     // ... wait for shutdown signal ...
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// User use-cases, shared with the HTTP layer.
    pub user_service: Arc<UserService<UserRepository>>,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Address the REST API is bound to.
    pub local_addr: SocketAddr,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the service with the given options.
    ///
    /// This will:
    /// 1. Install the Prometheus metrics recorder
    /// 2. Connect to the database and run migrations
    /// 3. Seed the default administrator (if enabled)
    /// 4. Start the REST API server (with Swagger UI)
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;

        info!("Starting user-auth-service...");

        let prometheus_handle = prometheus_handle()?;
        info!("📊 Prometheus metrics recorder ready");

        // ── Build sub-configs ──────────────────────────────────
        let db_config = DatabaseConfig::from(&app_cfg.database);
        info!("Database: {}", redact_url(&db_config.url));

        let jwt_config = build_jwt_config(&app_cfg);
        info!(
            "JWT configured with {}h token expiration",
            jwt_config.expiration_hours
        );

        // ── Database ───────────────────────────────────────────
        let db = init_database(&db_config).await?;

        if opts.auto_migrate {
            info!("Running database migrations...");
            Migrator::up(&db, None).await?;
            info!("Migrations completed");
        }

        // ── Services ───────────────────────────────────────────
        let repo = Arc::new(UserRepository::new(db.clone()));
        let user_service = Arc::new(UserService::new(
            repo,
            jwt_config,
            app_cfg.security.bcrypt_cost,
        ));

        if opts.seed_admin {
            match user_service.ensure_default_admin(&app_cfg.admin).await {
                Ok(true) => {
                    info!("Default admin created: {}", app_cfg.admin.email);
                    warn!("⚠️  Please change the admin password immediately!");
                }
                Ok(false) => {}
                Err(e) => error!("Failed to create admin user: {}", e),
            }
        }

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── REST API server ────────────────────────────────────
        let api_router = create_api_router(user_service.clone(), db.clone(), prometheus_handle);

        let api_addr = format!("{}:{}", app_cfg.server.api_host, app_cfg.server.api_port);
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        info!("🚀 Server started.");

        Ok(Self {
            user_service,
            config: app_cfg,
            local_addr,
            db,
            shutdown,
            api_task,
        })
    }

    /// Port the REST API is listening on. Useful when configured with port 0.
    pub fn api_port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    ///
    /// Call [`wait`](Self::wait) to block until everything has stopped.
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to fully stop after shutdown has been triggered.
    /// In-flight requests get `server.shutdown_timeout` seconds to finish.
    pub async fn wait(self) {
        info!("⏳ Waiting for server tasks to complete...");

        let ServerHandle {
            db,
            shutdown,
            api_task,
            ..
        } = self;

        let finished = shutdown
            .shutdown_with_cleanup(|| async move {
                match api_task.await {
                    Ok(()) => info!("REST API server stopped"),
                    Err(e) => error!("REST API server task panicked: {}", e),
                }
            })
            .await;
        if !finished {
            warn!("REST API server did not drain in time");
        }

        if let Err(e) = db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("✅ Database connection closed");
        }

        info!("👋 user-auth-service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down user-auth-service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the server is still running.
    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// The global metrics recorder can only be installed once per process;
/// restarts within the same process reuse it.
fn prometheus_handle() -> Result<PrometheusHandle, BuildError> {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("📊 Prometheus metrics recorder installed");
    Ok(PROM_HANDLE.get_or_init(|| handle).clone())
}

fn build_jwt_config(app_cfg: &AppConfig) -> JwtConfig {
    let secret = if app_cfg.security.jwt_secret.is_empty() {
        warn!("No JWT secret configured; generated a random one. Tokens will not survive a restart.");
        generate_secret()
    } else {
        app_cfg.security.jwt_secret.clone()
    };

    let mut jwt_config = JwtConfig::new(secret, app_cfg.security.jwt_expiration_hours);
    jwt_config.issuer = app_cfg.security.jwt_issuer.clone();
    jwt_config
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
/// `RUST_LOG` takes precedence over `logging.level`.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_replaced() {
        let config = AppConfig::default();
        let jwt = build_jwt_config(&config);
        assert_eq!(jwt.secret.len(), 64);
        assert_eq!(jwt.expiration_hours, 24);
    }

    #[test]
    fn configured_secret_and_issuer_are_used() {
        let mut config = AppConfig::default();
        config.security.jwt_secret = "configured".into();
        config.security.jwt_issuer = "issuer-x".into();
        let jwt = build_jwt_config(&config);
        assert_eq!(jwt.secret, "configured");
        assert_eq!(jwt.issuer, "issuer-x");
    }

    #[tokio::test]
    async fn start_and_shutdown_on_ephemeral_port() {
        let mut config = AppConfig::default();
        config.server.api_host = "127.0.0.1".into();
        config.server.api_port = 0;
        config.database.url = "sqlite::memory:".into();
        config.database.pool.max_connections = 1;
        config.security.jwt_secret = "test-secret".into();
        config.security.bcrypt_cost = 4;

        let handle = ServerHandle::start(ServerOptions {
            config,
            ..Default::default()
        })
        .await
        .unwrap();

        assert_ne!(handle.api_port(), 0);
        assert!(handle.is_running());

        let admin = handle
            .user_service
            .sign_in("admin@email.com", "admin123")
            .await
            .unwrap();
        assert!(admin.user.is_admin());

        handle.shutdown().await;
    }
}
