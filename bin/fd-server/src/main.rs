//! Fidelity Server
//!
//! Serves the user administration REST API:
//! - Login and current user: `/v1/login`, `/v1/me`
//! - Users and their audit history: `/v1/users`
//! - Registries: `/v1/user_roles`, `/v1/timezones`
//! - Docs: `/docs` (Swagger UI), `/openapi.json`
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FIDELITY_CONFIG` | - | Path to a TOML config file |
//! | `FIDELITY_HTTP_HOST` | `0.0.0.0` | Bind address |
//! | `FIDELITY_HTTP_PORT` | `5000` | HTTP port |
//! | `FIDELITY_MONGODB_URI` | - | Full MongoDB URI, overrides `DB_*` |
//! | `DB_HOST` / `DB_PORT` | `localhost` / `27017` | MongoDB host and port |
//! | `DB_USER` / `DB_PASS` | - | MongoDB credentials |
//! | `DB_NAME` | `fidelity` | MongoDB database name |
//! | `SECRET_KEY` | - | Token signing secret (required) |
//! | `ALGORITHM` | `HS256` | Token signing algorithm |
//! | `ACCESS_TOKEN_EXPIRE_MINUTES` | `30` | Token lifetime |
//! | `FIDELITY_BOOTSTRAP_ADMIN_USER` | - | First admin, created on an empty database |
//! | `FIDELITY_BOOTSTRAP_ADMIN_PASSWORD` | - | First admin password |
//! | `LOG_FORMAT` | `text` | `json` for structured logs |
//! | `RUST_LOG` | `info` | Log level |

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;

use fd_config::ConfigLoader;
use fd_platform::{
    initialize_indexes, Argon2Config, AuthService, BootstrapOutcome, PasswordService, Platform,
    Stores, TokenConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    fd_common::logging::init_logging("fd-server");

    info!("Starting Fidelity Server");

    let config = ConfigLoader::new().load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(uri = %config.mongodb.redacted_uri(), database = %config.mongodb.database, "Connecting to MongoDB");
    let mongo_client = mongodb::Client::with_uri_str(&config.mongodb.connection_uri()).await?;
    let db = mongo_client.database(&config.mongodb.database);

    initialize_indexes(&db).await?;

    let token_config = TokenConfig::from_config(&config.auth)?;
    let platform = Platform::new(
        Stores::mongo(&db),
        AuthService::new(token_config),
        PasswordService::new(Argon2Config::default())?,
    );

    match platform.bootstrap_seeder().seed(&config.bootstrap).await? {
        BootstrapOutcome::Created(id) => info!(user_id = %id, "Bootstrap admin seeded"),
        BootstrapOutcome::AlreadyInitialized => info!("Users present, bootstrap skipped"),
        BootstrapOutcome::NotConfigured => info!("No bootstrap admin configured"),
    }

    let app = platform.router(&config.http.cors_origins);

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);
    info!("Swagger UI available at http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Fidelity Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
