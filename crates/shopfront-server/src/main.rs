//! Shopfront Server: application entry point.

use std::sync::Arc;

use shopfront_auth::AccountService;
use shopfront_db::repository::SurrealUserRepository;
use shopfront_db::{DbManager, run_migrations};
use shopfront_payment::RazorpayGateway;
use shopfront_server::config::ServerConfig;
use shopfront_server::mail::LogMailer;
use shopfront_server::state::{AppState, Backends};
use shopfront_server::upload::LocalMediaStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db = DbManager::connect(&config.db).await?;
    run_migrations(db.client()).await?;

    if let Some(seed) = &config.admin {
        let accounts = AccountService::new(SurrealUserRepository::with_pepper(
            db.client().clone(),
            config.auth.pepper.clone(),
        ));
        accounts
            .ensure_admin(&seed.email, &seed.password, &seed.full_name)
            .await?;
    }

    let media = LocalMediaStore::new(&config.upload_dir, &config.media_base_url);
    tokio::fs::create_dir_all(media.root()).await?;

    let backends = Backends {
        gateway: Arc::new(RazorpayGateway::new(config.gateway.clone())?),
        media: Arc::new(media),
        mailer: Arc::new(LogMailer),
    };
    let state = AppState::new(db.client().clone(), &config, backends);
    let app = shopfront_server::app_with_media(state, &config.upload_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!(bind = %config.bind, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shopfront=info,tower_http=info")),
        )
        .json()
        .init();

    info!("Starting Shopfront server...");

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        error!(error = %e, "Server failed");
        std::process::exit(1);
    }

    info!("Shopfront server stopped.");
}
