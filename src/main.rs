//! Artisan Storefront server

use std::sync::Arc;

use anyhow::{Context, Result};
use artisan_storefront::{
    auth::Authenticator,
    config::Config,
    events::EventPublisher,
    router, seed,
    services::accounts::AccountService,
    store::{MemoryStore, PgStore, Store},
    AppState,
};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => Arc::new(
            PgStore::connect(url, config.database_max_connections)
                .await
                .context("connecting to PostgreSQL")?,
        ),
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let secret = match &config.token_secret {
        Some(secret) => secret.as_bytes().to_vec(),
        None => {
            warn!("TOKEN_SECRET not set, using a random key; tokens will not survive a restart");
            rand::random::<[u8; 32]>().to_vec()
        }
    };
    let auth = Authenticator::new(secret, chrono::Duration::hours(config.token_ttl_hours));

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => {
                info!(%url, "Connected to NATS");
                Some(client)
            }
            Err(e) => {
                warn!(%url, error = %e, "NATS unavailable, events will only be logged");
                None
            }
        },
        None => None,
    };

    if let Some(admin) = &config.admin {
        AccountService::new(store.as_ref(), &auth)
            .ensure_admin(&admin.email, &admin.password)
            .await
            .context("creating admin account")?;
    }
    if config.seed_catalog {
        seed::seed_catalog(store.as_ref()).await.context("seeding catalog")?;
    }

    let app = router(AppState::new(store, auth, EventPublisher::new(nats)));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Artisan Storefront listening on 0.0.0.0:{}", config.port);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
