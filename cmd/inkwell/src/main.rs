//! # Inkwell server
//!
//! Loads settings, wires the storage, auth and HTTP adapters into the
//! services, seeds the admin account and serves until Ctrl-C or SIGTERM.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api_adapters::{build_router, AppState, Metrics};
use auth_adapters::{Argon2Hasher, HmacCsrfGuard, JwtSessions};
use configs::{Settings, StorageBackend};
use services::{AppServices, Repositories};
use storage_adapters::{InMemoryStore, PgStore};

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn repositories(settings: &Settings) -> anyhow::Result<Repositories> {
    match settings.storage.backend {
        StorageBackend::Postgres => {
            let store = PgStore::connect(
                settings.database.url.expose_secret(),
                settings.database.max_connections,
            )
            .await
            .context("connecting to PostgreSQL")?;
            store.migrate().await.context("running migrations")?;
            info!("connected to PostgreSQL");
            Ok(Repositories::from_store(Arc::new(store)))
        }
        StorageBackend::Memory => {
            warn!("using in-memory storage; nothing survives a restart");
            Ok(Repositories::from_store(Arc::new(InMemoryStore::new())))
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    res = tokio::signal::ctrl_c() => {
                        if let Err(e) = res {
                            warn!(error = %e, "failed to listen for Ctrl-C");
                        }
                    }
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings);

    if settings.uses_dev_secrets() {
        warn!("running with built-in development secrets; set INKWELL__AUTH__JWT_SECRET and INKWELL__AUTH__CSRF_SECRET");
    }

    let repos = repositories(&settings).await?;
    let services = AppServices::new(
        repos,
        Arc::new(Argon2Hasher::new()),
        Arc::new(JwtSessions::new(
            settings.auth.jwt_secret.expose_secret().as_bytes(),
            chrono::Duration::minutes(settings.auth.session_ttl_minutes),
        )),
    );

    let admin = services
        .accounts
        .ensure_admin(
            &settings.admin.username,
            &settings.admin.email,
            settings.admin.password.expose_secret(),
        )
        .await
        .context("seeding the admin account")?;
    info!(user_id = %admin.id, username = %admin.username, "admin account ready");

    let csrf = HmacCsrfGuard::new(settings.auth.csrf_secret.expose_secret().as_bytes())
        .map_err(|e| anyhow!("invalid CSRF secret: {e}"))?;
    let state = AppState::new(
        services,
        Arc::new(csrf),
        Arc::new(Metrics::new()),
        settings.auth.secure_cookies,
    );

    let static_dir = Path::new(&settings.server.static_dir);
    let static_dir = static_dir.is_dir().then_some(static_dir);
    if static_dir.is_none() {
        warn!(dir = %settings.server.static_dir, "static directory not found; serving without assets");
    }
    let app = build_router(state, static_dir);

    let addr = settings.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Inkwell listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Inkwell stopped");
    Ok(())
}
