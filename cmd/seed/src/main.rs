//! Prepares a PostgreSQL database: runs migrations, creates the admin
//! account and the starter categories. Safe to run repeatedly.

use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth_adapters::{Argon2Hasher, JwtSessions};
use configs::Settings;
use domains::DomainError;
use services::{AppServices, Repositories};
use storage_adapters::PgStore;

const STARTER_CATEGORIES: &[&str] = &["Technology", "Lifestyle", "Travel", "Food"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log.level)),
        )
        .init();

    let store = PgStore::connect(
        settings.database.url.expose_secret(),
        settings.database.max_connections,
    )
    .await
    .context("connecting to PostgreSQL")?;
    store.migrate().await.context("running migrations")?;
    info!("migrations applied");

    let services = AppServices::new(
        Repositories::from_store(Arc::new(store)),
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
    info!(username = %admin.username, email = %admin.email, "admin account ready");

    for name in STARTER_CATEGORIES {
        match services
            .admin
            .create_category(&admin.principal(), name)
            .await
        {
            Ok(category) => info!(category = %category.name, "category created"),
            Err(DomainError::Conflict(_)) => info!(category = %name, "category already present"),
            Err(e) => return Err(e).context(format!("creating category {name}")),
        }
    }

    info!("seed complete");
    Ok(())
}
