//! Creates the single admin account from `ADMIN_*` variables. Safe to re-run.

use spendtrack::{
    auth::{
        repo::PgUserStore,
        services::{seed_admin, SeedOutcome},
    },
    config::{AdminSeedConfig, AppConfig},
    db,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "spendtrack=info".to_string()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let seed = AdminSeedConfig::from_env()?;
    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;

    match seed_admin(&PgUserStore::new(pool), &seed).await? {
        SeedOutcome::AlreadyPresent(id) => tracing::info!(%id, "admin already present"),
        SeedOutcome::Created(user) => tracing::info!(id = %user.id, email = %user.email, "admin created"),
    }
    Ok(())
}
