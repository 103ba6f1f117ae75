use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "spendtrack".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "spendtrack-users".into()),
            ttl_minutes: env_i64("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: env_i64("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
        };
        Ok(Self { database_url, jwt })
    }
}

/// Account created by the `seed-admin` binary.
#[derive(Debug, Clone)]
pub struct AdminSeedConfig {
    pub email: String,
    pub password: String,
    pub mobile_number: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl AdminSeedConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            email: std::env::var("ADMIN_EMAIL").context("ADMIN_EMAIL is not set")?,
            password: std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD is not set")?,
            mobile_number: std::env::var("ADMIN_MOBILE").context("ADMIN_MOBILE is not set")?,
            first_name: std::env::var("ADMIN_FIRST_NAME").ok(),
            last_name: std::env::var("ADMIN_LAST_NAME").ok(),
        })
    }
}

fn env_i64(key: &str) -> Option<i64> {
    std::env::var(key).ok().and_then(|v| v.parse::<i64>().ok())
}
