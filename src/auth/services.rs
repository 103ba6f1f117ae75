use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;
use uuid::Uuid;

use super::{
    password::hash_password,
    repo::UserStore,
    repo_types::{NewUser, Role, User},
};
use crate::config::AdminSeedConfig;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref MOBILE_RE: Regex = Regex::new(r"^\+?[0-9]{7,15}$").unwrap();
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_mobile(mobile: &str) -> bool {
    MOBILE_RE.is_match(mobile)
}

/// Empty or whitespace-only names are dropped.
pub(crate) fn clean_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

#[derive(Debug)]
pub enum SeedOutcome {
    AlreadyPresent(Uuid),
    Created(User),
}

/// Inserts the bootstrap admin unless an active admin already exists.
pub async fn seed_admin(
    users: &dyn UserStore,
    cfg: &AdminSeedConfig,
) -> anyhow::Result<SeedOutcome> {
    if let Some(existing) = users.find_active_admin().await? {
        info!(user_id = %existing.id, "admin already present");
        return Ok(SeedOutcome::AlreadyPresent(existing.id));
    }

    let email = normalize_email(&cfg.email);
    anyhow::ensure!(is_valid_email(&email), "ADMIN_EMAIL is not a valid email");
    anyhow::ensure!(
        is_valid_mobile(cfg.mobile_number.trim()),
        "ADMIN_MOBILE is not a valid mobile number"
    );
    anyhow::ensure!(
        cfg.password.len() >= super::password::MIN_PASSWORD_LEN,
        "ADMIN_PASSWORD is too short"
    );

    let admin = users
        .create(NewUser {
            first_name: clean_name(cfg.first_name.clone()),
            last_name: clean_name(cfg.last_name.clone()),
            email,
            mobile_number: cfg.mobile_number.trim().to_string(),
            password_hash: hash_password(&cfg.password)?,
            role: Role::Admin,
            is_verified: true,
        })
        .await?;
    info!(user_id = %admin.id, email = %admin.email, "admin created");
    Ok(SeedOutcome::Created(admin))
}
