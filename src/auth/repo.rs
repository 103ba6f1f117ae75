use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

/// A live account already holds the email or mobile number.
#[derive(Debug, thiserror::Error)]
#[error("email or mobile number already registered")]
pub struct DuplicateUser;

const USER_COLUMNS: &str = "id, first_name, last_name, email, mobile_number, password_hash, \
                            role, status, is_verified, created_at, updated_at";

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_active_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Any live account already holding this email or mobile number.
    async fn find_active_by_email_or_mobile(
        &self,
        email: &str,
        mobile_number: &str,
    ) -> anyhow::Result<Option<User>>;
    async fn find_active_admin(&self) -> anyhow::Result<Option<User>>;
    /// Fails with [`DuplicateUser`] when a live account holds the email or mobile number.
    async fn create(&self, new: NewUser) -> anyhow::Result<User>;
    async fn list_all(&self) -> anyhow::Result<Vec<User>>;
    /// Marks the account deleted; the row stays.
    async fn soft_delete(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Removes the account together with its categories and expenses, all or nothing.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_active_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND status = 'active'");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find user by id")?;
        Ok(user)
    }

    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND status = 'active'");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .context("find user by email")?;
        Ok(user)
    }

    async fn find_active_by_email_or_mobile(
        &self,
        email: &str,
        mobile_number: &str,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE status = 'active' AND (email = $1 OR mobile_number = $2) \
             LIMIT 1"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(mobile_number)
            .fetch_optional(&self.db)
            .await
            .context("find user by email or mobile")?;
        Ok(user)
    }

    async fn find_active_admin(&self) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE role = 'admin' AND status = 'active' \
             ORDER BY created_at LIMIT 1"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .fetch_optional(&self.db)
            .await
            .context("find admin")?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, first_name, last_name, email, mobile_number, password_hash, role, is_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(new.first_name)
            .bind(new.last_name)
            .bind(new.email)
            .bind(new.mobile_number)
            .bind(new.password_hash)
            .bind(new.role)
            .bind(new.is_verified)
            .fetch_one(&self.db)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    anyhow::Error::new(DuplicateUser)
                }
                other => anyhow::Error::new(other).context("insert user"),
            })?;
        Ok(user)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.db)
            .await
            .context("list users")?;
        Ok(users)
    }

    async fn soft_delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET status = 'deleted', updated_at = now()
             WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await
        .context("soft delete user")?;
        Ok(res.rows_affected() > 0)
    }

    // categories and expenses go through ON DELETE CASCADE in the same statement
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() > 0)
    }
}
