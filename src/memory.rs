//! In-memory stores and request helpers for router tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    auth::{
        jwt::JwtKeys,
        password::hash_password,
        repo::{DuplicateUser, UserStore},
        repo_types::{NewUser, Role, Status, User},
    },
    categories::{
        repo::CategoryStore,
        repo_types::{Category, CategoryFields},
    },
    expenses::{
        repo::ExpenseStore,
        repo_types::{Expense, ExpenseUpdate, NewExpense},
    },
    state::AppState,
};

/// Deleting a user also clears the attached category and expense stores,
/// like the foreign-key cascade does in Postgres.
#[derive(Default)]
pub struct MemoryUserStore {
    rows: RwLock<Vec<User>>,
    categories: Arc<MemoryCategoryStore>,
    expenses: Arc<MemoryExpenseStore>,
}

impl MemoryUserStore {
    pub fn cascading(
        categories: Arc<MemoryCategoryStore>,
        expenses: Arc<MemoryExpenseStore>,
    ) -> Self {
        Self {
            rows: RwLock::default(),
            categories,
            expenses,
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_active_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|u| u.id == id && u.status == Status::Active)
            .cloned())
    }

    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|u| u.email == email && u.status == Status::Active)
            .cloned())
    }

    async fn find_active_by_email_or_mobile(
        &self,
        email: &str,
        mobile_number: &str,
    ) -> anyhow::Result<Option<User>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|u| {
                u.status == Status::Active && (u.email == email || u.mobile_number == mobile_number)
            })
            .cloned())
    }

    async fn find_active_admin(&self) -> anyhow::Result<Option<User>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|u| u.role == Role::Admin && u.status == Status::Active)
            .cloned())
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let mut rows = self.rows.write().await;
        let clash = rows.iter().any(|u| {
            u.status == Status::Active
                && (u.email == new.email || u.mobile_number == new.mobile_number)
        });
        if clash {
            return Err(DuplicateUser.into());
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            mobile_number: new.mobile_number,
            password_hash: new.password_hash,
            role: new.role,
            status: Status::Active,
            is_verified: new.is_verified,
            created_at: now,
            updated_at: now,
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.rows.read().await.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        match rows
            .iter_mut()
            .find(|u| u.id == id && u.status == Status::Active)
        {
            Some(user) => {
                user.status = Status::Deleted;
                user.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|u| u.id != id);
        if rows.len() == before {
            return Ok(false);
        }
        self.categories.delete_all_for_user(id).await?;
        self.expenses.delete_all_for_user(id).await?;
        Ok(true)
    }
}

#[derive(Default)]
pub struct MemoryCategoryStore {
    rows: RwLock<Vec<Category>>,
}

#[async_trait]
impl CategoryStore for MemoryCategoryStore {
    async fn exists_for_user(&self, user_id: Uuid) -> anyhow::Result<bool> {
        Ok(self.rows.read().await.iter().any(|c| c.user_id == user_id))
    }

    async fn insert(&self, user_id: Uuid, fields: CategoryFields) -> anyhow::Result<Category> {
        let category = Category {
            id: Uuid::new_v4(),
            user_id,
            name: fields.name,
            description: fields.description,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.write().await.push(category.clone());
        Ok(category)
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|c| c.user_id == user_id).cloned().collect())
    }

    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Category>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned())
    }

    async fn update_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: CategoryFields,
    ) -> anyhow::Result<Option<Category>> {
        let mut rows = self.rows.write().await;
        Ok(rows
            .iter_mut()
            .find(|c| c.id == id && c.user_id == user_id)
            .map(|c| {
                c.name = fields.name;
                c.description = fields.description;
                c.clone()
            }))
    }

    async fn delete_by_id(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|c| !(c.id == id && c.user_id == user_id));
        Ok(rows.len() != before)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|c| c.user_id != user_id);
        Ok((before - rows.len()) as u64)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Category>> {
        let mut all = self.rows.read().await.clone();
        all.sort_by_key(|c| c.user_id);
        Ok(all)
    }
}

#[derive(Default)]
pub struct MemoryExpenseStore {
    rows: RwLock<Vec<Expense>>,
}

#[async_trait]
impl ExpenseStore for MemoryExpenseStore {
    async fn insert(&self, user_id: Uuid, new: NewExpense) -> anyhow::Result<Expense> {
        let expense = Expense {
            id: Uuid::new_v4(),
            user_id,
            category_id: new.category_id,
            amount: new.amount,
            description: new.description,
            date: new.date,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.write().await.push(expense.clone());
        Ok(expense)
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Expense>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|e| e.user_id == user_id).cloned().collect())
    }

    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Expense>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|e| e.id == id && e.user_id == user_id)
            .cloned())
    }

    async fn update_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: ExpenseUpdate,
    ) -> anyhow::Result<Option<Expense>> {
        let mut rows = self.rows.write().await;
        Ok(rows
            .iter_mut()
            .find(|e| e.id == id && e.user_id == user_id)
            .map(|e| {
                e.category_id = update.category_id;
                e.amount = update.amount;
                e.description = update.description;
                e.clone()
            }))
    }

    async fn delete_by_id(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|e| !(e.id == id && e.user_id == user_id));
        Ok(rows.len() != before)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|e| e.user_id != user_id);
        Ok((before - rows.len()) as u64)
    }
}

/// Inserts an active user with password `password123` and returns an access token for it.
pub async fn seed_user(state: &AppState, email: &str, role: Role) -> (User, String) {
    let digits: String = Uuid::new_v4()
        .as_u128()
        .to_string()
        .chars()
        .take(10)
        .collect();
    let user = state
        .users
        .create(NewUser {
            first_name: Some("Test".into()),
            last_name: None,
            email: email.to_lowercase(),
            mobile_number: digits,
            password_hash: hash_password("password123").unwrap(),
            role,
            is_verified: role == Role::Admin,
        })
        .await
        .unwrap();
    let token = JwtKeys::from(&state.config.jwt).sign_access(user.id).unwrap();
    (user, token)
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, token);
    }
    let body = match body {
        Some(json) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(req.body(body).unwrap()).await.unwrap()
}

pub async fn read_json(res: Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
