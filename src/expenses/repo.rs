use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Expense, ExpenseUpdate, NewExpense};

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn insert(&self, user_id: Uuid, new: NewExpense) -> anyhow::Result<Expense>;
    /// The user's expenses in insertion order.
    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Expense>>;
    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Expense>>;
    async fn update_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: ExpenseUpdate,
    ) -> anyhow::Result<Option<Expense>>;
    async fn delete_by_id(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool>;
    async fn delete_all_for_user(&self, user_id: Uuid) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgExpenseStore {
    db: PgPool,
}

impl PgExpenseStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ExpenseStore for PgExpenseStore {
    async fn insert(&self, user_id: Uuid, new: NewExpense) -> anyhow::Result<Expense> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (id, user_id, category_id, amount, description, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, category_id, amount, description, date, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(new.category_id)
        .bind(new.amount)
        .bind(new.description)
        .bind(new.date)
        .fetch_one(&self.db)
        .await
        .context("insert expense")?;
        Ok(expense)
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Expense>> {
        let rows = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, user_id, category_id, amount, description, date, created_at
              FROM expenses
             WHERE user_id = $1
             ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list expenses by user")?;
        Ok(rows)
    }

    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Expense>> {
        let row = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, user_id, category_id, amount, description, date, created_at
              FROM expenses
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find expense by id")?;
        Ok(row)
    }

    async fn update_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: ExpenseUpdate,
    ) -> anyhow::Result<Option<Expense>> {
        let row = sqlx::query_as::<_, Expense>(
            r#"
            UPDATE expenses
               SET category_id = $3, amount = $4, description = $5
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, category_id, amount, description, date, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(update.category_id)
        .bind(update.amount)
        .bind(update.description)
        .fetch_optional(&self.db)
        .await
        .context("update expense")?;
        Ok(row)
    }

    async fn delete_by_id(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM expenses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete expense")?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM expenses WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete expenses by user")?;
        Ok(res.rows_affected())
    }
}
