use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Category, CategoryFields};

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn exists_for_user(&self, user_id: Uuid) -> anyhow::Result<bool>;
    async fn insert(&self, user_id: Uuid, fields: CategoryFields) -> anyhow::Result<Category>;
    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>>;
    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Category>>;
    async fn update_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: CategoryFields,
    ) -> anyhow::Result<Option<Category>>;
    async fn delete_by_id(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool>;
    async fn delete_all_for_user(&self, user_id: Uuid) -> anyhow::Result<u64>;
    /// Every user's categories, grouped by owner then insertion order.
    async fn list_all(&self) -> anyhow::Result<Vec<Category>>;
}

#[derive(Clone)]
pub struct PgCategoryStore {
    db: PgPool,
}

impl PgCategoryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn exists_for_user(&self, user_id: Uuid) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE user_id = $1)")
                .bind(user_id)
                .fetch_one(&self.db)
                .await
                .context("check categories exist")?;
        Ok(exists)
    }

    async fn insert(&self, user_id: Uuid, fields: CategoryFields) -> anyhow::Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, user_id, name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, name, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(fields.name)
        .bind(fields.description)
        .fetch_one(&self.db)
        .await
        .context("insert category")?;
        Ok(category)
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, user_id, name, description, created_at
              FROM categories
             WHERE user_id = $1
             ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list categories by user")?;
        Ok(rows)
    }

    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, user_id, name, description, created_at
              FROM categories
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find category by id")?;
        Ok(row)
    }

    async fn update_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: CategoryFields,
    ) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
               SET name = $3, description = $4
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, description, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(fields.name)
        .bind(fields.description)
        .fetch_optional(&self.db)
        .await
        .context("update category")?;
        Ok(row)
    }

    async fn delete_by_id(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete category")?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM categories WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete categories by user")?;
        Ok(res.rows_affected())
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, user_id, name, description, created_at
              FROM categories
             ORDER BY user_id, created_at, id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list all categories")?;
        Ok(rows)
    }
}
