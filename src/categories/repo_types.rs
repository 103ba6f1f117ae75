use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Name and description as written by the owner; already trimmed.
#[derive(Debug, Clone)]
pub struct CategoryFields {
    pub name: String,
    pub description: Option<String>,
}

/// One user's categories, as listed to admins.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserCategories {
    pub user_id: Uuid,
    pub categories: Vec<Category>,
}
