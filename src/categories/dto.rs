use serde::Deserialize;

use super::repo_types::CategoryFields;
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub category_name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub category_id: String,
    pub category_name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCategoryRequest {
    pub category_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: String,
}

/// Trims both fields; a blank name is rejected, a blank description dropped.
pub fn category_fields(name: &str, description: Option<String>) -> AppResult<CategoryFields> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("categoryName is required"));
    }
    Ok(CategoryFields {
        name: name.to_string(),
        description: description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
    })
}
