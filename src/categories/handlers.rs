use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        category_fields, CreateCategoryRequest, DeleteCategoryRequest, SearchQuery,
        UpdateCategoryRequest,
    },
    repo_types::{Category, UserCategories},
    services::{group_by_user, search_by_name},
};
use crate::{
    auth::extractors::{AdminUser, AuthUser},
    error::{parse_id, ApiResponse, AppError, AppResult},
    state::AppState,
};

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/categories/createCategory", post(create_category))
        .route("/categories/updateCategory", put(update_category))
        .route("/categories/getCategoryByUserId", get(list_categories))
        .route("/categories/getCategoryById/:category_id", get(get_category))
        .route("/categories/searchCategories", get(search_categories))
        .route("/categories/deleteCategory", delete(delete_category))
        .route("/categories/deleteCategoryByUserId", delete(delete_user_categories))
        .route("/categories/getAllCategoriesByAdmin", get(list_all_categories))
}

/// 404 unless the user owns at least one category.
async fn require_categories(state: &AppState, user_id: Uuid) -> AppResult<()> {
    if state.categories.exists_for_user(user_id).await? {
        Ok(())
    } else {
        warn!(%user_id, "user has no categories");
        Err(AppError::not_found("User categories not found."))
    }
}

async fn require_category(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<Category> {
    require_categories(state, user_id).await?;
    state
        .categories
        .find_by_id(user_id, id)
        .await?
        .ok_or_else(|| {
            warn!(%user_id, category_id = %id, "category not found");
            AppError::not_found("Category not found.")
        })
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser { id: user_id, .. }: AuthUser,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> AppResult<ApiResponse<Category>> {
    let Json(payload) = payload?;
    let fields = category_fields(&payload.category_name, payload.description)?;

    let first = !state.categories.exists_for_user(user_id).await?;
    let category = state.categories.insert(user_id, fields).await?;
    info!(%user_id, category_id = %category.id, first, "category created");
    Ok(ApiResponse::created("Category created successfully", category))
}

#[instrument(skip(state, payload))]
pub async fn update_category(
    State(state): State<AppState>,
    AuthUser { id: user_id, .. }: AuthUser,
    payload: Result<Json<UpdateCategoryRequest>, JsonRejection>,
) -> AppResult<ApiResponse<Category>> {
    let Json(payload) = payload?;
    let category_id = parse_id(&payload.category_id, "Category")?;
    let fields = category_fields(&payload.category_name, payload.description)?;

    require_category(&state, user_id, category_id).await?;
    let updated = state
        .categories
        .update_by_id(user_id, category_id, fields)
        .await?
        .ok_or_else(|| AppError::bad_request("Category update failed."))?;
    info!(%user_id, %category_id, "category updated");
    Ok(ApiResponse::ok("Category updated successfully", updated))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser { id: user_id, .. }: AuthUser,
) -> AppResult<ApiResponse<Vec<Category>>> {
    let categories = state.categories.list_for_user(user_id).await?;
    if categories.is_empty() {
        return Err(AppError::not_found("categories not found."));
    }
    Ok(ApiResponse::ok("Categories fetched successfully", categories))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    AuthUser { id: user_id, .. }: AuthUser,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<ApiResponse<Category>> {
    let Path(raw) = path?;
    let category_id = parse_id(&raw, "Category")?;
    let category = require_category(&state, user_id, category_id).await?;
    Ok(ApiResponse::ok("Category fetched successfully", category))
}

#[instrument(skip(state))]
pub async fn search_categories(
    State(state): State<AppState>,
    AuthUser { id: user_id, .. }: AuthUser,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> AppResult<ApiResponse<Vec<Category>>> {
    let Query(query) = query?;
    if query.name.trim().is_empty() {
        return Err(AppError::bad_request("name is required"));
    }
    let categories = state.categories.list_for_user(user_id).await?;
    if categories.is_empty() {
        return Err(AppError::not_found("User categories not found."));
    }
    let found = search_by_name(&categories, &query.name);
    Ok(ApiResponse::ok("Categories fetched successfully", found))
}

/// Expenses pointing at the removed category are left alone.
#[instrument(skip(state, payload))]
pub async fn delete_category(
    State(state): State<AppState>,
    AuthUser { id: user_id, .. }: AuthUser,
    payload: Result<Json<DeleteCategoryRequest>, JsonRejection>,
) -> AppResult<ApiResponse<Vec<Category>>> {
    let Json(payload) = payload?;
    let category_id = parse_id(&payload.category_id, "Category")?;

    require_category(&state, user_id, category_id).await?;
    if !state.categories.delete_by_id(user_id, category_id).await? {
        return Err(AppError::not_found("Category not found."));
    }
    let remaining = state.categories.list_for_user(user_id).await?;
    info!(%user_id, %category_id, remaining = remaining.len(), "category deleted");
    Ok(ApiResponse::ok("Category deleted successfully", remaining))
}

#[instrument(skip(state))]
pub async fn delete_user_categories(
    State(state): State<AppState>,
    AuthUser { id: user_id, .. }: AuthUser,
) -> AppResult<ApiResponse<()>> {
    require_categories(&state, user_id).await?;
    let removed = state.categories.delete_all_for_user(user_id).await?;
    info!(%user_id, removed, "all categories deleted");
    Ok(ApiResponse::message("Category deleted successfully"))
}

#[instrument(skip(state))]
pub async fn list_all_categories(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<ApiResponse<Vec<UserCategories>>> {
    let groups = group_by_user(state.categories.list_all().await?);
    info!(admin_id = %admin.id, users = groups.len(), "all categories listed");
    Ok(ApiResponse::ok("Categories fetched successfully", groups))
}
