use axum::{
    extract::{rejection::JsonRejection, FromRef, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RefreshRequest, SignupRequest},
        extractors::{AdminUser, AuthUser},
        jwt::{JwtKeys, TokenKind},
        password::{hash_password, verify_password, MIN_PASSWORD_LEN},
        repo::DuplicateUser,
        repo_types::{NewUser, Role, User},
        services::{clean_name, is_valid_email, is_valid_mobile, normalize_email},
    },
    error::{ApiResponse, AppError, AppResult},
    state::AppState,
};

const DUPLICATE_ACCOUNT: &str = "Email or mobile number already registered";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/signup", post(signup))
        .route("/user/login", post(login))
        .route("/user/refreshToken", post(refresh))
        .route("/user/profile", get(profile))
        .route("/user/deleteAccount", delete(delete_account))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/user/getAllUsersByAdmin", get(list_users))
        .route("/user/deleteUserByAdmin/:user_id", delete(delete_user))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);
    let mobile_number = payload.mobile_number.trim().to_string();

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::bad_request("Invalid email"));
    }
    if !is_valid_mobile(&mobile_number) {
        warn!("invalid mobile number");
        return Err(AppError::bad_request("Invalid mobile number"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::bad_request("Password too short"));
    }

    if let Some(existing) = state
        .users
        .find_active_by_email_or_mobile(&email, &mobile_number)
        .await?
    {
        warn!(user_id = %existing.id, "email or mobile already registered");
        return Err(AppError::Conflict(DUPLICATE_ACCOUNT.into()));
    }

    let user = state
        .users
        .create(NewUser {
            first_name: clean_name(payload.first_name),
            last_name: clean_name(payload.last_name),
            email,
            mobile_number,
            password_hash: hash_password(&payload.password)?,
            role: Role::User,
            is_verified: false,
        })
        .await
        .map_err(|e| {
            if e.is::<DuplicateUser>() {
                warn!("signup lost a race on email or mobile");
                AppError::Conflict(DUPLICATE_ACCOUNT.into())
            } else {
                AppError::Internal(e)
            }
        })?;

    let tokens = JwtKeys::from_ref(&state).issue_pair(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(ApiResponse::created(
        "Signup successful",
        AuthResponse { tokens, user },
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::bad_request("Invalid email"));
    }

    let invalid = || AppError::Unauthorized("Invalid credentials".into());
    let Some(user) = state.users.find_active_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(invalid());
    };
    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    let tokens = JwtKeys::from_ref(&state).issue_pair(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(ApiResponse::ok("Login successful", AuthResponse { tokens, user }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let Json(payload) = payload?;
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_kind(&payload.refresh_token, TokenKind::Refresh)
        .map_err(|e| {
            warn!(error = %e, "refresh rejected");
            AppError::Unauthorized("Invalid or expired refresh token".into())
        })?;

    let user = state
        .users
        .find_active_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    let tokens = keys.issue_pair(user.id)?;
    Ok(ApiResponse::ok("Token refreshed", AuthResponse { tokens, user }))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<ApiResponse<User>> {
    let user = state
        .users
        .find_active_by_id(auth.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found."))?;
    Ok(ApiResponse::ok("Profile fetched successfully", user))
}

#[instrument(skip(state))]
pub async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<ApiResponse<()>> {
    if !state.users.soft_delete(auth.id).await? {
        return Err(AppError::not_found("User not found."));
    }
    info!(user_id = %auth.id, "account soft-deleted");
    Ok(ApiResponse::message("Account deleted successfully"))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<ApiResponse<Vec<User>>> {
    let users = state.users.list_all().await?;
    info!(admin_id = %admin.id, count = users.len(), "users listed");
    Ok(ApiResponse::ok("Users fetched successfully", users))
}

/// Hard delete; the user's categories and expenses go with it.
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    path: Result<Path<Uuid>, axum::extract::rejection::PathRejection>,
) -> AppResult<ApiResponse<()>> {
    let Path(user_id) = path?;
    if user_id == admin.id {
        return Err(AppError::bad_request("Admins cannot delete themselves"));
    }
    if !state.users.delete(user_id).await? {
        return Err(AppError::not_found("User not found."));
    }
    info!(admin_id = %admin.id, %user_id, "user deleted by admin");
    Ok(ApiResponse::message("User deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::build_app,
        memory::{read_json, seed_user, send},
    };
    use crate::{auth::repo::UserStore, memory::MemoryUserStore};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    /// User store whose duplicate lookup misses (as when a concurrent signup
    /// commits in between) and whose hard delete can be made to fail.
    #[derive(Default)]
    struct FlakyUsers {
        inner: MemoryUserStore,
        stale_lookups: bool,
        failing_deletes: bool,
    }

    #[async_trait]
    impl UserStore for FlakyUsers {
        async fn find_active_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
            self.inner.find_active_by_id(id).await
        }
        async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
            self.inner.find_active_by_email(email).await
        }
        async fn find_active_by_email_or_mobile(
            &self,
            email: &str,
            mobile_number: &str,
        ) -> anyhow::Result<Option<User>> {
            if self.stale_lookups {
                return Ok(None);
            }
            self.inner.find_active_by_email_or_mobile(email, mobile_number).await
        }
        async fn find_active_admin(&self) -> anyhow::Result<Option<User>> {
            self.inner.find_active_admin().await
        }
        async fn create(&self, new: NewUser) -> anyhow::Result<User> {
            self.inner.create(new).await
        }
        async fn list_all(&self) -> anyhow::Result<Vec<User>> {
            self.inner.list_all().await
        }
        async fn soft_delete(&self, id: Uuid) -> anyhow::Result<bool> {
            self.inner.soft_delete(id).await
        }
        async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
            if self.failing_deletes {
                anyhow::bail!("connection reset");
            }
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn signup_then_login_then_profile() {
        let state = AppState::fake();
        let app = build_app(state);

        let body = json!({
            "firstName": "Maya",
            "email": "Maya@Example.com",
            "mobileNumber": "9876543210",
            "password": "long-enough-pw",
        });
        let res = send(&app, "POST", "/user/signup", None, Some(body)).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let json = read_json(res).await;
        assert_eq!(json["data"]["user"]["email"], "maya@example.com");
        assert_eq!(json["data"]["user"]["role"], "user");
        assert!(json["data"]["user"].get("passwordHash").is_none());

        let res = send(
            &app,
            "POST",
            "/user/login",
            None,
            Some(json!({"email": "maya@example.com", "password": "long-enough-pw"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let json = read_json(res).await;
        let token = json["data"]["accessToken"].as_str().unwrap().to_string();

        let res = send(&app, "GET", "/user/profile", Some(&token), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let json = read_json(res).await;
        assert_eq!(json["data"]["firstName"], "Maya");
    }

    #[tokio::test]
    async fn signup_rejects_duplicate_email() {
        let state = AppState::fake();
        seed_user(&state, "dup@example.com", Role::User).await;
        let app = build_app(state);

        let body = json!({
            "email": "dup@example.com",
            "mobileNumber": "1112223334",
            "password": "long-enough-pw",
        });
        let res = send(&app, "POST", "/user/signup", None, Some(body)).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let state = AppState::fake();
        seed_user(&state, "who@example.com", Role::User).await;
        let app = build_app(state);

        let res = send(
            &app,
            "POST",
            "/user/login",
            None,
            Some(json!({"email": "who@example.com", "password": "nope-nope-nope"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json(res).await["responseCode"], 401);
    }

    #[tokio::test]
    async fn refresh_issues_new_access_token() {
        let state = AppState::fake();
        let (user, _) = seed_user(&state, "r@example.com", Role::User).await;
        let refresh_token = JwtKeys::from_ref(&state).sign_refresh(user.id).unwrap();
        let app = build_app(state);

        let res = send(
            &app,
            "POST",
            "/user/refreshToken",
            None,
            Some(json!({ "refreshToken": refresh_token })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let json = read_json(res).await;
        assert!(json["data"]["accessToken"].is_string());
    }

    #[tokio::test]
    async fn refresh_token_cannot_authenticate_requests() {
        let state = AppState::fake();
        let (user, _) = seed_user(&state, "r2@example.com", Role::User).await;
        let refresh_token = JwtKeys::from_ref(&state).sign_refresh(user.id).unwrap();
        let app = build_app(state);

        let res = send(&app, "GET", "/user/profile", Some(&refresh_token), None).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_token_is_forbidden() {
        let app = build_app(AppState::fake());
        let res = send(&app, "GET", "/user/profile", None, None).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(read_json(res).await["responseMessage"], "Access denied");
    }

    #[tokio::test]
    async fn deleted_account_token_stops_working() {
        let state = AppState::fake();
        let (_, token) = seed_user(&state, "gone@example.com", Role::User).await;
        let app = build_app(state);

        let res = send(&app, "DELETE", "/user/deleteAccount", Some(&token), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let res = send(&app, "GET", "/user/profile", Some(&token), None).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_routes_reject_regular_users() {
        let state = AppState::fake();
        let (_, token) = seed_user(&state, "plain@example.com", Role::User).await;
        let app = build_app(state);

        let res = send(&app, "GET", "/user/getAllUsersByAdmin", Some(&token), None).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_hard_delete_removes_user_rows() {
        let state = AppState::fake();
        let (_, admin_token) = seed_user(&state, "boss@example.com", Role::Admin).await;
        let (victim, victim_token) = seed_user(&state, "v@example.com", Role::User).await;
        let app = build_app(state.clone());

        let res = send(
            &app,
            "POST",
            "/categories/createCategory",
            Some(&victim_token),
            Some(json!({"categoryName": "Food"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let category_id = read_json(res).await["data"]["id"].clone();
        let res = send(
            &app,
            "POST",
            "/expenses/createExpense",
            Some(&victim_token),
            Some(json!({"categoryId": category_id, "amount": 4})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let uri = format!("/user/deleteUserByAdmin/{}", victim.id);
        let res = send(&app, "DELETE", &uri, Some(&admin_token), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(state.users.list_all().await.unwrap().iter().all(|u| u.id != victim.id));
        assert!(!state.categories.exists_for_user(victim.id).await.unwrap());
        assert!(state.expenses.list_for_user(victim.id).await.unwrap().is_empty());

        let res = send(&app, "DELETE", &uri, Some(&admin_token), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn signup_racing_an_existing_account_is_conflict() {
        let mut state = AppState::fake();
        state.users = Arc::new(FlakyUsers {
            stale_lookups: true,
            ..Default::default()
        });
        seed_user(&state, "taken@example.com", Role::User).await;
        let app = build_app(state);

        let body = json!({
            "email": "taken@example.com",
            "mobileNumber": "9123456780",
            "password": "long-enough-pw",
        });
        let res = send(&app, "POST", "/user/signup", None, Some(body)).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(read_json(res).await["responseMessage"], DUPLICATE_ACCOUNT);
    }

    #[tokio::test]
    async fn failed_hard_delete_leaves_user_data_intact() {
        let mut state = AppState::fake();
        state.users = Arc::new(FlakyUsers {
            failing_deletes: true,
            ..Default::default()
        });
        let (_, admin_token) = seed_user(&state, "boss@example.com", Role::Admin).await;
        let (victim, victim_token) = seed_user(&state, "v@example.com", Role::User).await;
        let app = build_app(state.clone());

        let res = send(
            &app,
            "POST",
            "/categories/createCategory",
            Some(&victim_token),
            Some(json!({"categoryName": "Rent"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let uri = format!("/user/deleteUserByAdmin/{}", victim.id);
        let res = send(&app, "DELETE", &uri, Some(&admin_token), None).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(state.categories.exists_for_user(victim.id).await.unwrap());
        let res = send(&app, "GET", "/user/profile", Some(&victim_token), None).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn deleting_unknown_user_touches_nothing() {
        let state = AppState::fake();
        let (admin, admin_token) = seed_user(&state, "boss@example.com", Role::Admin).await;
        let app = build_app(state.clone());

        let res = send(
            &app,
            "POST",
            "/categories/createCategory",
            Some(&admin_token),
            Some(json!({"categoryName": "Travel"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let uri = format!("/user/deleteUserByAdmin/{}", Uuid::new_v4());
        let res = send(&app, "DELETE", &uri, Some(&admin_token), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(state.categories.exists_for_user(admin.id).await.unwrap());
    }
}
