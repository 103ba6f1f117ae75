use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::{
    jwt::{JwtKeys, TokenKind},
    repo_types::Role,
};
use crate::{error::AppError, state::AppState};

/// Caller authenticated by an access token whose account is still active.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

/// An [`AuthUser`] holding the admin role; anyone else gets 403.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthUser);

/// Accepts both the raw token and the `Bearer <token>` form.
fn token_from_header(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
        .trim()
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(token_from_header)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Forbidden("Access denied".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify_kind(header, TokenKind::Access).map_err(|e| {
            warn!(error = %e, "rejected token");
            AppError::bad_request("Bad request")
        })?;

        let user = state
            .users
            .find_active_by_id(claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token for unknown or deleted user");
                AppError::Forbidden("Unauthorized".into())
            })?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            warn!(user_id = %user.id, "admin route called by non-admin");
            return Err(AppError::Forbidden(
                "Unauthorized, only accessible for admin.".into(),
            ));
        }
        Ok(AdminUser(user))
    }
}
