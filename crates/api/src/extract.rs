use std::sync::Arc;

use auth::AuthUser;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::routes::ApiState;

/// Requires a valid `Authorization: Bearer <token>` header.
pub struct CurrentUser(pub AuthUser);

/// Like [`CurrentUser`], but a missing or bad token means an anonymous caller.
pub struct MaybeUser(pub Option<AuthUser>);

fn authenticate(parts: &Parts, state: &ApiState) -> Result<AuthUser, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;
    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Invalid authorization header"))?;
    state
        .tokens
        .verify(token)
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(CurrentUser)
    }
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(authenticate(parts, state).ok()))
    }
}
