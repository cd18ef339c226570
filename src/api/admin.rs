//! Admin endpoints backed by the user directory

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::Json;

use crate::error::AppError;
use crate::types::PortalUser;

use super::{AdminCheckResponse, EmailQuery, PortalState};

/// GET /api/checkAdmin?email=<e> - admin membership for an email
pub(super) async fn check_admin(
    State(state): State<PortalState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<AdminCheckResponse>, AppError> {
    let email = query.require()?;
    let is_admin = state.directory.is_admin(email).await?;
    Ok(Json(AdminCheckResponse { is_admin }))
}

/// GET /api/users - directory listing, admin sessions only
pub(super) async fn list_users(
    State(state): State<PortalState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PortalUser>>, AppError> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthenticated)?;
    let email = state
        .directory
        .resolve_session(token)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    if !state.directory.is_admin(&email).await? {
        return Err(AppError::PermissionDenied);
    }

    let users = state.directory.list_users().await?;
    Ok(Json(users))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
