//! Account endpoints: demo pool maintenance, MT5 records, provisioning
//!
//! Pool and MT5 reads go straight to the providers; anything that changes
//! assignment, status, or ownership goes through the registry so audit and
//! credential rules apply.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::AppError;
use crate::providers::{DemoAccount, Mt5Account, Mt5AccountUpdate, NewDemoAccount, NewMt5Account};
use crate::types::{AccountStatus, PlatformKind, TradingAccount};
use crate::validation;

use super::{
    ApiResponse, AssignDemoRequest, AssignmentPatchRequest, CreateDemoRequest, EmailChangeRequest,
    LinkUsersRequest, PortalState, StatusChangeRequest,
};

// ─────────────────────────────────────────────────────────────────
// Demo-account pool
// ─────────────────────────────────────────────────────────────────

/// GET /demoAccounts - full pool listing
pub(super) async fn list_demo_accounts(
    State(state): State<PortalState>,
) -> Result<Json<Vec<DemoAccount>>, AppError> {
    Ok(Json(state.store.demo_accounts().await?))
}

/// POST /demoAccounts - add an unassigned pool entry
pub(super) async fn create_demo_account(
    State(state): State<PortalState>,
    Json(request): Json<NewDemoAccount>,
) -> Result<Json<DemoAccount>, AppError> {
    Ok(Json(state.store.create_demo(&request).await?))
}

/// GET /demoAccounts/available - next unassigned entry, 204 when the pool is empty
pub(super) async fn get_available_demo_account(
    State(state): State<PortalState>,
) -> Result<Response, AppError> {
    match state.store.available_demo().await? {
        Some(entry) => Ok(Json(entry).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// PATCH /demoAccounts/:id - assignment maintenance
pub(super) async fn patch_demo_account(
    State(state): State<PortalState>,
    Path(id): Path<String>,
    Json(request): Json<AssignmentPatchRequest>,
) -> Result<Json<DemoAccount>, AppError> {
    let patched = state
        .registry
        .update_assignment(&id, &request.assigned_to)
        .await?;
    Ok(Json(patched))
}

/// POST /demoAccounts/assign/:id - bind a pool entry to an MT5 account
pub(super) async fn assign_demo_account(
    State(state): State<PortalState>,
    Path(id): Path<String>,
    Json(request): Json<AssignDemoRequest>,
) -> Result<Json<DemoAccount>, AppError> {
    let assigned = state
        .store
        .assign_demo(&id, &request.mt5_account_id)
        .await?;
    Ok(Json(assigned))
}

/// POST /demoAccounts/:id/link - attach team-member emails to an entry
pub(super) async fn link_demo_users(
    State(state): State<PortalState>,
    Path(id): Path<String>,
    Json(request): Json<LinkUsersRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.registry.link_users(&id, &request.emails).await?;
    Ok(Json(ApiResponse::success(())))
}

// ─────────────────────────────────────────────────────────────────
// MT5 account records
// ─────────────────────────────────────────────────────────────────

/// GET /mt5Accounts - every stored MT5 account
pub(super) async fn list_mt5_accounts(
    State(state): State<PortalState>,
) -> Result<Json<Vec<Mt5Account>>, AppError> {
    Ok(Json(state.accounts.list().await?))
}

/// GET /mt5Accounts/:id - one account by document id
pub(super) async fn get_mt5_account(
    State(state): State<PortalState>,
    Path(id): Path<String>,
) -> Result<Json<Mt5Account>, AppError> {
    Ok(Json(state.accounts.get(&id).await?))
}

/// GET /mt5Accounts/email/:email - accounts held by an email
pub(super) async fn get_mt5_accounts_by_email(
    State(state): State<PortalState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Mt5Account>>, AppError> {
    Ok(Json(state.accounts.find_by_email(&email).await?))
}

/// POST /mt5Accounts - create a record directly
pub(super) async fn create_mt5_account(
    State(state): State<PortalState>,
    Json(request): Json<NewMt5Account>,
) -> Result<Json<Mt5Account>, AppError> {
    Ok(Json(state.accounts.create(&request).await?))
}

/// PUT /mt5Accounts/:id - raw field update, no audit trail
pub(super) async fn update_mt5_account(
    State(state): State<PortalState>,
    Path(id): Path<String>,
    Json(request): Json<Mt5AccountUpdate>,
) -> Result<Json<Mt5Account>, AppError> {
    Ok(Json(state.accounts.update(&id, &request).await?))
}

/// POST /mt5Accounts/:id/status - audited status change
pub(super) async fn change_mt5_status(
    State(state): State<PortalState>,
    Path(id): Path<String>,
    Json(request): Json<StatusChangeRequest>,
) -> Result<Json<TradingAccount>, AppError> {
    let status = AccountStatus::from_str(&request.status)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid status: {}", request.status)))?;
    let account = state.registry.set_status(&id, status).await?;
    Ok(Json(account))
}

/// POST /mt5Accounts/:id/email - audited ownership transfer
pub(super) async fn change_mt5_email(
    State(state): State<PortalState>,
    Path(id): Path<String>,
    Json(request): Json<EmailChangeRequest>,
) -> Result<Json<TradingAccount>, AppError> {
    if !validation::is_valid_email(&request.email) {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    let account = state.registry.reassign_email(&id, &request.email).await?;
    Ok(Json(account))
}

// ─────────────────────────────────────────────────────────────────
// Cross-platform operations
// ─────────────────────────────────────────────────────────────────

/// POST /accounts/demo - provision a demo account on the chosen platform
pub(super) async fn provision_demo_account(
    State(state): State<PortalState>,
    Json(request): Json<CreateDemoRequest>,
) -> Result<Json<ApiResponse<TradingAccount>>, AppError> {
    if request.email.trim().is_empty()
        || request.first_name.trim().is_empty()
        || request.last_name.trim().is_empty()
    {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    }
    if !validation::is_valid_email(&request.email) {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }

    let platform = match request.platform.as_deref() {
        Some(name) => PlatformKind::from_str(name)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown platform: {name}")))?,
        None => state.default_platform,
    };

    let account = state
        .registry
        .create_demo_account(
            &request.email,
            &request.first_name,
            &request.last_name,
            platform,
        )
        .await?;

    Ok(Json(ApiResponse::success(account)))
}

/// GET /accounts/email/:email - normalized view across both platforms
pub(super) async fn get_accounts_by_email(
    State(state): State<PortalState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<TradingAccount>>, AppError> {
    Ok(Json(state.registry.list_accounts_for_user(&email).await?))
}
