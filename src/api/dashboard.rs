//! Trade-data passthrough, rankings, and the composed dashboard view

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use tracing::info;

use crate::composer::DashboardView;
use crate::error::AppError;
use crate::types::{Ranking, TradeDataDocument};
use crate::validation;

use super::{ApiResponse, EmailQuery, PortalState};

/// GET /tradeData/:mt5Login - raw trade-data document
///
/// Mirrors the upstream envelope: an unknown login is a 200 with
/// `success: false`, which the frontend renders as the no-data state.
pub(super) async fn get_trade_data(
    State(state): State<PortalState>,
    Path(mt5_login): Path<String>,
) -> Result<Json<ApiResponse<TradeDataDocument>>, AppError> {
    match state.feed.account_data(&mt5_login).await {
        Ok(document) => Ok(Json(ApiResponse::success(document))),
        Err(error) if error.is_not_found() => Ok(Json(ApiResponse::error(
            "No trade data found for this account",
        ))),
        Err(error) => Err(error.into()),
    }
}

/// POST /tradeData/upload - validate and forward a trade-data document
pub(super) async fn upload_trade_data(
    State(state): State<PortalState>,
    Json(document): Json<TradeDataDocument>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let login = validation::validate_upload(&document).map_err(AppError::BadRequest)?;

    state.feed.upload(&document).await?;
    info!(mt5_login = %login, "Accepted trade-data upload");

    Ok(Json(ApiResponse::success(())))
}

/// GET /dashboard/:mt5Login?email=<e> - composed view for one account
pub(super) async fn get_dashboard(
    State(state): State<PortalState>,
    Path(mt5_login): Path<String>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<DashboardView>, AppError> {
    let email = query.require()?;
    let view = state.composer.compose(email, &mt5_login, Utc::now()).await?;
    Ok(Json(view))
}

/// GET /rankings - current leaderboard
pub(super) async fn get_rankings(
    State(state): State<PortalState>,
) -> Result<Json<Vec<Ranking>>, AppError> {
    Ok(Json(state.feed.rankings().await?))
}
