//! Challenge and tier catalog endpoints

use axum::extract::{Path, State};
use axum::Json;

use crate::error::AppError;
use crate::types::{ChallengeDefinition, Tier};

use super::PortalState;

/// GET /api/challenges - active challenge definitions
pub(super) async fn list_challenges(
    State(state): State<PortalState>,
) -> Json<Vec<ChallengeDefinition>> {
    Json(state.catalog.challenges().await)
}

/// GET /api/challenges/:id - one challenge
pub(super) async fn get_challenge(
    State(state): State<PortalState>,
    Path(id): Path<String>,
) -> Result<Json<ChallengeDefinition>, AppError> {
    state
        .catalog
        .challenge(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No challenge with id {id}")))
}

/// GET /tiers - purchasable tiers
pub(super) async fn list_tiers(State(state): State<PortalState>) -> Json<Vec<Tier>> {
    Json(state.catalog.tiers().await)
}

/// GET /tiers/:id - one tier
pub(super) async fn get_tier(
    State(state): State<PortalState>,
    Path(id): Path<String>,
) -> Result<Json<Tier>, AppError> {
    state
        .catalog
        .tier(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No tier with id {id}")))
}
