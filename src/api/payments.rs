//! Payment-intent creation for tier purchases
//!
//! The price is always resolved server-side from the tier catalog; the
//! client only names the tier it wants.

use axum::extract::State;
use axum::Json;
use tracing::info;

use crate::error::AppError;
use crate::providers::PaymentIntentRequest;

use super::{PaymentRequest, PaymentResponse, PortalState};

/// POST /payments/create-payment-intent - start a tier checkout
pub(super) async fn create_payment_intent(
    State(state): State<PortalState>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    let tier = state
        .catalog
        .tier(&request.tier_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No tier with id {}", request.tier_id)))?;

    if !tier.is_available {
        return Err(AppError::BadRequest(format!(
            "Tier {} is not available for purchase",
            tier.name
        )));
    }

    let intent_request = PaymentIntentRequest::for_purchase(
        &tier,
        &request.user_id,
        &request.user_email,
        &state.payment_currency,
    )
    .ok_or_else(|| {
        AppError::BadRequest(format!("Tier {} has no purchasable price", tier.name))
    })?;

    let intent = state.payments.create_payment_intent(&intent_request).await?;
    info!(tier_id = %request.tier_id, amount = intent_request.amount, "Created payment intent");

    Ok(Json(PaymentResponse {
        client_secret: intent.client_secret,
    }))
}
