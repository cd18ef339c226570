//! HTTP API exposed to the portal frontend
//!
//! Thin axum handlers over the registry, composer, and catalog. Handlers
//! parse input, delegate, and map failures through `AppError`; no business
//! rules live here. Route table and state wiring are in `create_router`.

mod accounts;
mod admin;
mod catalog;
mod dashboard;
mod payments;
mod types;

pub use types::*;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};

use crate::catalog::ChallengeCatalog;
use crate::composer::DashboardComposer;
use crate::error::AppError;
use crate::providers::{
    AccountStore, Directory, FeedbackEntry, PaymentGateway, PortalStore, TradeFeed,
    WaitingListEntry,
};
use crate::registry::Registry;
use crate::types::PlatformKind;
use crate::validation;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct PortalState {
    pub accounts: Arc<dyn AccountStore>,
    pub store: Arc<dyn PortalStore>,
    pub feed: Arc<dyn TradeFeed>,
    pub directory: Arc<dyn Directory>,
    pub payments: Arc<dyn PaymentGateway>,
    pub registry: Arc<Registry>,
    pub composer: Arc<DashboardComposer>,
    pub catalog: Arc<ChallengeCatalog>,
    /// Platform used when a provisioning request does not name one
    pub default_platform: PlatformKind,
    /// ISO currency code passed to the payment gateway
    pub payment_currency: String,
}

/// Create the API router with all endpoints
pub fn create_router(state: PortalState) -> Router {
    Router::new()
        // Health + admin
        .route("/api/health", get(get_health))
        .route("/api/checkAdmin", get(admin::check_admin))
        .route("/api/users", get(admin::list_users))
        .route("/api/emailEligibility", get(get_email_eligibility))
        // Demo-account pool
        .route(
            "/demoAccounts",
            get(accounts::list_demo_accounts).post(accounts::create_demo_account),
        )
        .route(
            "/demoAccounts/available",
            get(accounts::get_available_demo_account),
        )
        .route("/demoAccounts/assign/:id", post(accounts::assign_demo_account))
        .route("/demoAccounts/:id", patch(accounts::patch_demo_account))
        .route("/demoAccounts/:id/link", post(accounts::link_demo_users))
        // MT5 account records
        .route(
            "/mt5Accounts",
            get(accounts::list_mt5_accounts).post(accounts::create_mt5_account),
        )
        .route(
            "/mt5Accounts/email/:email",
            get(accounts::get_mt5_accounts_by_email),
        )
        .route(
            "/mt5Accounts/:id",
            get(accounts::get_mt5_account).put(accounts::update_mt5_account),
        )
        .route("/mt5Accounts/:id/status", post(accounts::change_mt5_status))
        .route("/mt5Accounts/:id/email", post(accounts::change_mt5_email))
        // Cross-platform account operations
        .route("/accounts/demo", post(accounts::provision_demo_account))
        .route("/accounts/email/:email", get(accounts::get_accounts_by_email))
        // Trade data + dashboard
        .route("/tradeData/upload", post(dashboard::upload_trade_data))
        .route("/tradeData/:mt5Login", get(dashboard::get_trade_data))
        .route("/dashboard/:mt5Login", get(dashboard::get_dashboard))
        .route("/rankings", get(dashboard::get_rankings))
        // Catalog
        .route("/api/challenges", get(catalog::list_challenges))
        .route("/api/challenges/:id", get(catalog::get_challenge))
        .route("/tiers", get(catalog::list_tiers))
        .route("/tiers/:id", get(catalog::get_tier))
        // Payments + signup support
        .route(
            "/payments/create-payment-intent",
            post(payments::create_payment_intent),
        )
        .route("/feedback", post(post_feedback))
        .route("/waitingList", post(post_waiting_list))
        // State
        .with_state(state)
        // CORS for frontend
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Bind and serve until a ctrl-c arrives
pub async fn start_server(state: PortalState, port: u16) -> Result<()> {
    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("🌐 Portal API server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", error);
        return;
    }
    tracing::info!("Shutdown signal received, draining connections");
}

// ─────────────────────────────────────────────────────────────────
// Signup-support handlers
// ─────────────────────────────────────────────────────────────────

/// GET /api/health - liveness probe
async fn get_health() -> impl IntoResponse {
    Json(ApiResponse::success("ok"))
}

/// GET /api/emailEligibility?email=<e> - format and student-program checks
async fn get_email_eligibility(
    Query(query): Query<EmailQuery>,
) -> Result<Json<EmailEligibilityResponse>, AppError> {
    let email = query.require()?;
    let valid_format = validation::is_valid_email(email);
    let university_domain = validation::is_university_email(email);

    Ok(Json(EmailEligibilityResponse {
        email: email.to_string(),
        valid_format,
        university_domain,
        eligible: valid_format && university_domain,
    }))
}

/// POST /feedback - store a feedback entry
async fn post_feedback(
    State(state): State<PortalState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if request.name.trim().is_empty() || request.reason.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Name and reason are required".to_string(),
        ));
    }
    if !validation::is_valid_email(&request.email) {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }

    let entry = FeedbackEntry {
        name: request.name,
        email: request.email,
        reason: request.reason,
        created_at: Utc::now(),
    };
    state.store.submit_feedback(&entry).await?;

    Ok(Json(ApiResponse::success(())))
}

/// POST /waitingList - join the queue for the next free demo account
async fn post_waiting_list(
    State(state): State<PortalState>,
    Json(request): Json<WaitingListRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !validation::is_valid_email(&request.email) {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }

    let entry = WaitingListEntry {
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
        created_at: Utc::now(),
    };
    state.store.join_waiting_list(&entry).await?;

    Ok(Json(ApiResponse::success(())))
}
