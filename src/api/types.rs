//! Request and response bodies shared across API handlers
//!
//! Wire field names follow the frontend's camelCase convention.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// POST /accounts/demo body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDemoRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// `mt5` or `mtt`; the configured default platform when omitted
    #[serde(default)]
    pub platform: Option<String>,
}

/// POST /mt5Accounts/:id/status body
#[derive(Debug, Clone, Deserialize)]
pub struct StatusChangeRequest {
    pub status: String,
}

/// POST /mt5Accounts/:id/email body
#[derive(Debug, Clone, Deserialize)]
pub struct EmailChangeRequest {
    pub email: String,
}

/// POST /demoAccounts/assign/:id body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignDemoRequest {
    pub mt5_account_id: String,
}

/// PATCH /demoAccounts/:id body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPatchRequest {
    pub assigned_to: String,
}

/// POST /demoAccounts/:id/link body
#[derive(Debug, Clone, Deserialize)]
pub struct LinkUsersRequest {
    pub emails: Vec<String>,
}

/// POST /payments/create-payment-intent body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub user_email: String,
    pub user_id: String,
    pub tier_id: String,
}

/// POST /payments/create-payment-intent response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub client_secret: String,
}

/// POST /feedback body
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    pub name: String,
    pub email: String,
    pub reason: String,
}

/// POST /waitingList body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingListRequest {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Query string carrying an email parameter
#[derive(Debug, Clone, Deserialize)]
pub struct EmailQuery {
    #[serde(default)]
    pub email: Option<String>,
}

impl EmailQuery {
    /// The email value, rejecting absent or empty parameters
    pub fn require(&self) -> Result<&str, AppError> {
        self.email
            .as_deref()
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))
    }
}

/// GET /api/checkAdmin response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCheckResponse {
    pub is_admin: bool,
}

/// GET /api/emailEligibility response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailEligibilityResponse {
    pub email: String,
    pub valid_format: bool,
    pub university_domain: bool,
    pub eligible: bool,
}
