//! MatchTrader broker API client
//!
//! Account and prop trading-account provisioning over the broker's REST
//! API, bearer-token authenticated. Trading accounts normalize into the
//! `mtt` variant of [`TradingAccount`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{build_http_client, check_status, BrokerApi, ProviderError, ProviderResult};
use crate::types::{AccountStatus, ClientType, PlatformKind, TradingAccount, VerificationStatus};

const SERVICE: &str = "matchtrader";

/// Name holder on a broker account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MttPersonalDetails {
    pub firstname: String,
    pub lastname: String,
}

/// Broker account (the client-level entity, not yet tradeable)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MttAccount {
    pub uuid: String,
    pub created: String,
    pub updated: String,
    pub email: String,
    pub verification_status: VerificationStatus,
    #[serde(rename = "type")]
    pub client_type: ClientType,
    pub personal_details: MttPersonalDetails,
}

/// Account-creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMttAccount {
    pub email: String,
    pub password: String,
    pub client_type: ClientType,
    pub create_as_deposited_account: bool,
    pub personal_details: MttPersonalDetails,
}

/// Per-challenge targets attached to a trading account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MttChallengeTargets {
    #[serde(default)]
    pub max_daily_loss: Option<f64>,
    #[serde(default)]
    pub max_loss: Option<f64>,
    #[serde(default)]
    pub profit_target: Option<f64>,
    #[serde(default)]
    pub max_daily_loss_equity_level: Option<f64>,
    #[serde(default)]
    pub max_loss_equity_level: Option<f64>,
    #[serde(default)]
    pub profit_target_equity_level: Option<f64>,
}

/// Challenge participation state of a trading account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MttChallengeDetails {
    #[serde(default)]
    pub challenge_uuid: Option<String>,
    #[serde(default)]
    pub phase_step: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub days_traded: Option<u32>,
    #[serde(default)]
    pub end_of_day_balance_snapshot: Option<f64>,
    #[serde(default)]
    pub is_ready_for_evaluation: bool,
    #[serde(default)]
    pub challenge_targets: MttChallengeTargets,
}

/// Broker trading account participating in a challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MttTradingAccount {
    pub id: String,
    #[serde(default)]
    pub broker_id: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub email: String,
    pub created: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub challenge_details: MttChallengeDetails,
}

/// Trading-account creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTradingAccount {
    pub challenge_id: String,
    pub account_uuid: String,
    pub name: String,
}

/// Query options for trading-account creation
#[derive(Debug, Clone)]
pub struct TradingAccountOptions {
    pub instantly_active: bool,
    pub phase_step: u32,
    pub add_on_ids: Vec<String>,
}

impl Default for TradingAccountOptions {
    fn default() -> Self {
        Self {
            instantly_active: true,
            phase_step: 1,
            add_on_ids: Vec::new(),
        }
    }
}

impl From<MttTradingAccount> for TradingAccount {
    fn from(account: MttTradingAccount) -> Self {
        let login = account.login.unwrap_or_default();
        let status = match account.challenge_details.status.as_deref() {
            Some(state) => {
                if state.starts_with("ACTIVE") {
                    AccountStatus::Active
                } else {
                    AccountStatus::Inactive
                }
            }
            None if !login.is_empty() => AccountStatus::Active,
            None => AccountStatus::Inactive,
        };

        TradingAccount {
            id: account.id,
            kind: PlatformKind::Mtt,
            server: account
                .broker_id
                .unwrap_or_else(|| "MatchTrader".to_string()),
            login,
            // Broker credentials stay with the SSO flow
            password: String::new(),
            email: account.email,
            status,
            challenge_id: account.challenge_details.challenge_uuid,
            demo_account_id: None,
            created_at: DateTime::parse_from_rfc3339(&account.created)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            updated_at: None,
        }
    }
}

/// Generate a broker account password (12 chars, letters/digits/symbols)
pub fn generate_account_password() -> String {
    const CHARSET: &[u8] =
        b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";
    const LENGTH: usize = 12;

    let mut rng = rand::thread_rng();
    (0..LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// REST client for the MatchTrader API
pub struct MatchTraderClient {
    client: Client,
    base_url: String,
    token: String,
}

impl MatchTraderClient {
    pub fn new(base_url: &str, token: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: build_http_client(timeout_secs),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }
}

fn http_err(source: reqwest::Error) -> ProviderError {
    ProviderError::Http {
        service: SERVICE,
        source,
    }
}

fn decode_err(source: reqwest::Error) -> ProviderError {
    ProviderError::Decode {
        service: SERVICE,
        detail: source.to_string(),
    }
}

#[async_trait]
impl BrokerApi for MatchTraderClient {
    async fn account_by_email(&self, email: &str) -> ProviderResult<MttAccount> {
        let url = format!("{}/v1/accounts/by-email/{}", self.base_url, email);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        response.json().await.map_err(decode_err)
    }

    async fn create_account(&self, request: &CreateMttAccount) -> ProviderResult<MttAccount> {
        debug!(email = %request.email, "Creating MatchTrader account");
        let url = format!("{}/v1/accounts", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await
            .map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        response.json().await.map_err(decode_err)
    }

    async fn create_trading_account(
        &self,
        request: &NewTradingAccount,
        options: &TradingAccountOptions,
    ) -> ProviderResult<MttTradingAccount> {
        debug!(
            challenge_id = %request.challenge_id,
            account_uuid = %request.account_uuid,
            "Creating MatchTrader trading account"
        );
        let url = format!("{}/v1/prop/accounts", self.base_url);

        let mut query: Vec<(&str, String)> = vec![
            ("instantlyActive", options.instantly_active.to_string()),
            ("phaseStep", options.phase_step.to_string()),
        ];
        if !options.add_on_ids.is_empty() {
            query.push(("addOnIds", options.add_on_ids.join(",")));
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .query(&query)
            .json(request)
            .send()
            .await
            .map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        response.json().await.map_err(decode_err)
    }
}
