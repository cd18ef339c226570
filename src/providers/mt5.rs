//! MT5-account service client
//!
//! CRUD against the credential-storage microservice. Wire timestamps are
//! asymmetric upstream (`createdAt` as second/nanosecond pairs,
//! `updatedAt` as an ISO string) and are normalized here.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{build_http_client, check_status, AccountStore, ProviderError, ProviderResult};
use crate::types::{AccountStatus, PlatformKind, StoreTimestamp, TradingAccount};

const SERVICE: &str = "mt5-accounts";

/// Stored MT5 account as served by the microservice
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mt5Account {
    pub id: String,
    pub server: String,
    pub login: String,
    pub password: String,
    pub email: String,
    pub status: AccountStatus,
    #[serde(default)]
    pub created_at: Option<StoreTimestamp>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMt5Account {
    pub server: String,
    pub login: String,
    pub password: String,
    pub email: String,
    pub status: AccountStatus,
}

/// Full-replace update payload for PUT
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mt5AccountUpdate {
    pub server: String,
    pub login: String,
    pub password: String,
    pub email: String,
    pub status: AccountStatus,
}

impl Mt5AccountUpdate {
    /// Update carrying the account's current fields unchanged
    pub fn from_account(account: &Mt5Account) -> Self {
        Self {
            server: account.server.clone(),
            login: account.login.clone(),
            password: account.password.clone(),
            email: account.email.clone(),
            status: account.status,
        }
    }
}

impl From<Mt5Account> for TradingAccount {
    fn from(account: Mt5Account) -> Self {
        TradingAccount {
            id: account.id,
            kind: PlatformKind::Mt5,
            server: account.server,
            login: account.login,
            password: account.password,
            email: account.email,
            status: account.status,
            challenge_id: None,
            demo_account_id: None,
            created_at: account.created_at.and_then(|ts| ts.to_datetime()),
            updated_at: account
                .updated_at
                .as_deref()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|dt| dt.with_timezone(&chrono::Utc)),
        }
    }
}

/// REST client for the MT5-account service
pub struct Mt5AccountsClient {
    client: Client,
    base_url: String,
}

impl Mt5AccountsClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            client: build_http_client(timeout_secs),
            base_url: base_url.trim_end_matches('/').to_string(),
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
impl AccountStore for Mt5AccountsClient {
    async fn list(&self) -> ProviderResult<Vec<Mt5Account>> {
        let url = format!("{}/", self.base_url);
        let response = self.client.get(&url).send().await.map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        response.json().await.map_err(decode_err)
    }

    async fn get(&self, id: &str) -> ProviderResult<Mt5Account> {
        let url = format!("{}/{}", self.base_url, id);
        let response = self.client.get(&url).send().await.map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        response.json().await.map_err(decode_err)
    }

    async fn find_by_email(&self, email: &str) -> ProviderResult<Vec<Mt5Account>> {
        let url = format!("{}/email/{}", self.base_url, email);
        let response = self.client.get(&url).send().await.map_err(http_err)?;
        match check_status(SERVICE, response).await {
            Ok(response) => response.json().await.map_err(decode_err),
            // No account for this email yet
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    async fn create(&self, account: &NewMt5Account) -> ProviderResult<Mt5Account> {
        debug!(email = %account.email, "Creating MT5 account");
        let url = format!("{}/", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(account)
            .send()
            .await
            .map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        response.json().await.map_err(decode_err)
    }

    async fn update(&self, id: &str, update: &Mt5AccountUpdate) -> ProviderResult<Mt5Account> {
        debug!(account_id = %id, status = %update.status, "Updating MT5 account");
        let url = format!("{}/{}", self.base_url, id);
        let response = self
            .client
            .put(&url)
            .json(update)
            .send()
            .await
            .map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        response.json().await.map_err(decode_err)
    }
}
