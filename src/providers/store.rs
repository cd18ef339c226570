//! Datastore service client
//!
//! The portal's remote store: demo-account pool, broker-account mirrors,
//! challenge/tier catalog, audit trail, feedback and waiting list. All of
//! it lives behind one origin selected by environment.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    build_http_client, check_status, MttAccount, MttTradingAccount, PortalStore, ProviderError,
    ProviderResult,
};
use crate::types::{
    AuditRecord, ChallengeDefinition, ChallengeStatus, ClientType, StoreTimestamp, Tier,
    VerificationStatus,
};

const SERVICE: &str = "datastore";

/// Pool entry holding pre-provisioned MT5 demo credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoAccount {
    #[serde(default)]
    pub id: Option<String>,
    pub login: String,
    pub password: String,
    /// Investor (read-only) password
    pub readonly: String,
    pub server: String,
    #[serde(default)]
    pub email: String,
    /// MT5-account id this entry is bound to; empty while in the pool
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub created_at: Option<StoreTimestamp>,
    #[serde(default)]
    pub updated_at: Option<StoreTimestamp>,
}

/// Payload for adding a pool entry; lands unassigned
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDemoAccount {
    pub login: String,
    pub password: String,
    pub readonly: String,
    pub server: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub assigned_to: String,
}

/// Assignment patch for a pool entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoAccountPatch {
    pub assigned_to: String,
    pub updated_at: DateTime<Utc>,
}

impl DemoAccountPatch {
    pub fn assign_to(holder: impl Into<String>) -> Self {
        Self {
            assigned_to: holder.into(),
            updated_at: Utc::now(),
        }
    }
}

/// Broker account mirror kept in the datastore
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMttAccount {
    pub uuid: String,
    pub created: String,
    pub updated: String,
    pub email: String,
    pub verification_status: VerificationStatus,
    #[serde(rename = "type")]
    pub client_type: ClientType,
    pub password: String,
}

impl StoredMttAccount {
    pub fn from_account(account: &MttAccount, password: &str) -> Self {
        Self {
            uuid: account.uuid.clone(),
            created: account.created.clone(),
            updated: account.updated.clone(),
            email: account.email.clone(),
            verification_status: account.verification_status,
            client_type: account.client_type,
            password: password.to_string(),
        }
    }
}

/// Challenge details as mirrored to the datastore (`phaseStep` is stored
/// as a string there)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredChallengeDetails {
    #[serde(default)]
    pub challenge_uuid: Option<String>,
    #[serde(default)]
    pub phase_step: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub days_traded: Option<u32>,
    #[serde(default)]
    pub is_ready_for_evaluation: bool,
}

/// Trading-account mirror kept in the datastore
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMttTradingAccount {
    pub id: String,
    pub created: String,
    #[serde(default)]
    pub broker_id: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub challenge_details: StoredChallengeDetails,
}

impl StoredMttTradingAccount {
    pub fn from_provisioned(account: &MttTradingAccount, name: &str) -> Self {
        let details = &account.challenge_details;
        Self {
            id: account.id.clone(),
            created: account.created.clone(),
            broker_id: account.broker_id.clone(),
            login: account.login.clone(),
            name: name.to_string(),
            email: account.email.clone(),
            challenge_details: StoredChallengeDetails {
                challenge_uuid: details.challenge_uuid.clone(),
                phase_step: details.phase_step.map(|step| step.to_string()),
                status: details.status.clone(),
                days_traded: details.days_traded,
                is_ready_for_evaluation: details.is_ready_for_evaluation,
            },
        }
    }
}

/// Feedback form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub name: String,
    pub email: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Waiting-list signup, the degraded path when the pool is exhausted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingListEntry {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Challenge document as stored (Firestore-style timestamp pairs)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChallengeWire {
    id: String,
    name: String,
    start_date: StoreTimestamp,
    end_date: StoreTimestamp,
    #[serde(default)]
    profit_target: Option<f64>,
    #[serde(default)]
    max_daily_loss_percent: Option<f64>,
    #[serde(default)]
    max_total_loss_percent: Option<f64>,
    #[serde(default)]
    is_education: bool,
    #[serde(default)]
    display_dashboard: bool,
    #[serde(default)]
    status: Option<ChallengeStatus>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    fee: Option<Decimal>,
    #[serde(default)]
    initial_balance: Option<Decimal>,
}

impl ChallengeWire {
    fn into_definition(self) -> Option<ChallengeDefinition> {
        let start_date = self.start_date.to_datetime()?;
        let end_date = self.end_date.to_datetime()?;
        Some(ChallengeDefinition {
            id: self.id,
            name: self.name,
            start_date,
            end_date,
            profit_target: self.profit_target.unwrap_or(10.0),
            max_daily_loss_percent: self.max_daily_loss_percent.unwrap_or(5.0),
            max_total_loss_percent: self.max_total_loss_percent.unwrap_or(10.0),
            is_education: self.is_education,
            display_dashboard: self.display_dashboard,
            status: self.status,
            user_id: self.user_id,
            fee: self.fee.unwrap_or(Decimal::ZERO),
            initial_balance: self.initial_balance.unwrap_or(dec!(10_000)),
        })
    }
}

/// REST client for the datastore service
pub struct PortalStoreClient {
    client: reqwest::Client,
    base_url: String,
}

impl PortalStoreClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            client: build_http_client(timeout_secs),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> ProviderResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        response.json().await.map_err(decode_err)
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> ProviderResult<()> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(http_err)?;
        check_status(SERVICE, response).await?;
        Ok(())
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
impl PortalStore for PortalStoreClient {
    async fn demo_accounts(&self) -> ProviderResult<Vec<DemoAccount>> {
        self.get_json("/demoAccounts").await
    }

    async fn available_demo(&self) -> ProviderResult<Option<DemoAccount>> {
        let response = self
            .client
            .get(self.url("/demoAccounts/available"))
            .send()
            .await
            .map_err(http_err)?;

        // An exhausted pool answers 204 or an empty body
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let response = check_status(SERVICE, response).await?;
        let body = response.text().await.map_err(http_err)?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str::<DemoAccount>(&body) {
            Ok(account) if account.id.is_some() => Ok(Some(account)),
            Ok(_) => Ok(None),
            Err(err) => {
                warn!(error = %err, "Unparseable availability response, treating pool as empty");
                Ok(None)
            }
        }
    }

    async fn create_demo(&self, account: &NewDemoAccount) -> ProviderResult<DemoAccount> {
        debug!(login = %account.login, "Adding demo-pool entry");
        let response = self
            .client
            .post(self.url("/demoAccounts"))
            .json(account)
            .send()
            .await
            .map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        response.json().await.map_err(decode_err)
    }

    async fn patch_demo(&self, id: &str, patch: &DemoAccountPatch) -> ProviderResult<DemoAccount> {
        let response = self
            .client
            .patch(self.url(&format!("/demoAccounts/{id}")))
            .json(patch)
            .send()
            .await
            .map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        response.json().await.map_err(decode_err)
    }

    async fn assign_demo(&self, id: &str, mt5_account_id: &str) -> ProviderResult<DemoAccount> {
        debug!(demo_id = %id, mt5_account_id = %mt5_account_id, "Assigning demo account");
        let response = self
            .client
            .post(self.url(&format!("/demoAccounts/assign/{id}")))
            .json(&serde_json::json!({ "mt5AccountId": mt5_account_id }))
            .send()
            .await
            .map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        response.json().await.map_err(decode_err)
    }

    async fn link_users(&self, id: &str, emails: &[String]) -> ProviderResult<()> {
        self.post_json(
            &format!("/demoAccounts/{id}/link"),
            &serde_json::json!({ "emails": emails }),
        )
        .await
    }

    async fn demos_assigned_to(&self, mt5_account_id: &str) -> ProviderResult<Vec<DemoAccount>> {
        let all = self.demo_accounts().await?;
        Ok(all
            .into_iter()
            .filter(|account| account.assigned_to == mt5_account_id)
            .collect())
    }

    async fn mtt_trading_accounts_by_email(
        &self,
        email: &str,
    ) -> ProviderResult<Vec<MttTradingAccount>> {
        match self
            .get_json::<Vec<MttTradingAccount>>(&format!("/mttTradingAccounts/email/{email}"))
            .await
        {
            Ok(accounts) => Ok(accounts),
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    async fn save_mtt_account(&self, account: &StoredMttAccount) -> ProviderResult<()> {
        self.post_json("/mttAccounts", account).await
    }

    async fn save_mtt_trading_account(
        &self,
        account: &StoredMttTradingAccount,
    ) -> ProviderResult<()> {
        self.post_json("/mttTradingAccounts", account).await
    }

    async fn fetch_challenges(&self) -> ProviderResult<Vec<ChallengeDefinition>> {
        let wire: Vec<ChallengeWire> = self.get_json("/api/challenges").await?;
        Ok(wire
            .into_iter()
            .filter_map(|challenge| {
                let id = challenge.id.clone();
                let definition = challenge.into_definition();
                if definition.is_none() {
                    warn!(challenge_id = %id, "Dropping challenge with invalid timestamps");
                }
                definition
            })
            .collect())
    }

    async fn fetch_tiers(&self) -> ProviderResult<Vec<Tier>> {
        self.get_json("/tiers").await
    }

    async fn record_audit(&self, record: &AuditRecord) -> ProviderResult<()> {
        debug!(action = %record.action, account_id = %record.account_id, "Recording audit entry");
        self.post_json("/audit_logs", record).await
    }

    async fn submit_feedback(&self, entry: &FeedbackEntry) -> ProviderResult<()> {
        self.post_json("/feedback", entry).await
    }

    async fn join_waiting_list(&self, entry: &WaitingListEntry) -> ProviderResult<()> {
        self.post_json("/waitingList", entry).await
    }
}
