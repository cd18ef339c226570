//! Upstream provider clients (datastore, MT5 service, MatchTrader, trade
//! data, directory, Stripe)
//!
//! One trait per upstream concern; the reqwest-backed clients live in the
//! submodules and the rest of the crate depends on the traits only.

mod directory;
mod matchtrader;
mod mt5;
mod store;
mod stripe;
mod tradedata;

pub use directory::DirectoryClient;
pub use matchtrader::{
    generate_account_password, CreateMttAccount, MatchTraderClient, MttAccount,
    MttChallengeDetails, MttChallengeTargets, MttPersonalDetails, MttTradingAccount,
    NewTradingAccount, TradingAccountOptions,
};
pub use mt5::{Mt5Account, Mt5AccountUpdate, Mt5AccountsClient, NewMt5Account};
pub use store::{
    DemoAccount, DemoAccountPatch, FeedbackEntry, NewDemoAccount, PortalStoreClient,
    StoredChallengeDetails, StoredMttAccount, StoredMttTradingAccount, WaitingListEntry,
};
pub use stripe::{PaymentIntent, PaymentIntentRequest, StripeClient};
pub use tradedata::TradeDataClient;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::types::{
    AuditRecord, ChallengeDefinition, PortalUser, Ranking, Tier, TradeDataDocument,
};

/// Errors surfaced by provider clients
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to {service} failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("unexpected payload from {service}: {detail}")]
    Decode {
        service: &'static str,
        detail: String,
    },

    #[error("{service}: not found")]
    NotFound { service: &'static str },
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Shared HTTP client construction: JSON content type, 30 s timeout
pub(crate) fn build_http_client(timeout_secs: u64) -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// Map a non-success response into a typed error, reading the body for
/// the message where the upstream provides one
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound { service });
    }

    let message = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        service,
        status: status.as_u16(),
        message,
    })
}

// ─────────────────────────────────────────────────────────────────
// Provider traits
// ─────────────────────────────────────────────────────────────────

/// MT5-account service operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn list(&self) -> ProviderResult<Vec<Mt5Account>>;
    async fn get(&self, id: &str) -> ProviderResult<Mt5Account>;
    async fn find_by_email(&self, email: &str) -> ProviderResult<Vec<Mt5Account>>;
    async fn create(&self, account: &NewMt5Account) -> ProviderResult<Mt5Account>;
    async fn update(&self, id: &str, update: &Mt5AccountUpdate) -> ProviderResult<Mt5Account>;
}

/// MatchTrader broker API operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerApi: Send + Sync {
    /// Look up a broker account by owner email; `NotFound` when absent
    async fn account_by_email(&self, email: &str) -> ProviderResult<MttAccount>;
    async fn create_account(&self, request: &CreateMttAccount) -> ProviderResult<MttAccount>;
    async fn create_trading_account(
        &self,
        request: &NewTradingAccount,
        options: &TradingAccountOptions,
    ) -> ProviderResult<MttTradingAccount>;
}

/// Datastore service: demo-account pool, broker mirrors, catalog, audit
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PortalStore: Send + Sync {
    async fn demo_accounts(&self) -> ProviderResult<Vec<DemoAccount>>;
    /// Next unassigned pool entry; `None` when the pool is exhausted
    async fn available_demo(&self) -> ProviderResult<Option<DemoAccount>>;
    async fn create_demo(&self, account: &NewDemoAccount) -> ProviderResult<DemoAccount>;
    async fn patch_demo(&self, id: &str, patch: &DemoAccountPatch) -> ProviderResult<DemoAccount>;
    async fn assign_demo(&self, id: &str, mt5_account_id: &str) -> ProviderResult<DemoAccount>;
    async fn link_users(&self, id: &str, emails: &[String]) -> ProviderResult<()>;
    async fn demos_assigned_to(&self, mt5_account_id: &str) -> ProviderResult<Vec<DemoAccount>>;

    /// Mirror of broker trading accounts; empty when none exist
    async fn mtt_trading_accounts_by_email(
        &self,
        email: &str,
    ) -> ProviderResult<Vec<MttTradingAccount>>;
    async fn save_mtt_account(&self, account: &StoredMttAccount) -> ProviderResult<()>;
    async fn save_mtt_trading_account(
        &self,
        account: &StoredMttTradingAccount,
    ) -> ProviderResult<()>;

    async fn fetch_challenges(&self) -> ProviderResult<Vec<ChallengeDefinition>>;
    async fn fetch_tiers(&self) -> ProviderResult<Vec<Tier>>;

    async fn record_audit(&self, record: &AuditRecord) -> ProviderResult<()>;
    async fn submit_feedback(&self, entry: &FeedbackEntry) -> ProviderResult<()>;
    async fn join_waiting_list(&self, entry: &WaitingListEntry) -> ProviderResult<()>;
}

/// Trade-data service operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TradeFeed: Send + Sync {
    async fn account_data(&self, mt5_login: &str) -> ProviderResult<TradeDataDocument>;
    async fn upload(&self, document: &TradeDataDocument) -> ProviderResult<()>;
    async fn rankings(&self) -> ProviderResult<Vec<Ranking>>;
}

/// Identity provider: session verification and admin membership
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolve a bearer token to the caller's email; `None` for invalid
    /// or expired tokens
    async fn resolve_session(&self, token: &str) -> ProviderResult<Option<String>>;
    async fn is_admin(&self, email: &str) -> ProviderResult<bool>;
    async fn list_users(&self) -> ProviderResult<Vec<PortalUser>>;
}

/// Payment provider operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> ProviderResult<PaymentIntent>;
}
