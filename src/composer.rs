//! Dashboard composition
//!
//! Fans out the independent dashboard fetches for a selected account and
//! joins them with partial-failure tolerance: a failed secondary fetch
//! never blocks the credentials/metrics display, it just marks its own
//! section. Metrics and the account's challenge definition feed the
//! eligibility evaluator; the result carries checklist, verdict,
//! profit-target signal and elapsed-time progress.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::catalog::ChallengeCatalog;
use crate::eligibility::{evaluate, ChallengeWindow, Evaluation};
use crate::providers::{DemoAccount, PortalStore, ProviderResult, TradeFeed};
use crate::registry::{Registry, RegistryError};
use crate::types::{
    AccountStatus, ChallengeDefinition, Ranking, TradeDataDocument, TradingAccount,
};

/// Dashboard composition failures. Section-level fetch errors are not
/// errors here; only missing accounts and total listing failure are.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("no trading account with login {0}")]
    UnknownAccount(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// One independently fetched slice of the dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Section<T> {
    fn from_result(name: &str, result: ProviderResult<T>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
            },
            Err(error) => {
                warn!(section = name, %error, "Dashboard section failed");
                Self {
                    data: None,
                    error: Some(error.to_string()),
                }
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.data.is_some()
    }
}

/// Composed dashboard view for one selected account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// The selected account, credentials included
    pub account: TradingAccount,
    pub trade_data: Section<TradeDataDocument>,
    pub rankings: Section<Vec<Ranking>>,
    /// Pool entries linked to this account (team members)
    pub team: Section<Vec<DemoAccount>>,
    /// Absent when metrics or the challenge definition are unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
    /// Elapsed-time progress through the challenge window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<f64>,
    /// Whether the user may request another demo account
    pub can_request_demo: bool,
}

/// Concurrent dashboard assembly over the provider seams
pub struct DashboardComposer {
    feed: Arc<dyn TradeFeed>,
    store: Arc<dyn PortalStore>,
    registry: Arc<Registry>,
    catalog: Arc<ChallengeCatalog>,
    /// Active accounts allowed per user before demo requests are hidden
    active_account_cap: usize,
}

impl DashboardComposer {
    pub fn new(
        feed: Arc<dyn TradeFeed>,
        store: Arc<dyn PortalStore>,
        registry: Arc<Registry>,
        catalog: Arc<ChallengeCatalog>,
        active_account_cap: usize,
    ) -> Self {
        Self {
            feed,
            store,
            registry,
            catalog,
            active_account_cap,
        }
    }

    /// Build the dashboard for `mt5_login`, owned by `email`. `now` is
    /// injected so progress stays deterministic under test.
    pub async fn compose(
        &self,
        email: &str,
        mt5_login: &str,
        now: DateTime<Utc>,
    ) -> Result<DashboardView, ComposeError> {
        let accounts = self.registry.list_accounts_for_user(email).await?;
        let account = accounts
            .iter()
            .find(|account| account.login == mt5_login)
            .cloned()
            .ok_or_else(|| ComposeError::UnknownAccount(mt5_login.to_string()))?;

        let active = accounts
            .iter()
            .filter(|account| account.status == AccountStatus::Active)
            .count();
        let can_request_demo = active < self.active_account_cap;

        let (trade_data, rankings, team) = tokio::join!(
            self.feed.account_data(mt5_login),
            self.feed.rankings(),
            self.store.demos_assigned_to(&account.id)
        );

        let trade_data = Section::from_result("tradeData", trade_data);
        let rankings = Section::from_result("rankings", rankings);
        let team = Section::from_result("team", team);

        let definition = self.resolve_definition(&account).await;
        let evaluation = match (&trade_data.data, &definition) {
            (Some(document), Some(definition)) => Some(evaluate(
                &document.trading_metrics,
                definition.profit_target,
            )),
            _ => None,
        };
        let progress_percent = definition
            .as_ref()
            .and_then(|definition| ChallengeWindow::from_definition(definition).ok())
            .map(|window| window.progress_percent(now));

        Ok(DashboardView {
            account,
            trade_data,
            rankings,
            team,
            evaluation,
            progress_percent,
            can_request_demo,
        })
    }

    /// The account's own challenge when set, otherwise the catalog's
    /// current dashboard challenge
    async fn resolve_definition(&self, account: &TradingAccount) -> Option<ChallengeDefinition> {
        if let Some(challenge_id) = &account.challenge_id {
            if let Some(definition) = self.catalog.challenge(challenge_id).await {
                return Some(definition);
            }
            warn!(%challenge_id, "Account references an unknown challenge");
        }
        self.catalog
            .challenges()
            .await
            .into_iter()
            .find(|definition| definition.display_dashboard && !definition.is_education)
    }
}
