//! Core types used throughout PropDesk
//!
//! Defines the normalized domain model shared by the registry, the
//! dashboard composer and the HTTP API. Provider wire shapes live next to
//! their clients and are converted into these types at the boundary.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading platform backing an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// MetaTrader 5, provisioned from the demo-account pool
    Mt5,
    /// MatchTrader, provisioned through the broker API
    Mtt,
}

impl Default for PlatformKind {
    fn default() -> Self {
        PlatformKind::Mt5
    }
}

impl PlatformKind {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mt5" => Some(PlatformKind::Mt5),
            "mtt" | "matchtrader" => Some(PlatformKind::Mtt),
            _ => None,
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformKind::Mt5 => write!(f, "mt5"),
            PlatformKind::Mtt => write!(f, "mtt"),
        }
    }
}

/// Lifecycle status of a trading account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl Default for AccountStatus {
    fn default() -> Self {
        AccountStatus::Inactive
    }
}

impl AccountStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(AccountStatus::Active),
            "inactive" => Some(AccountStatus::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// Second/nanosecond timestamp pair as stored by the datastore service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreTimestamp {
    #[serde(rename = "_seconds")]
    pub seconds: i64,
    #[serde(rename = "_nanoseconds")]
    pub nanoseconds: u32,
}

impl StoreTimestamp {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanoseconds).single()
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanoseconds: dt.timestamp_subsec_nanos(),
        }
    }
}

/// Normalized trading account, regardless of backing platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingAccount {
    /// Provider-side identifier (document id or trading-account id)
    pub id: String,
    /// Backing platform discriminant
    pub kind: PlatformKind,
    /// Trading server or broker identifier shown to the user
    pub server: String,
    /// Platform login; empty once the account has been deactivated
    pub login: String,
    /// Platform password; empty once the account has been deactivated
    pub password: String,
    /// Owning user email (weak reference by value)
    pub email: String,
    /// Lifecycle status
    pub status: AccountStatus,
    /// Challenge this account participates in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<String>,
    /// Pool entry this account was provisioned from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_account_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TradingAccount {
    /// True when login and password have been blanked (deactivated account)
    pub fn credentials_blanked(&self) -> bool {
        self.login.is_empty() && self.password.is_empty()
    }
}

/// Status of a challenge instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Active,
    Completed,
    Failed,
}

/// A time-boxed trading evaluation definition
///
/// Immutable once fetched from the catalog; read-only from this system's
/// perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeDefinition {
    pub id: String,
    pub name: String,
    /// Challenge window start (inclusive)
    pub start_date: DateTime<Utc>,
    /// Challenge window end; always after `start_date`
    pub end_date: DateTime<Utc>,
    /// Total gain percentage required to pass
    pub profit_target: f64,
    /// Daily loss limit in percent (absolute value compared)
    pub max_daily_loss_percent: f64,
    /// Total loss limit in percent (absolute value compared)
    pub max_total_loss_percent: f64,
    /// Educational challenges are excluded from rankings and payouts
    pub is_education: bool,
    /// Whether the dashboard should surface this challenge
    pub display_dashboard: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChallengeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Entry fee in account currency
    #[serde(with = "rust_decimal::serde::float")]
    pub fee: Decimal,
    /// Starting balance of the challenge account
    #[serde(with = "rust_decimal::serde::float")]
    pub initial_balance: Decimal,
}

/// Aggregated per-account metrics from the trade-data service
///
/// Produced upstream and consumed as-is; loss percentages are signed
/// (negative = loss) and compared by absolute value against the limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingMetrics {
    pub rank: u32,
    pub total_traders: u32,
    pub daily_trade_count: u32,
    pub daily_loss_percent: f64,
    pub total_loss_percent: f64,
    pub total_gain_percent: f64,
    pub consistency_score: f64,
}

/// One point of the equity curve with pass/fail reference marks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub date: String,
    pub equity: f64,
    pub passing_mark: f64,
    pub failing_mark: f64,
}

/// One point of the underwater (drawdown) curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownPoint {
    pub date: String,
    pub drawdown: f64,
}

/// A single historical trade as reported by the trade-data service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub id: i64,
    pub symbol: String,
    /// Order side as reported upstream ("buy" / "sell")
    #[serde(rename = "type")]
    pub side: String,
    pub profit: f64,
    pub date: String,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_price: Option<f64>,
}

/// Pre-bucketed trade history sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeHistory {
    pub previous_trades: Vec<TradeRecord>,
    pub best_trades: Vec<TradeRecord>,
    pub worst_trades: Vec<TradeRecord>,
}

/// Complete per-login document served by the trade-data service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDataDocument {
    /// Present on uploaded documents; the upload endpoint requires it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mt5_login: Option<String>,
    pub trading_metrics: TradingMetrics,
    pub equity_data: Vec<EquityPoint>,
    pub underwater_data: Vec<DrawdownPoint>,
    pub trade_history: TradeHistory,
}

/// Leaderboard entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub rank: u32,
    pub team_name: String,
    pub mt5_login: String,
    pub equity_balance: f64,
    pub challenge_id: String,
    pub rank_change: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Purchasable challenge tier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub id: String,
    pub name: String,
    /// Price in portal currency; converted to minor units at checkout
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub description: String,
    pub features: Vec<String>,
    pub featured: bool,
    pub is_available: bool,
}

/// Portal user as listed by the directory provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalUser {
    pub email: String,
}

/// Admin mutation recorded to the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    StatusChange,
    EmailChange,
    AccountRemoved,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::StatusChange => write!(f, "STATUS_CHANGE"),
            AuditAction::EmailChange => write!(f, "EMAIL_CHANGE"),
            AuditAction::AccountRemoved => write!(f, "ACCOUNT_REMOVED"),
        }
    }
}

/// One audit-trail entry, posted to the datastore before the mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: String,
    pub action: AuditAction,
    /// Email of the affected account owner
    pub email: String,
    /// Affected account id
    pub account_id: String,
    pub timestamp: DateTime<Utc>,
    /// Action-specific payload (previous status, old/new email, ...)
    pub details: serde_json::Value,
}

impl AuditRecord {
    pub fn new(
        action: AuditAction,
        email: impl Into<String>,
        account_id: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action,
            email: email.into(),
            account_id: account_id.into(),
            timestamp: Utc::now(),
            details,
        }
    }
}

/// MatchTrader client verification states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    New,
    Verified,
    Rejected,
}

/// MatchTrader client classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientType {
    Retail,
    Professional,
}

impl Default for ClientType {
    fn default() -> Self {
        ClientType::Retail
    }
}
