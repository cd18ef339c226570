//! Challenge eligibility rules
//!
//! Pure evaluation of account metrics against the fixed risk rules, plus
//! elapsed-time progress over a challenge window. No I/O and no side
//! effects; callers inject `now` so results stay deterministic under test.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::{ChallengeDefinition, TradingMetrics};

/// Daily trade count treated as sufficient activity
pub const MIN_DAILY_TRADES: u32 = 3;
/// Daily loss limit in percent, compared by absolute value
pub const DAILY_LOSS_LIMIT_PCT: f64 = 5.0;
/// Total loss limit in percent, compared by absolute value
pub const TOTAL_LOSS_LIMIT_PCT: f64 = 10.0;

/// Message surfaced when a loss limit has been breached
pub const RISK_VIOLATION_MESSAGE: &str = "Challenge failed due to risk management violation";

/// One pass/fail line of the eligibility checklist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistItem {
    pub label: &'static str,
    pub passed: bool,
}

/// Risk rule whose breach terminates the challenge
///
/// Only the two loss limits are terminal. Low trade count and negative
/// gain are informational checklist lines, never failure triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBreach {
    DailyLoss,
    TotalLoss,
}

impl fmt::Display for RiskBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskBreach::DailyLoss => write!(f, "daily loss limit exceeded"),
            RiskBreach::TotalLoss => write!(f, "total loss limit exceeded"),
        }
    }
}

/// Verdict derived from the checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Verdict {
    OnTrack,
    Failed { breach: RiskBreach },
}

impl Verdict {
    pub fn is_failed(&self) -> bool {
        matches!(self, Verdict::Failed { .. })
    }

    /// User-facing failure message, if the challenge has failed
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Verdict::OnTrack => None,
            Verdict::Failed { .. } => Some(RISK_VIOLATION_MESSAGE),
        }
    }
}

/// Complete evaluation output, recomputed fresh on every call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub checklist: Vec<ChecklistItem>,
    pub verdict: Verdict,
    /// Separate signal, not part of the checklist
    pub profit_target_reached: bool,
}

/// Evaluate account metrics against the fixed rules.
///
/// Loss percentages are signed (negative = loss); both limits compare the
/// absolute value, so a positive "loss" outside the band also breaches.
pub fn evaluate(metrics: &TradingMetrics, profit_target: f64) -> Evaluation {
    let daily_within = metrics.daily_loss_percent.abs() <= DAILY_LOSS_LIMIT_PCT;
    let total_within = metrics.total_loss_percent.abs() <= TOTAL_LOSS_LIMIT_PCT;

    let checklist = vec![
        ChecklistItem {
            label: "More than 3 trades per day",
            passed: metrics.daily_trade_count >= MIN_DAILY_TRADES,
        },
        ChecklistItem {
            label: "Daily loss within limit",
            passed: daily_within,
        },
        ChecklistItem {
            label: "Total loss within limit",
            passed: total_within,
        },
        ChecklistItem {
            label: "Positive total gain",
            passed: metrics.total_gain_percent > 0.0,
        },
    ];

    let verdict = if !daily_within {
        Verdict::Failed {
            breach: RiskBreach::DailyLoss,
        }
    } else if !total_within {
        Verdict::Failed {
            breach: RiskBreach::TotalLoss,
        }
    } else {
        Verdict::OnTrack
    };

    Evaluation {
        checklist,
        verdict,
        profit_target_reached: metrics.total_gain_percent >= profit_target,
    }
}

/// Invalid challenge window
#[derive(Debug, Error, PartialEq, Eq)]
#[error("challenge window must end after it starts")]
pub struct WindowError;

/// Validated challenge time window (`end > start`)
///
/// Construction is the precondition check; a window that exists always has
/// a positive duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ChallengeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if end <= start {
            return Err(WindowError);
        }
        Ok(Self { start, end })
    }

    pub fn from_definition(definition: &ChallengeDefinition) -> Result<Self, WindowError> {
        Self::new(definition.start_date, definition.end_date)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Total window length in days, partial days rounded up
    pub fn duration_days(&self) -> i64 {
        ceil_days(self.end - self.start)
    }

    /// Days elapsed since the start, partial days rounded up and clamped
    /// at zero before the window opens
    pub fn elapsed_days(&self, now: DateTime<Utc>) -> i64 {
        ceil_days(now - self.start).max(0)
    }

    /// Elapsed-time progress in percent, clamped to [0, 100]
    pub fn progress_percent(&self, now: DateTime<Utc>) -> f64 {
        let duration = self.duration_days();
        debug_assert!(duration > 0);

        let elapsed = self.elapsed_days(now);
        (elapsed as f64 / duration as f64 * 100.0).min(100.0)
    }
}

fn ceil_days(span: Duration) -> i64 {
    const DAY_MS: f64 = 86_400_000.0;
    (span.num_milliseconds() as f64 / DAY_MS).ceil() as i64
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
