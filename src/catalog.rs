//! Challenge and tier catalog
//!
//! Remote-sourced definitions cached in memory with a refresh interval.
//! A built-in seed table answers before the first successful refresh, so
//! catalog reads degrade to stale or seeded data instead of failing.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal_macros::dec;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::eligibility::ChallengeWindow;
use crate::providers::PortalStore;
use crate::types::{ChallengeDefinition, Tier};

const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

struct CatalogState {
    challenges: Vec<ChallengeDefinition>,
    tiers: Vec<Tier>,
    last_refresh: Option<DateTime<Utc>>,
}

impl CatalogState {
    fn needs_refresh(&self, interval_secs: u64) -> bool {
        match self.last_refresh {
            None => true,
            Some(last) => {
                let elapsed = Utc::now().signed_duration_since(last).num_seconds();
                elapsed >= interval_secs as i64
            }
        }
    }
}

/// Read-mostly catalog backed by the datastore service
pub struct ChallengeCatalog {
    store: Arc<dyn PortalStore>,
    refresh_interval_secs: u64,
    state: RwLock<CatalogState>,
}

impl ChallengeCatalog {
    pub fn new(store: Arc<dyn PortalStore>) -> Self {
        Self {
            store,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            state: RwLock::new(CatalogState {
                challenges: seed_challenges(Utc::now()),
                tiers: seed_tiers(),
                last_refresh: None,
            }),
        }
    }

    pub fn with_refresh_interval(mut self, secs: u64) -> Self {
        self.refresh_interval_secs = secs;
        self
    }

    /// Fetch both catalogs from the datastore. Each list is replaced only
    /// on a successful fetch; failures keep the previous (or seeded) data.
    pub async fn refresh(&self) {
        let (challenges, tiers) =
            tokio::join!(self.store.fetch_challenges(), self.store.fetch_tiers());

        let mut state = self.state.write().await;
        state.last_refresh = Some(Utc::now());

        match challenges {
            Ok(fetched) => {
                let total = fetched.len();
                let valid: Vec<ChallengeDefinition> = fetched
                    .into_iter()
                    .filter(|definition| match ChallengeWindow::from_definition(definition) {
                        Ok(_) => true,
                        Err(error) => {
                            warn!(
                                challenge_id = %definition.id,
                                %error,
                                "Dropping challenge definition"
                            );
                            false
                        }
                    })
                    .collect();
                info!(total, kept = valid.len(), "Refreshed challenge catalog");
                state.challenges = valid;
            }
            Err(error) => {
                warn!(%error, "Challenge refresh failed; keeping cached definitions");
            }
        }

        match tiers {
            Ok(fetched) => {
                info!(count = fetched.len(), "Refreshed tier catalog");
                state.tiers = fetched;
            }
            Err(error) => {
                warn!(%error, "Tier refresh failed; keeping cached tiers");
            }
        }
    }

    async fn ensure_fresh(&self) {
        {
            let state = self.state.read().await;
            if !state.needs_refresh(self.refresh_interval_secs) {
                return;
            }
        }
        debug!("Catalog stale; refreshing");
        self.refresh().await;
    }

    pub async fn challenges(&self) -> Vec<ChallengeDefinition> {
        self.ensure_fresh().await;
        self.state.read().await.challenges.clone()
    }

    pub async fn challenge(&self, id: &str) -> Option<ChallengeDefinition> {
        self.ensure_fresh().await;
        self.state
            .read()
            .await
            .challenges
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub async fn tiers(&self) -> Vec<Tier> {
        self.ensure_fresh().await;
        self.state.read().await.tiers.clone()
    }

    pub async fn tier(&self, id: &str) -> Option<Tier> {
        self.ensure_fresh().await;
        self.state
            .read()
            .await
            .tiers
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_refresh
    }
}

/// Single rolling-window definition served until the datastore answers
fn seed_challenges(now: DateTime<Utc>) -> Vec<ChallengeDefinition> {
    vec![ChallengeDefinition {
        id: "standard-30d".to_string(),
        name: "Standard Challenge".to_string(),
        start_date: now,
        end_date: now + Duration::days(30),
        profit_target: 10.0,
        max_daily_loss_percent: 5.0,
        max_total_loss_percent: 10.0,
        is_education: false,
        display_dashboard: true,
        status: None,
        user_id: None,
        fee: dec!(0),
        initial_balance: dec!(10_000),
    }]
}

fn seed_tiers() -> Vec<Tier> {
    vec![
        Tier {
            id: "tier-10k".to_string(),
            name: "10K Challenge".to_string(),
            price: dec!(99),
            description: "Prove yourself on a 10,000 USD simulated account".to_string(),
            features: vec![
                "10,000 USD starting balance".to_string(),
                "10% profit target".to_string(),
                "Real-time dashboard".to_string(),
            ],
            featured: false,
            is_available: true,
        },
        Tier {
            id: "tier-25k".to_string(),
            name: "25K Challenge".to_string(),
            price: dec!(199),
            description: "Our most popular evaluation size".to_string(),
            features: vec![
                "25,000 USD starting balance".to_string(),
                "10% profit target".to_string(),
                "Real-time dashboard".to_string(),
                "Team linking".to_string(),
            ],
            featured: true,
            is_available: true,
        },
        Tier {
            id: "tier-50k".to_string(),
            name: "50K Challenge".to_string(),
            price: dec!(299),
            description: "For experienced traders ready to scale".to_string(),
            features: vec![
                "50,000 USD starting balance".to_string(),
                "10% profit target".to_string(),
                "Real-time dashboard".to_string(),
                "Team linking".to_string(),
                "Priority support".to_string(),
            ],
            featured: false,
            is_available: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{MockPortalStore, ProviderError};

    fn upstream_down() -> ProviderError {
        ProviderError::Status {
            service: "datastore",
            status: 500,
            message: "internal".to_string(),
        }
    }

    fn definition(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> ChallengeDefinition {
        ChallengeDefinition {
            id: id.to_string(),
            name: format!("Challenge {id}"),
            start_date: start,
            end_date: end,
            profit_target: 10.0,
            max_daily_loss_percent: 5.0,
            max_total_loss_percent: 10.0,
            is_education: false,
            display_dashboard: true,
            status: None,
            user_id: None,
            fee: dec!(0),
            initial_balance: dec!(10_000),
        }
    }

    #[tokio::test]
    async fn seeds_answer_when_the_datastore_is_down() {
        let mut store = MockPortalStore::new();
        store
            .expect_fetch_challenges()
            .returning(|| Err(upstream_down()));
        store.expect_fetch_tiers().returning(|| Err(upstream_down()));

        let catalog = ChallengeCatalog::new(Arc::new(store));
        let challenges = catalog.challenges().await;
        assert_eq!(challenges.len(), 1);
        assert_eq!(challenges[0].id, "standard-30d");

        let tier = catalog.tier("tier-25k").await.unwrap();
        assert!(tier.featured);
        assert_eq!(tier.price, dec!(199));
    }

    #[tokio::test]
    async fn refresh_replaces_seeds_and_drops_invalid_windows() {
        let now = Utc::now();
        let mut store = MockPortalStore::new();
        store.expect_fetch_challenges().returning(move || {
            Ok(vec![
                definition("spring-cup", now, now + Duration::days(14)),
                // End precedes start; must not reach the cache
                definition("broken", now, now - Duration::days(1)),
            ])
        });
        store.expect_fetch_tiers().returning(|| Ok(Vec::new()));

        let catalog = ChallengeCatalog::new(Arc::new(store));
        let challenges = catalog.challenges().await;
        assert_eq!(challenges.len(), 1);
        assert_eq!(challenges[0].id, "spring-cup");
        assert!(catalog.challenge("broken").await.is_none());
        assert!(catalog.challenge("spring-cup").await.is_some());
    }

    #[tokio::test]
    async fn interval_prevents_repeated_upstream_fetches() {
        let mut store = MockPortalStore::new();
        store
            .expect_fetch_challenges()
            .times(1)
            .returning(|| Ok(Vec::new()));
        store
            .expect_fetch_tiers()
            .times(1)
            .returning(|| Ok(Vec::new()));

        let catalog = ChallengeCatalog::new(Arc::new(store)).with_refresh_interval(3600);
        catalog.challenges().await;
        catalog.tiers().await;
        catalog.challenge("anything").await;
        assert!(catalog.last_refresh().await.is_some());
    }
}
