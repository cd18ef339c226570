//! PropDesk portal backend
//!
//! Wires the provider clients into the registry, catalog, and composer,
//! then serves the HTTP API until shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use propdesk::api::{self, PortalState};
use propdesk::catalog::ChallengeCatalog;
use propdesk::composer::DashboardComposer;
use propdesk::config::AppConfig;
use propdesk::providers::{
    AccountStore, BrokerApi, Directory, DirectoryClient, MatchTraderClient, Mt5AccountsClient,
    PaymentGateway, PortalStore, PortalStoreClient, StripeClient, TradeDataClient, TradeFeed,
};
use propdesk::registry::Registry;
use propdesk::types::PlatformKind;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    info!("🚀 PropDesk portal backend starting");
    info!("Config: {}", config.digest());

    config.validate_env()?;

    let broker_token =
        std::env::var("MATCHTRADER_API_TOKEN").context("MATCHTRADER_API_TOKEN is not set")?;
    let stripe_key =
        std::env::var("STRIPE_SECRET_KEY").context("STRIPE_SECRET_KEY is not set")?;

    let timeout = config.services.timeout_secs;
    let datastore_url = config.datastore_url();

    let accounts: Arc<dyn AccountStore> = Arc::new(Mt5AccountsClient::new(
        &config.services.mt5_accounts_url,
        timeout,
    ));
    let store: Arc<dyn PortalStore> = Arc::new(PortalStoreClient::new(&datastore_url, timeout));
    let broker: Arc<dyn BrokerApi> = Arc::new(MatchTraderClient::new(
        &config.broker_url(),
        broker_token,
        timeout,
    ));
    let feed: Arc<dyn TradeFeed> = Arc::new(TradeDataClient::new(&datastore_url, timeout));
    let directory: Arc<dyn Directory> = Arc::new(DirectoryClient::new(&datastore_url, timeout));
    let payments: Arc<dyn PaymentGateway> = Arc::new(StripeClient::new(
        &config.services.stripe_url,
        &stripe_key,
        timeout,
    ));

    let default_platform = PlatformKind::from_str(&config.demo.default_platform)
        .with_context(|| {
            format!(
                "Unknown demo.default_platform: {}",
                config.demo.default_platform
            )
        })?;

    let registry = Arc::new(Registry::new(
        accounts.clone(),
        broker,
        store.clone(),
        config.demo.challenge_id.clone(),
    ));
    let catalog = Arc::new(
        ChallengeCatalog::new(store.clone()).with_refresh_interval(config.catalog.refresh_secs),
    );
    let composer = Arc::new(DashboardComposer::new(
        feed.clone(),
        store.clone(),
        registry.clone(),
        catalog.clone(),
        config.demo.max_active_accounts,
    ));

    // Warm the catalog cache before accepting traffic
    catalog.refresh().await;

    let state = PortalState {
        accounts,
        store,
        feed,
        directory,
        payments,
        registry,
        composer,
        catalog,
        default_platform,
        payment_currency: config.server.payment_currency.clone(),
    };

    api::start_server(state, config.server.port).await
}
