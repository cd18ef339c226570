//! Trade-data service client
//!
//! Serves the per-login trade documents the dashboard is built from,
//! the global rankings table, and the admin upload path. Trade documents
//! come back wrapped in a `{ success, data }` envelope; rankings are a
//! bare array.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{build_http_client, check_status, ProviderError, ProviderResult, TradeFeed};
use crate::types::{Ranking, TradeDataDocument};

const SERVICE: &str = "trade-data";

/// Envelope around a trade-data document. The feed signals an unknown
/// login with `success: false` on a 200 response.
#[derive(Debug, Deserialize)]
struct FeedEnvelope {
    #[serde(default)]
    success: bool,
    data: Option<TradeDataDocument>,
}

/// HTTP client for the trade-data service
#[derive(Debug, Clone)]
pub struct TradeDataClient {
    client: Client,
    base_url: String,
}

impl TradeDataClient {
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
impl TradeFeed for TradeDataClient {
    async fn account_data(&self, mt5_login: &str) -> ProviderResult<TradeDataDocument> {
        let url = format!("{}/tradeData/{}", self.base_url, mt5_login);
        let response = self.client.get(&url).send().await.map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        let envelope: FeedEnvelope = response.json().await.map_err(decode_err)?;

        if !envelope.success {
            return Err(ProviderError::NotFound { service: SERVICE });
        }
        envelope.data.ok_or(ProviderError::Decode {
            service: SERVICE,
            detail: "successful response without a data field".to_string(),
        })
    }

    async fn upload(&self, document: &TradeDataDocument) -> ProviderResult<()> {
        debug!(
            mt5_login = document.mt5_login.as_deref().unwrap_or("?"),
            "Uploading trade-data document"
        );
        let url = format!("{}/tradeData/upload", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(document)
            .send()
            .await
            .map_err(http_err)?;
        check_status(SERVICE, response).await?;
        Ok(())
    }

    async fn rankings(&self) -> ProviderResult<Vec<Ranking>> {
        let url = format!("{}/rankings", self.base_url);
        let response = self.client.get(&url).send().await.map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        response.json().await.map_err(decode_err)
    }
}
