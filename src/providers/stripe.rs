//! Stripe payment client
//!
//! Creates payment intents against the Stripe REST API. Amounts are
//! derived server-side from the tier catalog's decimal prices; the
//! frontend only ever sees the resulting client secret.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::{build_http_client, check_status, PaymentGateway, ProviderError, ProviderResult};
use crate::types::Tier;

const SERVICE: &str = "stripe";

/// Server-side payment-intent parameters
#[derive(Debug, Clone)]
pub struct PaymentIntentRequest {
    /// Amount in minor units (cents)
    pub amount: i64,
    pub currency: String,
    pub receipt_email: String,
    pub user_id: String,
    pub tier_id: String,
}

impl PaymentIntentRequest {
    /// Build a request for a tier purchase. `None` when the tier price
    /// does not convert to a whole number of minor units.
    pub fn for_purchase(
        tier: &Tier,
        user_id: &str,
        user_email: &str,
        currency: &str,
    ) -> Option<Self> {
        let amount = (tier.price * dec!(100)).round().to_i64()?;
        Some(Self {
            amount,
            currency: currency.to_string(),
            receipt_email: user_email.to_string(),
            user_id: user_id.to_string(),
            tier_id: tier.id.clone(),
        })
    }
}

/// Created payment intent, as returned by Stripe
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// HTTP client for the Stripe API
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(base_url: &str, secret_key: &str, timeout_secs: u64) -> Self {
        Self {
            client: build_http_client(timeout_secs),
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
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
impl PaymentGateway for StripeClient {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> ProviderResult<PaymentIntent> {
        debug!(
            tier_id = %request.tier_id,
            amount = request.amount,
            "Creating payment intent"
        );

        let params = [
            ("amount", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("receipt_email", request.receipt_email.clone()),
            ("metadata[userId]", request.user_id.clone()),
            ("metadata[tierId]", request.tier_id.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];

        let url = format!("{}/v1/payment_intents", self.base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .header("Idempotency-Key", Uuid::new_v4().to_string())
            .form(&params)
            .send()
            .await
            .map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        response.json().await.map_err(decode_err)
    }
}
