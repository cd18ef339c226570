//! Directory (identity) provider client
//!
//! Session issuance lives with the frontend's identity provider; this
//! client only verifies presented tokens, answers admin-membership
//! checks, and lists portal users for the admin console.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{build_http_client, check_status, Directory, ProviderError, ProviderResult};
use crate::types::PortalUser;

const SERVICE: &str = "directory";

#[derive(Debug, Serialize)]
struct VerifySession<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct SessionClaims {
    email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminCheck {
    #[serde(default)]
    is_admin: bool,
}

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    #[serde(default)]
    users: Vec<PortalUser>,
}

/// HTTP client for the directory provider
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    client: Client,
    base_url: String,
}

impl DirectoryClient {
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
impl Directory for DirectoryClient {
    async fn resolve_session(&self, token: &str) -> ProviderResult<Option<String>> {
        let url = format!("{}/api/sessions/verify", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&VerifySession { token })
            .send()
            .await
            .map_err(http_err)?;

        // Invalid or expired tokens come back as 401, not an error
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        let response = check_status(SERVICE, response).await?;
        let claims: SessionClaims = response.json().await.map_err(decode_err)?;
        Ok(Some(claims.email))
    }

    async fn is_admin(&self, email: &str) -> ProviderResult<bool> {
        let url = format!("{}/api/checkAdmin", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("email", email)])
            .send()
            .await
            .map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        let check: AdminCheck = response.json().await.map_err(decode_err)?;
        Ok(check.is_admin)
    }

    async fn list_users(&self) -> ProviderResult<Vec<PortalUser>> {
        let url = format!("{}/api/users", self.base_url);
        let response = self.client.get(&url).send().await.map_err(http_err)?;
        let response = check_status(SERVICE, response).await?;
        let envelope: UsersEnvelope = response.json().await.map_err(decode_err)?;
        Ok(envelope.users)
    }
}
