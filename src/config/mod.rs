//! Configuration management for PropDesk
//!
//! Loads from YAML files + environment variables via .env

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment environment (production / uat / dev)
    pub environment: RuntimeEnv,
    pub server: ServerConfig,
    pub services: ServicesConfig,
    pub demo: DemoConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub port: u16,
    /// ISO currency code passed to the payment gateway
    pub payment_currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    /// Request timeout applied to every provider client, in seconds
    pub timeout_secs: u64,
    /// MT5-account service base URL (environment-independent)
    pub mt5_accounts_url: String,
    /// Stripe API base URL (environment-independent)
    pub stripe_url: String,
    /// Datastore origin; empty selects the environment default
    pub datastore_url: String,
    /// MatchTrader API base; empty selects the datastore proxy path
    pub broker_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// Broker challenge every MTT demo trading account is created on
    pub challenge_id: String,
    /// Platform used when a provisioning request does not name one
    pub default_platform: String,
    /// Active accounts a user may hold before demo requests are hidden
    pub max_active_accounts: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Minimum seconds between datastore catalog refreshes
    pub refresh_secs: u64,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Environment default
            .set_default("environment", "dev")?
            // Server defaults
            .set_default("server.port", 8080)?
            .set_default("server.payment_currency", "usd")?
            // Service defaults
            .set_default("services.timeout_secs", 30)?
            .set_default("services.mt5_accounts_url", "https://mt5.propdesk.app")?
            .set_default("services.stripe_url", "https://api.stripe.com")?
            .set_default("services.datastore_url", "")?
            .set_default("services.broker_url", "")?
            // Demo provisioning defaults
            .set_default("demo.challenge_id", "standard-demo")?
            .set_default("demo.default_platform", "mt5")?
            .set_default("demo.max_active_accounts", 3)?
            // Catalog defaults
            .set_default("catalog.refresh_secs", 300)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (PROPDESK_*)
            .add_source(Environment::with_prefix("PROPDESK").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Datastore base URL: explicit override, else the environment default
    pub fn datastore_url(&self) -> String {
        if self.services.datastore_url.is_empty() {
            self.environment.datastore_base().to_string()
        } else {
            self.services.datastore_url.clone()
        }
    }

    /// Broker API base URL: explicit override, else the datastore's
    /// MatchTrader proxy path
    pub fn broker_url(&self) -> String {
        if self.services.broker_url.is_empty() {
            format!(
                "{}/api/match-trader",
                self.datastore_url().trim_end_matches('/')
            )
        } else {
            self.services.broker_url.clone()
        }
    }

    /// Generate a digest of the config (without secrets) for logging
    pub fn digest(&self) -> String {
        format!(
            "env={} port={} datastore={} platform={} max_active={}",
            self.environment,
            self.server.port,
            self.datastore_url(),
            self.demo.default_platform,
            self.demo.max_active_accounts
        )
    }

    /// Validate required environment variables
    pub fn validate_env(&self) -> Result<()> {
        let required = vec!["STRIPE_SECRET_KEY", "MATCHTRADER_API_TOKEN"];

        for var in required {
            if std::env::var(var).is_err() {
                bail!("Required environment variable {} is not set", var);
            }
        }

        // Validate secret key format
        let key = std::env::var("STRIPE_SECRET_KEY")?;
        if !key.starts_with("sk_") {
            bail!("STRIPE_SECRET_KEY must be a Stripe secret key (sk_ prefix)");
        }

        Ok(())
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            environment: RuntimeEnv::Uat,
            server: ServerConfig {
                port: 8080,
                payment_currency: "usd".to_string(),
            },
            services: ServicesConfig {
                timeout_secs: 30,
                mt5_accounts_url: "https://mt5.propdesk.app".to_string(),
                stripe_url: "https://api.stripe.com".to_string(),
                datastore_url: String::new(),
                broker_url: String::new(),
            },
            demo: DemoConfig {
                challenge_id: "standard-demo".to_string(),
                default_platform: "mt5".to_string(),
                max_active_accounts: 3,
            },
            catalog: CatalogConfig { refresh_secs: 300 },
        }
    }

    #[test]
    fn environment_selects_the_datastore() {
        let mut config = base_config();
        assert_eq!(config.datastore_url(), "https://functions-uat.propdesk.app");

        config.environment = RuntimeEnv::Production;
        assert_eq!(config.datastore_url(), "https://functions.propdesk.app");

        config.services.datastore_url = "http://localhost:9999".to_string();
        assert_eq!(config.datastore_url(), "http://localhost:9999");
    }

    #[test]
    fn broker_url_defaults_to_the_datastore_proxy() {
        let mut config = base_config();
        assert_eq!(
            config.broker_url(),
            "https://functions-uat.propdesk.app/api/match-trader"
        );

        config.services.broker_url = "https://broker.example.com".to_string();
        assert_eq!(config.broker_url(), "https://broker.example.com");
    }

    #[test]
    fn environment_names_parse() {
        let parsed: RuntimeEnv = serde_json::from_str("\"production\"").unwrap();
        assert_eq!(parsed, RuntimeEnv::Production);
        assert!(parsed.is_production());

        let parsed: RuntimeEnv = serde_json::from_str("\"dev\"").unwrap();
        assert_eq!(parsed, RuntimeEnv::Dev);
    }

    #[test]
    fn digest_reports_the_resolved_endpoints() {
        let config = base_config();
        let digest = config.digest();
        assert!(digest.contains("env=uat"));
        assert!(digest.contains("datastore=https://functions-uat.propdesk.app"));
    }
}
