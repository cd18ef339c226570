//! Runtime environment selection

use serde::Deserialize;
use std::fmt;

/// Deployment environment, selecting the datastore endpoint set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnv {
    Production,
    Uat,
    Dev,
}

impl RuntimeEnv {
    /// Datastore origin used when no explicit URL is configured
    pub fn datastore_base(&self) -> &'static str {
        match self {
            RuntimeEnv::Production => "https://functions.propdesk.app",
            RuntimeEnv::Uat => "https://functions-uat.propdesk.app",
            RuntimeEnv::Dev => "http://127.0.0.1:5001",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, RuntimeEnv::Production)
    }
}

impl fmt::Display for RuntimeEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeEnv::Production => write!(f, "production"),
            RuntimeEnv::Uat => write!(f, "uat"),
            RuntimeEnv::Dev => write!(f, "dev"),
        }
    }
}
