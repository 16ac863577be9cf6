//! HTTP adapter for the push notification service.

use std::env;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::traits::NotificationSender;

const SEND_PATH: &str = "/api/v1/push/send";

#[derive(Debug, Clone)]
pub struct PushConfig {
    pub base_url: String,
    /// Bearer token for the service's protected endpoints.
    pub auth_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            auth_token: None,
            timeout_secs: 10,
        }
    }
}

impl PushConfig {
    /// Reads `NOTIFICATION_SERVICE_URL` and `NOTIFICATION_SERVICE_TOKEN`,
    /// falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// An empty token counts as unset.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            base_url: lookup("NOTIFICATION_SERVICE_URL").unwrap_or(defaults.base_url),
            auth_token: lookup("NOTIFICATION_SERVICE_TOKEN").filter(|token| !token.is_empty()),
            timeout_secs: defaults.timeout_secs,
        }
    }

    pub fn send_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), SEND_PATH)
    }
}

/// Body of `POST /api/v1/push/send`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "targetRoles", default)]
    pub target_roles: Vec<String>,
    #[serde(rename = "targetUserIDs", default)]
    pub target_user_ids: Vec<u64>,
}

impl NotificationRequest {
    /// Rejects requests the service would answer with 400: an empty title
    /// or message, or no target at all.
    pub fn validate(&self) -> Result<(), PushError> {
        if self.title.is_empty() || self.message.is_empty() {
            return Err(PushError::Invalid("title and message are required"));
        }
        if self.target_roles.is_empty() && self.target_user_ids.is_empty() {
            return Err(PushError::Invalid("at least one target role or user id is required"));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum PushError {
    Invalid(&'static str),
    Http(reqwest::Error),
    Status { status: u16, body: String },
}

impl fmt::Display for PushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Invalid(reason) => write!(f, "invalid notification request: {}", reason),
            PushError::Http(err) => write!(f, "push request failed: {}", err),
            PushError::Status { status, body } => {
                write!(f, "push service returned status {}: {}", status, body)
            }
        }
    }
}

impl std::error::Error for PushError {}

impl From<reqwest::Error> for PushError {
    fn from(err: reqwest::Error) -> Self {
        PushError::Http(err)
    }
}

#[derive(Debug, Clone)]
pub struct PushClient {
    config: PushConfig,
    client: reqwest::blocking::Client,
}

impl PushClient {
    pub fn new(config: PushConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl NotificationSender for PushClient {
    type Error = PushError;

    fn send(&self, request: &NotificationRequest) -> Result<(), PushError> {
        request.validate()?;

        let mut builder = self.client.post(self.config.send_url()).json(request);
        if let Some(token) = &self.config.auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(PushError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(title = %request.title, "notification sent");
        Ok(())
    }
}
