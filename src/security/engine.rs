//! Client for the external policy-decision service.
//!
//! # Responsibilities
//! - Describe the request being admitted (IP, method, path, headers)
//! - Send it with the policy and token cost to the decision service
//! - Decode the per-rule results
//!
//! # Design Decisions
//! - Rate-limit counters live in the service, keyed by `ip.src`; this
//!   process keeps no admission state
//! - Credentials are never forwarded to the service
//! - Any transport, status or decode failure is an [`EngineError`]; the gate
//!   fails closed on it

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AdmissionConfig;
use crate::security::decision::RuleResult;
use crate::security::policy::{Policy, Rule, CHARACTERISTIC_IP};

/// Errors raised while obtaining a decision.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The service could not be reached or the call timed out.
    #[error("decision service unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("decision service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a valid decision.
    #[error("invalid decision response: {0}")]
    Decode(String),

    #[error("invalid decision client configuration: {0}")]
    Config(String),
}

/// What the decision service sees of an inbound request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestDetails {
    pub method: String,
    pub host: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
}

/// Headers never forwarded to the decision service.
const REDACTED_HEADERS: &[&str] = &["authorization", "cookie", "proxy-authorization"];

impl RequestDetails {
    pub fn new(method: &str, path: &str, query: Option<&str>, headers: &HeaderMap) -> Self {
        let forwarded = headers
            .iter()
            .filter(|(name, _)| !REDACTED_HEADERS.contains(&name.as_str()))
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            method: method.to_string(),
            host: headers
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
            path: path.to_string(),
            query: query.map(str::to_string),
            headers: forwarded,
        }
    }
}

/// One request presented to the gate.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionRequest {
    /// Resolved client address; `None` if it could not be determined.
    pub ip: Option<IpAddr>,
    /// Tokens this request consumes.
    pub requested: u32,
    pub details: RequestDetails,
}

impl AdmissionRequest {
    /// Values for the characteristics the policy keys its counters by.
    /// Characteristics this gate cannot resolve are sent as `null`.
    pub fn characteristics<'a>(&self, policy: &'a Policy) -> BTreeMap<&'a str, Option<String>> {
        policy
            .characteristics
            .iter()
            .map(|name| {
                let value = match name.as_str() {
                    CHARACTERISTIC_IP => self.ip.map(|ip| ip.to_string()),
                    _ => None,
                };
                (name.as_str(), value)
            })
            .collect()
    }
}

/// Results of evaluating the policy against one request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineVerdict {
    #[serde(default)]
    pub id: Option<String>,
    pub results: Vec<RuleResult>,
}

/// Capability over the external policy engine.
#[async_trait]
pub trait DecisionService: Send + Sync {
    async fn decide(&self, request: &AdmissionRequest, policy: &Policy) -> Result<EngineVerdict, EngineError>;
}

#[derive(Serialize)]
struct DecideBody<'a> {
    characteristics: BTreeMap<&'a str, Option<String>>,
    requested: u32,
    details: &'a RequestDetails,
    rules: &'a [Rule],
}

/// HTTP client for the decision service (`POST {endpoint}/v1/decide`).
#[derive(Clone)]
pub struct RemoteDecisionClient {
    client: reqwest::Client,
    decide_url: url::Url,
    api_key: String,
}

impl RemoteDecisionClient {
    pub fn new(config: &AdmissionConfig) -> Result<Self, EngineError> {
        let base: url::Url = config
            .endpoint
            .parse()
            .map_err(|e| EngineError::Config(format!("endpoint '{}': {}", config.endpoint, e)))?;
        let decide_url = base
            .join("v1/decide")
            .map_err(|e| EngineError::Config(e.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| EngineError::Config(e.to_string()))?;

        Ok(Self {
            client,
            decide_url,
            api_key: config.api_key.clone(),
        })
    }

    pub fn decide_url(&self) -> &url::Url {
        &self.decide_url
    }
}

#[async_trait]
impl DecisionService for RemoteDecisionClient {
    async fn decide(&self, request: &AdmissionRequest, policy: &Policy) -> Result<EngineVerdict, EngineError> {
        let body = DecideBody {
            characteristics: request.characteristics(policy),
            requested: request.requested,
            details: &request.details,
            rules: &policy.rules,
        };

        let response = self
            .client
            .post(self.decide_url.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(EngineError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(EngineError::Transport)?;
        serde_json::from_slice(&bytes).map_err(|e| EngineError::Decode(e.to_string()))
    }
}
