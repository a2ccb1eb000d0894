//! Admission gate middleware.
//!
//! Every request is evaluated against the composed policy before any
//! handler runs. The decision is turned into a verdict in a fixed order:
//!
//! 1. denied by the rate limit → 429
//! 2. denied as a bot → 403
//! 3. denied for any other reason → 403
//! 4. allowed, but some rule flagged a spoofed bot → 403
//! 5. otherwise the request proceeds
//!
//! A failure to obtain a decision is answered with 500; the request never
//! proceeds on an unknown decision.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::config::AdmissionConfig;
use crate::http::request::client_ip;
use crate::observability::metrics;
use crate::security::decision::{AdmissionDecision, DenialReason};
use crate::security::engine::{AdmissionRequest, DecisionService, EngineError, RequestDetails};
use crate::security::policy::Policy;

/// Why the gate refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    RateLimited { retry_after_secs: Option<u64> },
    BotDenied,
    Forbidden,
    SpoofedBot,
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Rejection::BotDenied | Rejection::Forbidden | Rejection::SpoofedBot => StatusCode::FORBIDDEN,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Rejection::RateLimited { .. } => "Too many requests",
            Rejection::BotDenied => "Bot access denied",
            Rejection::Forbidden => "Forbidden",
            Rejection::SpoofedBot => "Spoofed bot detected",
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            Rejection::RateLimited { .. } => "rate_limited",
            Rejection::BotDenied => "bot_denied",
            Rejection::Forbidden => "forbidden",
            Rejection::SpoofedBot => "spoofed_bot",
        }
    }
}

#[derive(Serialize)]
struct GateError {
    error: &'static str,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(GateError { error: self.message() })).into_response();
        if let Rejection::RateLimited { retry_after_secs: Some(secs) } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

/// Map a decision onto the verdict. `Ok(())` means the request may proceed.
pub fn verdict(decision: &AdmissionDecision) -> Result<(), Rejection> {
    match decision.denial_reason {
        Some(DenialReason::RateLimited) => Err(Rejection::RateLimited {
            retry_after_secs: decision.retry_after_secs(),
        }),
        Some(DenialReason::BotDetected) => Err(Rejection::BotDenied),
        Some(DenialReason::ShieldBlocked) | Some(DenialReason::ForbiddenOther) => Err(Rejection::Forbidden),
        None if decision.has_spoofed_bot() => Err(Rejection::SpoofedBot),
        None => Ok(()),
    }
}

/// The admission gate: a policy plus the service that evaluates it.
#[derive(Clone)]
pub struct AdmissionGate {
    service: Arc<dyn DecisionService>,
    policy: Arc<Policy>,
    enabled: bool,
    requested: u32,
    trust_proxy_hops: usize,
}

impl AdmissionGate {
    pub fn new(config: &AdmissionConfig, service: Arc<dyn DecisionService>) -> Self {
        Self {
            service,
            policy: Arc::new(Policy::from_config(config)),
            enabled: config.enabled,
            requested: config.requested,
            trust_proxy_hops: config.trust_proxy_hops,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Build the admission request for an inbound HTTP request.
    pub fn admission_request(&self, request: &Request<Body>, peer: Option<SocketAddr>) -> AdmissionRequest {
        let uri = request.uri();
        AdmissionRequest {
            ip: client_ip(request.headers(), peer, self.trust_proxy_hops),
            requested: self.requested,
            details: RequestDetails::new(request.method().as_str(), uri.path(), uri.query(), request.headers()),
        }
    }

    /// Evaluate every rule of the policy and derive the aggregate decision.
    pub async fn protect(&self, request: &AdmissionRequest) -> Result<AdmissionDecision, EngineError> {
        if !self.enabled {
            return Ok(AdmissionDecision::allow_all());
        }

        let verdict = self.service.decide(request, &self.policy).await?;
        Ok(AdmissionDecision::from_results(verdict.id, verdict.results))
    }
}

#[derive(Serialize)]
struct InternalError {
    error: &'static str,
}

/// Middleware applying the gate to every request.
pub async fn admission_middleware(
    State(gate): State<AdmissionGate>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let admission = gate.admission_request(&request, peer);

    let decision = match gate.protect(&admission).await {
        Ok(decision) => decision,
        Err(e) => {
            tracing::error!(error = %e, client = ?admission.ip, "Admission middleware error");
            metrics::record_admission("error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(InternalError { error: "Internal server error" }),
            )
                .into_response();
        }
    };

    match verdict(&decision) {
        Ok(()) => {
            metrics::record_admission("allowed");
            next.run(request).await
        }
        Err(rejection) => {
            tracing::warn!(
                client = ?admission.ip,
                path = %admission.details.path,
                decision_id = ?decision.id,
                reason = ?decision.denial_reason,
                status = rejection.status().as_u16(),
                "Request rejected by admission gate"
            );
            metrics::record_admission(rejection.outcome());
            rejection.into_response()
        }
    }
}
