//! Admission decisions and per-rule results.
//!
//! # Responsibilities
//! - Model what the decision service reports for each rule
//! - Derive the aggregate allow/deny and its reason from those results
//!
//! # Design Decisions
//! - All results are kept, not only the deciding one; later checks
//!   (spoofed bots) inspect every result
//! - Only LIVE denials deny; DRY_RUN denials are logged
//! - ERROR results are logged and never deny on their own

use serde::{Deserialize, Serialize};

use crate::config::RuleMode;

/// Outcome of a single rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Conclusion {
    Allow,
    Deny,
    Error,
}

/// Which kind of rule produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Shield,
    Bot,
    RateLimit,
    Other,
}

/// Rule-specific detail reported alongside a conclusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleReason {
    Shield {
        #[serde(default)]
        shield_triggered: bool,
    },
    Bot {
        #[serde(default)]
        allowed: Vec<String>,
        #[serde(default)]
        denied: Vec<String>,
        #[serde(default)]
        verified: bool,
        /// The requester claimed a known bot identity but failed verification.
        #[serde(default)]
        spoofed: bool,
    },
    RateLimit {
        max: u32,
        remaining: u32,
        /// Seconds until the bucket has tokens again.
        #[serde(default)]
        reset_in_secs: Option<u64>,
    },
    Error {
        message: String,
    },
    #[serde(other)]
    Unknown,
}

/// One rule's result, as reported by the decision service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    #[serde(default)]
    pub rule_id: Option<String>,
    #[serde(default)]
    pub mode: RuleMode,
    pub conclusion: Conclusion,
    pub reason: RuleReason,
}

impl RuleResult {
    pub fn kind(&self) -> RuleKind {
        match self.reason {
            RuleReason::Shield { .. } => RuleKind::Shield,
            RuleReason::Bot { .. } => RuleKind::Bot,
            RuleReason::RateLimit { .. } => RuleKind::RateLimit,
            RuleReason::Error { .. } | RuleReason::Unknown => RuleKind::Other,
        }
    }

    pub fn is_spoofed_bot(&self) -> bool {
        matches!(self.reason, RuleReason::Bot { spoofed: true, .. })
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    RateLimited,
    BotDetected,
    ShieldBlocked,
    ForbiddenOther,
}

impl From<RuleKind> for DenialReason {
    fn from(kind: RuleKind) -> Self {
        match kind {
            RuleKind::RateLimit => DenialReason::RateLimited,
            RuleKind::Bot => DenialReason::BotDetected,
            RuleKind::Shield => DenialReason::ShieldBlocked,
            RuleKind::Other => DenialReason::ForbiddenOther,
        }
    }
}

/// The aggregate decision for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionDecision {
    /// Identifier assigned by the decision service, if any.
    pub id: Option<String>,
    pub denial_reason: Option<DenialReason>,
    pub results: Vec<RuleResult>,
}

impl AdmissionDecision {
    /// Derive the aggregate from rule results in policy order. The first
    /// LIVE denial decides the reason.
    pub fn from_results(id: Option<String>, results: Vec<RuleResult>) -> Self {
        let mut denial_reason = None;

        for result in &results {
            match (result.conclusion, result.mode) {
                (Conclusion::Deny, RuleMode::Live) => {
                    if denial_reason.is_none() {
                        denial_reason = Some(DenialReason::from(result.kind()));
                    }
                }
                (Conclusion::Deny, RuleMode::DryRun) => {
                    tracing::info!(
                        rule = ?result.kind(),
                        rule_id = ?result.rule_id,
                        "Dry-run rule would have denied request"
                    );
                }
                (Conclusion::Error, _) => {
                    tracing::warn!(
                        rule = ?result.kind(),
                        reason = ?result.reason,
                        "Rule evaluation reported an error"
                    );
                }
                (Conclusion::Allow, _) => {}
            }
        }

        Self {
            id,
            denial_reason,
            results,
        }
    }

    /// Decision used when the gate is disabled.
    pub fn allow_all() -> Self {
        Self {
            id: None,
            denial_reason: None,
            results: Vec::new(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.denial_reason.is_none()
    }

    /// True if any result, deciding or not, flags a spoofed bot.
    pub fn has_spoofed_bot(&self) -> bool {
        self.results.iter().any(RuleResult::is_spoofed_bot)
    }

    /// Seconds until the rate limit resets, from the first rate-limit result
    /// that reports it.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.results.iter().find_map(|r| match r.reason {
            RuleReason::RateLimit { reset_in_secs, .. } => reset_in_secs,
            _ => None,
        })
    }
}
