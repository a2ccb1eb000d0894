//! Admission policy: the ordered rule set sent to the decision service.

use serde::{Deserialize, Serialize};

use crate::config::{AdmissionConfig, RuleMode};

/// Characteristic the rate-limit bucket is keyed by.
pub const CHARACTERISTIC_IP: &str = "ip.src";

/// One rule of the composed policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rule {
    /// Blocks known attack signatures (SQL injection, XSS, CSRF).
    Shield { mode: RuleMode },

    /// Classifies the requester; `allow` lists categories or bot names
    /// that are let through.
    DetectBot { mode: RuleMode, allow: Vec<String> },

    /// Token bucket: `refill_rate` tokens every `interval` seconds, up to
    /// `capacity`.
    TokenBucket {
        mode: RuleMode,
        refill_rate: u32,
        interval: u32,
        capacity: u32,
    },
}

impl Rule {
    pub fn mode(&self) -> RuleMode {
        match self {
            Rule::Shield { mode } | Rule::DetectBot { mode, .. } | Rule::TokenBucket { mode, .. } => *mode,
        }
    }
}

/// The full policy: which characteristics key the counters and the rules
/// evaluated, in order, on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub characteristics: Vec<String>,
    pub rules: Vec<Rule>,
}

impl Policy {
    /// Shield, then bot detection, then the token bucket.
    pub fn from_config(config: &AdmissionConfig) -> Self {
        let bucket = &config.rate_limit;
        Self {
            characteristics: vec![CHARACTERISTIC_IP.to_string()],
            rules: vec![
                Rule::Shield { mode: config.shield.mode },
                Rule::DetectBot {
                    mode: config.bot.mode,
                    allow: config.bot.allow.clone(),
                },
                Rule::TokenBucket {
                    mode: bucket.mode,
                    refill_rate: bucket.refill_rate,
                    interval: bucket.interval_secs,
                    capacity: bucket.capacity,
                },
            ],
        }
    }
}
