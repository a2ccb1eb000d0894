//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → gate.rs (resolve client IP, build admission request)
//!     → engine.rs (decision service evaluates policy.rs rules)
//!     → decision.rs (aggregate allow/deny + per-rule results)
//!     → gate.rs verdict: 429 / 403 / 500 short-circuit, or pass to handlers
//! Outgoing response:
//!     → headers.rs (hardening headers)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: shield, bot and rate-limit rules all run on every request
//! - Fail closed: no decision means no access
//! - No trust in client input beyond the configured proxy hops

pub mod decision;
pub mod engine;
pub mod gate;
pub mod headers;
pub mod policy;

pub use decision::{AdmissionDecision, Conclusion, DenialReason, RuleKind, RuleReason, RuleResult};
pub use engine::{AdmissionRequest, DecisionService, EngineError, EngineVerdict, RemoteDecisionClient, RequestDetails};
pub use gate::{admission_middleware, verdict, AdmissionGate, Rejection};
pub use policy::{Policy, Rule};
