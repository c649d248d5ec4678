//! Autonomy Contracts -- the data records and stage ports of the autonomy
//! kernel.
//!
//! Every tick flows through the same chain of records:
//!
//! ```text
//! SensorFrame -> WorldState -> RiskReport -> [Intent] -> [Proposal]
//!             -> [Decision] -> [ActuationCommand]
//! ```
//!
//! Each record is produced fresh by exactly one stage and never mutated
//! afterwards. The stages themselves are the traits in [`ports`]; this crate
//! carries no pipeline logic of its own beyond small invariant helpers
//! (risk clamping, stable intent ordering, config validation).
//!
//! # Quick Start
//!
//! ```
//! use autonomy_contracts::prelude::*;
//!
//! let intents = order_intents(vec![
//!     Intent::new(0, IntentKind::Continue, 5),
//!     Intent::new(0, IntentKind::SlowRoll, 5),
//!     Intent::new(0, IntentKind::Emergency, 9),
//! ]);
//!
//! assert_eq!(intents[0].kind, IntentKind::Emergency);
//! assert_eq!(intents[1].kind, IntentKind::Continue);
//! assert_eq!(intents[2].kind, IntentKind::SlowRoll);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod frame;
pub mod intent;
pub mod ports;
pub mod proposal;
pub mod risk;

// ---------------------------------------------------------------------------
// Shared aliases
// ---------------------------------------------------------------------------

/// Discrete tick index. Owned and advanced exclusively by the kernel.
pub type Tick = u64;

/// Milliseconds since the Unix epoch.
pub type TimestampMs = u64;

/// Free-form parameter bag. A `BTreeMap` so the JSON encoding is canonical.
pub type Params = std::collections::BTreeMap<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced when validating a [`GovernanceConfig`](config::GovernanceConfig).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A threshold was NaN or infinite.
    #[error("governance threshold '{field}' must be finite, got {value}")]
    NonFiniteThreshold { field: &'static str, value: f64 },

    /// The auto-approval ceiling lies outside the risk scale.
    #[error("max_auto_risk must lie within [0, 100], got {value}")]
    AutoCeilingOutOfRange { value: f64 },

    /// The hard-block ceiling is negative.
    #[error("hard_block_risk must be non-negative, got {value}")]
    HardBlockOutOfRange { value: f64 },

    /// The hard-block ceiling sits below the auto-approval ceiling.
    #[error("hard_block_risk ({hard_block_risk}) must not be below max_auto_risk ({max_auto_risk})")]
    InvertedThresholds {
        max_auto_risk: f64,
        hard_block_risk: f64,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::GovernanceConfig;
    pub use crate::frame::{SensorFrame, WorldState};
    pub use crate::intent::{order_intents, Intent, IntentKind, IntentRef};
    pub use crate::ports::{
        Actuation, Governance, Perception, Policy, ProposalGenerator, Risk, Sensor, Stage,
        StageResult,
    };
    pub use crate::proposal::{
        ActionDescriptor, ActuationCommand, Decision, GovernanceRule, Outcome, Proposal,
        ProposalId,
    };
    pub use crate::risk::{RiskDriver, RiskLevel, RiskReport};
    pub use crate::{ConfigError, Params, Tick, TimestampMs};
}
