//! Stage ports: the capability interfaces the kernel drives each tick.
//!
//! Each port has exactly one operation. Implementations are independent and
//! swappable; the kernel takes one of each at construction and calls them in
//! the fixed order given by [`Stage::PIPELINE`].
//!
//! Ports are synchronous. A collaborator that is itself asynchronous (a
//! sensor read over a network, say) must resolve to a value or a timeout
//! error before returning.

use serde::{Deserialize, Serialize};

use crate::config::GovernanceConfig;
use crate::frame::{SensorFrame, WorldState};
use crate::intent::Intent;
use crate::proposal::{ActuationCommand, Decision, Proposal};
use crate::risk::RiskReport;
use crate::Tick;

/// Result type returned by every port operation.
pub type StageResult<T> = Result<T, anyhow::Error>;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Identifies a pipeline stage, used to attribute failures and timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Sensor,
    Perception,
    Risk,
    Policy,
    Proposal,
    Governance,
    Actuation,
    /// Encoding the tick's contents for the audit chain.
    Audit,
}

impl Stage {
    /// Port stages in execution order.
    pub const PIPELINE: [Stage; 7] = [
        Stage::Sensor,
        Stage::Perception,
        Stage::Risk,
        Stage::Policy,
        Stage::Proposal,
        Stage::Governance,
        Stage::Actuation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Sensor => "sensor",
            Stage::Perception => "perception",
            Stage::Risk => "risk",
            Stage::Policy => "policy",
            Stage::Proposal => "proposal",
            Stage::Governance => "governance",
            Stage::Actuation => "actuation",
            Stage::Audit => "audit",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Port traits
// ---------------------------------------------------------------------------

/// Reads raw inputs for a tick.
pub trait Sensor: Send {
    /// Produce the frame for `tick`. The returned frame must carry `tick`.
    fn read(&mut self, tick: Tick) -> StageResult<SensorFrame>;
}

/// Interprets a frame into a world state.
pub trait Perception: Send {
    /// `prev_world` is the last committed world state, `None` on the first
    /// tick.
    fn run(&self, frame: &SensorFrame, prev_world: Option<&WorldState>)
        -> StageResult<WorldState>;
}

/// Scores the risk of a world state.
pub trait Risk: Send {
    fn assess(&self, world: &WorldState) -> StageResult<RiskReport>;
}

/// Turns a world state and its risk into intents.
pub trait Policy: Send {
    /// Intents may come back in any order; the kernel orders them.
    fn decide(&self, world: &WorldState, risk: &RiskReport) -> StageResult<Vec<Intent>>;
}

/// Turns ordered intents into concrete proposals.
pub trait ProposalGenerator: Send {
    /// `intents` is already ordered. Each proposal's `source.index` must
    /// point into this slice. Zero proposals for an intent is allowed.
    fn generate(&self, tick: Tick, intents: &[Intent]) -> StageResult<Vec<Proposal>>;
}

/// Judges one proposal.
pub trait Governance: Send {
    fn evaluate(
        &self,
        proposal: &Proposal,
        risk: &RiskReport,
        config: &GovernanceConfig,
    ) -> StageResult<Decision>;
}

/// Builds the actuator-facing command for an approved decision.
pub trait Actuation: Send {
    /// Only called with decisions whose outcome is `Approved`.
    fn build(&self, decision: &Decision) -> StageResult<ActuationCommand>;
}
