//! Proposals, governance decisions, and actuation commands.
//!
//! For one tick these are in 1 : 1 : <=1 correspondence. Every
//! [`Proposal`] is judged by exactly one [`Decision`], and only an
//! [`Outcome::Approved`] decision yields an [`ActuationCommand`]. All three
//! trace back to the originating intent through [`ProposalId`] and
//! [`IntentRef`].

use serde::{Deserialize, Serialize};

use crate::intent::IntentRef;
use crate::{Params, Tick};

// ---------------------------------------------------------------------------
// ProposalId
// ---------------------------------------------------------------------------

/// Identifies a proposal within its tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub u32);

impl std::fmt::Display for ProposalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ActionDescriptor
// ---------------------------------------------------------------------------

/// A concrete action: what to do and with which parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// Machine-readable action type (e.g. `"reduce_rate"`).
    pub action_type: String,
    /// Envelope and constraints for the action.
    pub params: Params,
}

impl ActionDescriptor {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            params: Params::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }
}

// ---------------------------------------------------------------------------
// Proposal
// ---------------------------------------------------------------------------

/// A concrete candidate action derived from exactly one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub tick: Tick,
    pub id: ProposalId,
    pub source: IntentRef,
    pub action: ActionDescriptor,
    /// What the proposer expects the action to change (informational).
    pub expected_effect: Params,
}

impl Proposal {
    pub fn new(tick: Tick, id: ProposalId, source: IntentRef, action: ActionDescriptor) -> Self {
        Self {
            tick,
            id,
            source,
            action,
            expected_effect: Params::new(),
        }
    }

    pub fn with_expected_effect(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.expected_effect.insert(name.into(), value);
        self
    }
}

// ---------------------------------------------------------------------------
// Outcome / GovernanceRule
// ---------------------------------------------------------------------------

/// Governance's ruling on a proposal. There is no fourth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Approved,
    RequiresHuman,
    Blocked,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Approved => "APPROVED",
            Outcome::RequiresHuman => "REQUIRES_HUMAN",
            Outcome::Blocked => "BLOCKED",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which governance rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceRule {
    /// Risk at or above the hard-block ceiling.
    HardBlock,
    /// The source intent's kind always needs a human.
    HumanRequiredIntent,
    /// The master gate is closed.
    GateClosed,
    /// Risk at or below the auto-approval ceiling.
    WithinAutoCeiling,
    /// Risk between the auto-approval and hard-block ceilings.
    AboveAutoCeiling,
}

impl GovernanceRule {
    /// The outcome this rule always yields.
    pub fn outcome(self) -> Outcome {
        match self {
            GovernanceRule::HardBlock => Outcome::Blocked,
            GovernanceRule::WithinAutoCeiling => Outcome::Approved,
            GovernanceRule::HumanRequiredIntent
            | GovernanceRule::GateClosed
            | GovernanceRule::AboveAutoCeiling => Outcome::RequiresHuman,
        }
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Governance's verdict on one proposal, with the risk it was judged against.
///
/// The judged action is copied in so the actuation stage can build its
/// command from the decision alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub tick: Tick,
    pub proposal: ProposalId,
    pub action: ActionDescriptor,
    pub outcome: Outcome,
    pub rule: GovernanceRule,
    pub reason: String,
    pub risk_score: f64,
    pub risk_clarity: f64,
}

impl Decision {
    pub fn is_approved(&self) -> bool {
        self.outcome == Outcome::Approved
    }
}

// ---------------------------------------------------------------------------
// ActuationCommand
// ---------------------------------------------------------------------------

/// What an external actuator layer consumes. Derived from one approved
/// decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuationCommand {
    pub tick: Tick,
    pub proposal: ProposalId,
    /// Actuator channel (e.g. `"vehicle"`, `"fleet"`, `"alerts"`).
    pub channel: String,
    pub payload: serde_json::Value,
}
