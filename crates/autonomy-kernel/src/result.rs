//! The product of one tick: [`TickResult`] and its views.

use autonomy_audit::AuditEntry;
use autonomy_contracts::prelude::*;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TickResult
// ---------------------------------------------------------------------------

/// Everything one tick produced, including the audit entry that seals it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickResult {
    pub tick: Tick,
    pub frame: SensorFrame,
    pub world: WorldState,
    pub risk: RiskReport,
    /// Ordered by descending priority.
    pub intents: Vec<Intent>,
    pub proposals: Vec<Proposal>,
    /// One per proposal, in proposal order.
    pub decisions: Vec<Decision>,
    /// One per approved decision, in decision order.
    pub commands: Vec<ActuationCommand>,
    pub audit: AuditEntry,
}

impl TickResult {
    /// The audited portion of this result (everything but the entry).
    pub fn contents(&self) -> TickContents<'_> {
        TickContents {
            tick: self.tick,
            frame: &self.frame,
            world: &self.world,
            risk: &self.risk,
            intents: &self.intents,
            proposals: &self.proposals,
            decisions: &self.decisions,
            commands: &self.commands,
        }
    }

    pub fn approved(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter().filter(|d| d.is_approved())
    }

    pub fn outcome_counts(&self) -> OutcomeCounts {
        OutcomeCounts::tally(&self.decisions)
    }

    pub fn summary(&self) -> TickSummary {
        TickSummary {
            tick: self.tick,
            risk_score: self.risk.score,
            risk_level: self.risk.level(),
            clarity: self.risk.clarity,
            intents: self.intents.len(),
            proposals: self.proposals.len(),
            outcomes: self.outcome_counts(),
            commands: self.commands.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// TickContents
// ---------------------------------------------------------------------------

/// Borrowed view of a tick's records, digested into its audit entry.
///
/// Field order is part of the digest; do not reorder.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TickContents<'a> {
    pub tick: Tick,
    pub frame: &'a SensorFrame,
    pub world: &'a WorldState,
    pub risk: &'a RiskReport,
    pub intents: &'a [Intent],
    pub proposals: &'a [Proposal],
    pub decisions: &'a [Decision],
    pub commands: &'a [ActuationCommand],
}

// ---------------------------------------------------------------------------
// OutcomeCounts / TickSummary
// ---------------------------------------------------------------------------

/// Decisions per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub approved: usize,
    pub requires_human: usize,
    pub blocked: usize,
}

impl OutcomeCounts {
    pub fn tally(decisions: &[Decision]) -> Self {
        decisions.iter().fold(Self::default(), |mut acc, d| {
            match d.outcome {
                Outcome::Approved => acc.approved += 1,
                Outcome::RequiresHuman => acc.requires_human += 1,
                Outcome::Blocked => acc.blocked += 1,
            }
            acc
        })
    }
}

/// One-line overview of a tick for operator consoles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    pub tick: Tick,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub clarity: f64,
    pub intents: usize,
    pub proposals: usize,
    pub outcomes: OutcomeCounts,
    pub commands: usize,
}

impl std::fmt::Display for TickSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tick {:03} | risk {:5.1} ({}) | clarity {:5.1} | intents {:2} | props {:2} | \
             approved {:2} | human {:2} | blocked {:2} | cmds {:2}",
            self.tick,
            self.risk_score,
            self.risk_level,
            self.clarity,
            self.intents,
            self.proposals,
            self.outcomes.approved,
            self.outcomes.requires_human,
            self.outcomes.blocked,
            self.commands,
        )
    }
}
