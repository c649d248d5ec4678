//! The default governance engine.
//!
//! Every proposal is judged against the tick's [`RiskReport`] and the
//! active [`GovernanceConfig`] by walking a fixed rule table. The first rule
//! that matches decides:
//!
//! | # | Condition                                  | Outcome          |
//! |---|--------------------------------------------|------------------|
//! | 1 | `risk.score >= hard_block_risk`            | `Blocked`        |
//! | 2 | source intent kind in `require_human_for`  | `RequiresHuman`  |
//! | 3 | `!gate_open`                               | `RequiresHuman`  |
//! | 4 | `risk.score <= max_auto_risk`              | `Approved`       |
//! | 5 | otherwise                                  | `RequiresHuman`  |
//!
//! A hard block can never be relaxed by a later rule, and a closed gate can
//! only turn an approval into a human review. The engine holds no state: a
//! decision is a function of (proposal, risk, config) alone.

use autonomy_contracts::prelude::*;

/// Stateless implementation of the [`Governance`] port.
#[derive(Debug, Clone, Copy, Default)]
pub struct GovernanceEngine;

impl GovernanceEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Governance for GovernanceEngine {
    fn evaluate(
        &self,
        proposal: &Proposal,
        risk: &RiskReport,
        config: &GovernanceConfig,
    ) -> StageResult<Decision> {
        Ok(judge(proposal, risk, config))
    }
}

/// Pick the rule that decides a proposal from intent `kind` at `score`.
///
/// A NaN score matches neither ceiling and falls through to
/// [`GovernanceRule::AboveAutoCeiling`] (or an earlier human rule), so it
/// is never approved.
pub fn select_rule(kind: &IntentKind, score: f64, config: &GovernanceConfig) -> GovernanceRule {
    if score >= config.hard_block_risk {
        GovernanceRule::HardBlock
    } else if config.requires_human(kind) {
        GovernanceRule::HumanRequiredIntent
    } else if !config.gate_open {
        GovernanceRule::GateClosed
    } else if score <= config.max_auto_risk {
        GovernanceRule::WithinAutoCeiling
    } else {
        GovernanceRule::AboveAutoCeiling
    }
}

/// Judge one proposal.
pub fn judge(proposal: &Proposal, risk: &RiskReport, config: &GovernanceConfig) -> Decision {
    let kind = &proposal.source.kind;
    let rule = select_rule(kind, risk.score, config);
    let reason = match rule {
        GovernanceRule::HardBlock => format!(
            "blocked: risk {:.1} at or above hard-block ceiling {:.1}",
            risk.score, config.hard_block_risk
        ),
        GovernanceRule::HumanRequiredIntent => {
            format!("human review required: policy mandates review of {kind} intents")
        }
        GovernanceRule::GateClosed => {
            "human review required: master gate is closed".to_owned()
        }
        GovernanceRule::WithinAutoCeiling => format!(
            "approved: risk {:.1} within auto-approval ceiling {:.1}",
            risk.score, config.max_auto_risk
        ),
        GovernanceRule::AboveAutoCeiling => format!(
            "human review required: risk {:.1} exceeds auto-approval ceiling {:.1}",
            risk.score, config.max_auto_risk
        ),
    };

    Decision {
        tick: proposal.tick,
        proposal: proposal.id,
        action: proposal.action.clone(),
        outcome: rule.outcome(),
        rule,
        reason,
        risk_score: risk.score,
        risk_clarity: risk.clarity,
    }
}
