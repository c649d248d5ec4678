//! Command building for approved decisions.

use autonomy_contracts::prelude::*;

/// Builds `{proposal, action, params, mode: "EXECUTE"}` commands on one
/// channel (`"core"` unless configured otherwise).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelActuation {
    pub channel: String,
}

impl ChannelActuation {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }
}

impl Default for ChannelActuation {
    fn default() -> Self {
        Self::new("core")
    }
}

impl Actuation for ChannelActuation {
    fn build(&self, decision: &Decision) -> StageResult<ActuationCommand> {
        if !decision.is_approved() {
            anyhow::bail!(
                "refusing to actuate {} with outcome {}",
                decision.proposal,
                decision.outcome
            );
        }
        Ok(ActuationCommand {
            tick: decision.tick,
            proposal: decision.proposal,
            channel: self.channel.clone(),
            payload: serde_json::json!({
                "proposal": decision.proposal.to_string(),
                "action": decision.action.action_type,
                "params": decision.action.params,
                "mode": "EXECUTE",
            }),
        })
    }
}
