//! One proposal per intent.

use autonomy_contracts::prelude::*;

/// Rate multiplier proposed for SLOW_ROLL when the intent does not carry one.
pub const DEFAULT_RATE_MULTIPLIER: f64 = 0.6;

/// Maps each intent to a concrete action:
///
/// | intent      | action             | params                    |
/// |-------------|--------------------|---------------------------|
/// | CONTINUE    | `maintain_profile` | `max_delta: "minimal"`    |
/// | SLOW_ROLL   | `reduce_rate`      | `rate_multiplier`         |
/// | EMERGENCY   | `safe_hold`        | `hold: true`              |
/// | other       | `custom`           | `intent: <kind>`          |
///
/// Proposal ids are the intent's index in the tick's ordered list.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentProposals;

fn action_for(intent: &Intent) -> ActionDescriptor {
    match &intent.kind {
        IntentKind::Continue => ActionDescriptor::new("maintain_profile")
            .with_param("max_delta", serde_json::json!("minimal")),
        IntentKind::SlowRoll => ActionDescriptor::new("reduce_rate").with_param(
            "rate_multiplier",
            intent
                .params
                .get("rate_multiplier")
                .cloned()
                .unwrap_or_else(|| serde_json::json!(DEFAULT_RATE_MULTIPLIER)),
        ),
        IntentKind::Emergency => {
            ActionDescriptor::new("safe_hold").with_param("hold", serde_json::json!(true))
        }
        other => ActionDescriptor::new("custom").with_param("intent", serde_json::json!(other)),
    }
}

impl ProposalGenerator for IntentProposals {
    fn generate(&self, tick: Tick, intents: &[Intent]) -> StageResult<Vec<Proposal>> {
        intents
            .iter()
            .enumerate()
            .map(|(index, intent)| -> StageResult<Proposal> {
                let id = ProposalId(u32::try_from(index)?);
                Ok(
                    Proposal::new(tick, id, IntentRef::new(index, intent), action_for(intent))
                        .with_expected_effect("risk_delta", serde_json::json!(-10))
                        .with_expected_effect("clarity_delta", serde_json::json!(5)),
                )
            })
            .collect()
    }
}
