//! Risk-tiered intent selection.

use autonomy_contracts::prelude::*;

/// Emits intents by risk level:
///
/// - always CONTINUE at priority 10;
/// - at HIGH or above, SLOW_ROLL at priority 50 with `rate_multiplier` 0.5;
/// - at CRITICAL, EMERGENCY at priority 90 with `mode` HOLD.
///
/// Output is already in priority order, highest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct TieredPolicy;

impl Policy for TieredPolicy {
    fn decide(&self, world: &WorldState, risk: &RiskReport) -> StageResult<Vec<Intent>> {
        let level = risk.level();
        let mut intents = Vec::with_capacity(3);

        if level == RiskLevel::Critical {
            intents.push(
                Intent::new(world.tick, IntentKind::Emergency, 90)
                    .with_param("mode", serde_json::json!("HOLD"))
                    .with_rationale("critical risk; hold until operator review"),
            );
        }
        if level >= RiskLevel::High {
            intents.push(
                Intent::new(world.tick, IntentKind::SlowRoll, 50)
                    .with_param("rate_multiplier", serde_json::json!(0.5))
                    .with_rationale(format!("risk {:.1} at or above HIGH; slow down", risk.score)),
            );
        }
        intents.push(
            Intent::new(world.tick, IntentKind::Continue, 10)
                .with_rationale("baseline keep-going behaviour"),
        );

        Ok(intents)
    }
}
