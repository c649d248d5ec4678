//! Weighted blend of subsystem ill-health into a risk score.

use autonomy_contracts::prelude::*;

/// Health assumed for a subsystem the world does not report.
const UNREPORTED_HEALTH: f64 = 0.8;

/// Lowest clarity the blend will report.
const CLARITY_FLOOR: f64 = 30.0;

/// `score = 100 * sum(weight * (1 - health))` over compute, environment and
/// comms, with `clarity = max(30, 100 - 0.6 * score)`. Score, clarity and
/// driver contributions are rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedRisk {
    pub compute: f64,
    pub environment: f64,
    pub comms: f64,
}

impl Default for WeightedRisk {
    fn default() -> Self {
        Self {
            compute: 0.35,
            environment: 0.40,
            comms: 0.25,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl Risk for WeightedRisk {
    fn assess(&self, world: &WorldState) -> StageResult<RiskReport> {
        let ill = |subsystem: &str| 1.0 - world.health_or(subsystem, UNREPORTED_HEALTH);
        let (compute, environment, comms) = (ill("compute"), ill("environment"), ill("comms"));

        let score = (100.0
            * (self.compute * compute + self.environment * environment + self.comms * comms))
            .clamp(0.0, 100.0);
        let clarity = (100.0 - score * 0.6).max(CLARITY_FLOOR);

        Ok(
            RiskReport::new(world.tick, world.timestamp_ms, round1(score), round1(clarity))
                .with_driver(RiskDriver::weighted("compute", round1(compute * 100.0)))
                .with_driver(RiskDriver::weighted("environment", round1(environment * 100.0)))
                .with_driver(RiskDriver::weighted("comms", round1(comms * 100.0)))
                .with_notes("synthetic risk blend"),
        )
    }
}
