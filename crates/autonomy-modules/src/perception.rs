//! Turns raw `ops` telemetry into per-subsystem health.

use autonomy_contracts::prelude::*;

use crate::sensor::OPS_CHANNEL;

/// Health is 1.0 for a perfectly healthy subsystem and 0.0 for a failed one.
///
/// | subsystem     | health              |
/// |---------------|---------------------|
/// | `compute`     | `1 - system_load`   |
/// | `environment` | `1 - env_stress`    |
/// | `comms`       | `comms_quality`     |
///
/// Missing readings fall back to 0.5 load, 0.5 stress and 0.8 comms. The
/// world's facts carry the raw readings under `raw_ops` and a running
/// `observed_ticks` count continued from the previous world.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpsPerception;

fn reading(ops: Option<&serde_json::Value>, key: &str, default: f64) -> f64 {
    ops.and_then(|v| v.get(key))
        .and_then(serde_json::Value::as_f64)
        .unwrap_or(default)
}

impl Perception for OpsPerception {
    fn run(&self, frame: &SensorFrame, prev_world: Option<&WorldState>) -> StageResult<WorldState> {
        let ops = frame.channel(OPS_CHANNEL);
        let load = reading(ops, "system_load", 0.5);
        let stress = reading(ops, "env_stress", 0.5);
        let comms = reading(ops, "comms_quality", 0.8);

        let observed = prev_world
            .and_then(|w| w.fact("observed_ticks"))
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0)
            + 1;

        Ok(WorldState::from_frame(frame)
            .with_health("compute", (1.0 - load).clamp(0.0, 1.0))
            .with_health("environment", (1.0 - stress).clamp(0.0, 1.0))
            .with_health("comms", comms.clamp(0.0, 1.0))
            .with_fact(
                "raw_ops",
                ops.cloned().unwrap_or_else(|| serde_json::json!({})),
            )
            .with_fact("observed_ticks", serde_json::json!(observed)))
    }
}
