//! Synthetic operational telemetry.

use std::time::{SystemTime, UNIX_EPOCH};

use autonomy_contracts::prelude::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Channel name the synthetic readings are published on.
pub const OPS_CHANNEL: &str = "ops";

/// Where frame timestamps come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Milliseconds since the Unix epoch at read time.
    Wall,
    /// `origin_ms + tick * step_ms`. Reproducible across runs.
    Fixed { origin_ms: TimestampMs, step_ms: u64 },
}

impl Clock {
    fn now(self, tick: Tick) -> StageResult<TimestampMs> {
        match self {
            Clock::Wall => {
                let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH)?;
                Ok(u64::try_from(since_epoch.as_millis())?)
            }
            Clock::Fixed { origin_ms, step_ms } => {
                Ok(origin_ms.saturating_add(tick.saturating_mul(step_ms)))
            }
        }
    }
}

/// Seeded generator of `system_load`, `env_stress` and `comms_quality`.
///
/// The same seed produces the same readings in the same order. Readings
/// fall in `[0.4, 0.6)`, `[0.3, 0.6)` and `[0.7, 1.0)` respectively.
#[derive(Debug, Clone)]
pub struct SyntheticSensor {
    rng: Pcg64,
    clock: Clock,
}

impl SyntheticSensor {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
            clock: Clock::Wall,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

impl Sensor for SyntheticSensor {
    fn read(&mut self, tick: Tick) -> StageResult<SensorFrame> {
        let timestamp_ms = self.clock.now(tick)?;
        let system_load = self.rng.gen_range(0.4..0.6);
        let env_stress = self.rng.gen_range(0.3..0.6);
        let comms_quality = self.rng.gen_range(0.7..1.0);
        tracing::trace!(tick, system_load, env_stress, comms_quality, "synthetic read");

        Ok(SensorFrame::new(tick, timestamp_ms).with_channel(
            OPS_CHANNEL,
            serde_json::json!({
                "system_load": system_load,
                "env_stress": env_stress,
                "comms_quality": comms_quality,
            }),
        ))
    }
}
