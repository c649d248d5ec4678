//! Raw and interpreted world records: [`SensorFrame`] and [`WorldState`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Tick, TimestampMs};

// ---------------------------------------------------------------------------
// SensorFrame
// ---------------------------------------------------------------------------

/// Raw inputs from the outside world for a single tick.
///
/// Channels carry no semantic meaning at this stage; interpreting them is the
/// job of the perception stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    pub tick: Tick,
    pub timestamp_ms: TimestampMs,
    /// Channel name to raw value (e.g. `"ops"` -> `{"system_load": 0.4}`).
    pub channels: BTreeMap<String, serde_json::Value>,
}

impl SensorFrame {
    /// Create an empty frame for the given tick.
    pub fn new(tick: Tick, timestamp_ms: TimestampMs) -> Self {
        Self {
            tick,
            timestamp_ms,
            channels: BTreeMap::new(),
        }
    }

    /// Builder-style channel insertion.
    pub fn with_channel(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.channels.insert(name.into(), value);
        self
    }

    pub fn channel(&self, name: &str) -> Option<&serde_json::Value> {
        self.channels.get(name)
    }
}

// ---------------------------------------------------------------------------
// WorldState
// ---------------------------------------------------------------------------

/// Semantic understanding of the current situation.
///
/// Produced by perception from the current frame and the previous
/// `WorldState`. Besides the audit chain this is the only state carried from
/// one tick to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub tick: Tick,
    pub timestamp_ms: TimestampMs,
    /// Fact name to value (tracks, objects, status flags).
    pub facts: BTreeMap<String, serde_json::Value>,
    /// Subsystem name to health, 0.0 (failed) through 1.0 (nominal).
    pub health: BTreeMap<String, f64>,
}

impl WorldState {
    /// Create an empty world state stamped with the frame's tick and time.
    pub fn from_frame(frame: &SensorFrame) -> Self {
        Self {
            tick: frame.tick,
            timestamp_ms: frame.timestamp_ms,
            facts: BTreeMap::new(),
            health: BTreeMap::new(),
        }
    }

    pub fn with_fact(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.facts.insert(name.into(), value);
        self
    }

    pub fn with_health(mut self, subsystem: impl Into<String>, health: f64) -> Self {
        self.health.insert(subsystem.into(), health);
        self
    }

    pub fn fact(&self, name: &str) -> Option<&serde_json::Value> {
        self.facts.get(name)
    }

    /// Health of a subsystem, or `default` if perception did not report it.
    pub fn health_or(&self, subsystem: &str, default: f64) -> f64 {
        self.health.get(subsystem).copied().unwrap_or(default)
    }
}
