//! Governance configuration: the human and safety envelope knobs.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::intent::IntentKind;
use crate::risk::{SCALE_MAX, SCALE_MIN};
use crate::ConfigError;

/// Thresholds and switches the governance stage evaluates proposals against.
///
/// Fixed for the duration of a tick. The operator may swap it between ticks;
/// the kernel runs [`validate`](Self::validate) on every swap and keeps the
/// previous config when validation fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Risk at or below this may be approved without a human.
    pub max_auto_risk: f64,
    /// Risk at or above this blocks every proposal. Values above 100 disable
    /// hard blocking.
    pub hard_block_risk: f64,
    /// Intent kinds that always need a human (unless hard-blocked).
    pub require_human_for: BTreeSet<IntentKind>,
    /// Master switch. When closed nothing is approved automatically.
    pub gate_open: bool,
}

impl GovernanceConfig {
    /// Build and validate a config.
    pub fn new(
        max_auto_risk: f64,
        hard_block_risk: f64,
        require_human_for: impl IntoIterator<Item = IntentKind>,
        gate_open: bool,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            max_auto_risk,
            hard_block_risk,
            require_human_for: require_human_for.into_iter().collect(),
            gate_open,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the thresholds are usable and correctly ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_auto_risk", self.max_auto_risk),
            ("hard_block_risk", self.hard_block_risk),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteThreshold { field, value });
            }
        }
        if !(SCALE_MIN..=SCALE_MAX).contains(&self.max_auto_risk) {
            return Err(ConfigError::AutoCeilingOutOfRange {
                value: self.max_auto_risk,
            });
        }
        if self.hard_block_risk < SCALE_MIN {
            return Err(ConfigError::HardBlockOutOfRange {
                value: self.hard_block_risk,
            });
        }
        if self.hard_block_risk < self.max_auto_risk {
            return Err(ConfigError::InvertedThresholds {
                max_auto_risk: self.max_auto_risk,
                hard_block_risk: self.hard_block_risk,
            });
        }
        Ok(())
    }

    /// Whether proposals from intents of this kind always need a human.
    pub fn requires_human(&self, kind: &IntentKind) -> bool {
        self.require_human_for.contains(kind)
    }

    /// Return a copy with the master gate set.
    pub fn with_gate(mut self, open: bool) -> Self {
        self.gate_open = open;
        self
    }
}
