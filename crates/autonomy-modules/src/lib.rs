//! Reference stage modules for the autonomy kernel.
//!
//! A small, domain-free set of port implementations that is enough to run
//! the kernel end to end without real hardware:
//!
//! - [`SyntheticSensor`](sensor::SyntheticSensor): seeded operational
//!   telemetry on an `ops` channel.
//! - [`OpsPerception`](perception::OpsPerception): per-subsystem health in
//!   `[0, 1]`.
//! - [`WeightedRisk`](risk::WeightedRisk): a weighted blend of ill-health
//!   into a 0-100 score.
//! - [`TieredPolicy`](policy::TieredPolicy): CONTINUE, SLOW_ROLL and
//!   EMERGENCY tiers keyed on the risk level.
//! - [`IntentProposals`](proposals::IntentProposals): one proposal per
//!   intent.
//! - [`ChannelActuation`](actuation::ChannelActuation): one command per
//!   approved decision on a fixed channel.
//!
//! [`reference_kernel`] wires them together with the default
//! [`GovernanceEngine`].

#![deny(unsafe_code)]

pub mod actuation;
pub mod perception;
pub mod policy;
pub mod proposals;
pub mod risk;
pub mod sensor;

use autonomy_contracts::prelude::*;
use autonomy_kernel::prelude::{GovernanceEngine, Kernel, KernelError, KernelPorts};

use crate::actuation::ChannelActuation;
use crate::perception::OpsPerception;
use crate::policy::TieredPolicy;
use crate::proposals::IntentProposals;
use crate::risk::WeightedRisk;
use crate::sensor::SyntheticSensor;

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Conservative starting envelope: auto-approve up to 40, block from 80,
/// human review for RETREAT and EMERGENCY, gate closed.
pub fn reference_governance_config() -> GovernanceConfig {
    GovernanceConfig {
        max_auto_risk: 40.0,
        hard_block_risk: 80.0,
        require_human_for: [IntentKind::Retreat, IntentKind::Emergency]
            .into_iter()
            .collect(),
        gate_open: false,
    }
}

/// The reference ports around the given sensor.
pub fn reference_ports(sensor: SyntheticSensor) -> KernelPorts {
    KernelPorts::new(
        sensor,
        OpsPerception,
        WeightedRisk::default(),
        TieredPolicy,
        IntentProposals,
        GovernanceEngine,
        ChannelActuation::default(),
    )
}

/// A kernel running the reference modules, seeded with `seed` and stamped
/// with wall-clock time.
///
/// # Errors
///
/// [`KernelError::Config`] if `config` fails validation.
pub fn reference_kernel(seed: u64, config: GovernanceConfig) -> Result<Kernel, KernelError> {
    Kernel::new(reference_ports(SyntheticSensor::new(seed)), config)
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::actuation::ChannelActuation;
    pub use crate::perception::OpsPerception;
    pub use crate::policy::TieredPolicy;
    pub use crate::proposals::IntentProposals;
    pub use crate::risk::WeightedRisk;
    pub use crate::sensor::{Clock, SyntheticSensor};
    pub use crate::{reference_governance_config, reference_kernel, reference_ports};
}
