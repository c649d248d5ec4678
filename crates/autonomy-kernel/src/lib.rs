//! Autonomy Kernel -- fixed-order tick pipeline with a governance gate and a
//! hash-chained audit log.
//!
//! This crate builds on [`autonomy_contracts`] for the records and stage
//! ports and on [`autonomy_audit`] for the audit chain. It provides:
//!
//! - [`Kernel`](tick::Kernel): the tick orchestrator, which owns the tick
//!   counter, the previous world state, the governance config, and the audit
//!   chain.
//! - [`GovernanceEngine`](governance::GovernanceEngine): the default
//!   governance port, a stateless rule table deciding APPROVED,
//!   REQUIRES_HUMAN or BLOCKED.
//! - [`SharedKernel`](shared::SharedKernel): a mutex-guarded handle for
//!   callers on several threads.
//!
//! Sensors, perception, risk scoring, policy, proposal generation and
//! actuation are supplied by the application.

#![deny(unsafe_code)]

pub mod governance;
pub mod result;
pub mod shared;
pub mod tick;

use autonomy_contracts::ports::Stage;
use autonomy_contracts::ConfigError;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the contracts crate for convenience.
pub use autonomy_contracts;

/// Re-export the audit crate for convenience.
pub use autonomy_audit;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced by the kernel.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// A stage port failed, or returned records that break the data-model
    /// invariants. The tick was aborted without side effects.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A governance config was rejected; the previous one stays active.
    #[error("invalid governance config: {0}")]
    Config(#[from] ConfigError),
}

impl KernelError {
    pub fn stage(stage: Stage, source: anyhow::Error) -> Self {
        KernelError::Stage {
            stage,
            source: source.into(),
        }
    }

    /// The failing stage, for stage failures.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            KernelError::Stage { stage, .. } => Some(*stage),
            KernelError::Config(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common kernel usage.
pub mod prelude {
    pub use autonomy_audit::prelude::*;
    pub use autonomy_contracts::prelude::*;

    pub use crate::governance::{judge, select_rule, GovernanceEngine};
    pub use crate::result::{OutcomeCounts, TickContents, TickResult, TickSummary};
    pub use crate::shared::SharedKernel;
    pub use crate::tick::{Kernel, KernelPorts, TickDiagnostics};
    pub use crate::KernelError;
}
