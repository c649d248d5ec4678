//! A cloneable, thread-safe handle to a [`Kernel`].
//!
//! Several callers (an operator console and a background driver, say) may
//! want to run ticks or swap configs on the same kernel. Every entry point
//! here takes the kernel's mutex for its full duration, so ticks never
//! interleave and the audit chain only ever sees one writer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use autonomy_audit::{AuditChain, ChainVerification};
use autonomy_contracts::prelude::*;

use crate::result::TickResult;
use crate::tick::Kernel;
use crate::KernelError;

#[derive(Debug, Clone)]
pub struct SharedKernel {
    inner: Arc<Mutex<Kernel>>,
}

impl SharedKernel {
    pub fn new(kernel: Kernel) -> Self {
        Self {
            inner: Arc::new(Mutex::new(kernel)),
        }
    }

    pub fn run_tick(&self) -> Result<TickResult, KernelError> {
        self.lock().run_tick()
    }

    pub fn set_governance_config(&self, config: GovernanceConfig) -> Result<(), KernelError> {
        self.lock().set_governance_config(config)
    }

    pub fn tick_count(&self) -> Tick {
        self.lock().tick_count()
    }

    /// Snapshot of the audit chain at this instant.
    pub fn audit_chain(&self) -> AuditChain {
        self.lock().audit_chain().clone()
    }

    pub fn verify_audit_chain(&self) -> ChainVerification {
        self.lock().verify_audit_chain()
    }

    /// Run `f` with exclusive access to the kernel.
    pub fn with_kernel<R>(&self, f: impl FnOnce(&mut Kernel) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Kernel> {
        // Ports run and the audit entry is sealed before any kernel state
        // changes, and the commit step after the push only moves values,
        // so the kernel behind a poisoned lock is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
