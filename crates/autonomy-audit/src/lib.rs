//! Autonomy Audit -- append-only, hash-linked record of every kernel tick.
//!
//! Each [`AuditEntry`] binds the hash of its predecessor (or
//! [`GENESIS_HASH`] for the first entry), its tick, its timestamp, and a
//! BLAKE3 digest of the tick's full contents. Altering any stored field
//! after the fact breaks either the entry's own hash or the link from its
//! successor, and [`verify`] reports the first entry where that happens.
//!
//! The chain detects tampering; it does not prove who wrote an entry.
//!
//! # Example
//!
//! ```
//! use autonomy_audit::prelude::*;
//!
//! let mut chain = AuditChain::new();
//! chain.append(0, 1_000, &serde_json::json!({"risk": 12.5})).unwrap();
//! chain.append(1, 2_000, &serde_json::json!({"risk": 48.0})).unwrap();
//!
//! assert_eq!(chain.entries()[0].prev_hash, GENESIS_HASH);
//! assert_eq!(chain.entries()[1].prev_hash, chain.entries()[0].hash);
//! assert!(verify(chain.entries()).is_valid());
//! ```

#![deny(unsafe_code)]

pub mod chain;
pub mod entry;

pub use chain::{verify, verify_contents, AuditChain, BreakKind, ChainBreak, ChainVerification};
pub use entry::{content_digest, AuditEntry, GENESIS_HASH};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while sealing or appending entries.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The tick contents could not be encoded for hashing.
    #[error("failed to encode tick contents for the audit digest: {0}")]
    Encode(#[from] serde_json::Error),

    /// A sealed entry no longer links to the chain tail.
    #[error("entry for tick {tick} links to {prev_hash}, but the chain tail is {tail_hash}")]
    StaleEntry {
        tick: u64,
        prev_hash: String,
        tail_hash: String,
    },
}

/// A verified chain turned out to be broken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("audit chain integrity violated: {0}")]
pub struct ChainIntegrityError(pub ChainBreak);

impl ChainIntegrityError {
    /// Index of the first offending entry.
    pub fn index(&self) -> usize {
        self.0.index
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::chain::{
        verify, verify_contents, AuditChain, BreakKind, ChainBreak, ChainVerification,
    };
    pub use crate::entry::{content_digest, AuditEntry, GENESIS_HASH};
    pub use crate::{AuditError, ChainIntegrityError};
}
