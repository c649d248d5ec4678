//! Audit entries and the hashing that links them.
//!
//! Two digests are involved:
//!
//! - The **content digest** is BLAKE3 over the `serde_json` encoding of a
//!   tick's contents. Contents should use ordered maps (`BTreeMap`) so the
//!   encoding, and therefore the digest, is canonical.
//! - The **entry hash** is BLAKE3 over the entry's own fields
//!   (`prev_hash`, `sequence`, `tick`, `timestamp_ms`, `content_digest`).
//!   Each field is framed with a length prefix so no two distinct field
//!   tuples encode to the same byte stream.

use serde::{Deserialize, Serialize};

use crate::AuditError;

/// `prev_hash` of the first entry in every chain: 64 zero hex digits.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Domain separator mixed into every entry hash.
const ENTRY_DOMAIN: &[u8] = b"autonomy-audit/entry/v1";

// ---------------------------------------------------------------------------
// AuditEntry
// ---------------------------------------------------------------------------

/// One link of the audit chain, summarising one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the chain. Always equal to `tick`.
    pub sequence: u64,
    pub tick: u64,
    pub timestamp_ms: u64,
    /// Hash of the previous entry, or [`GENESIS_HASH`].
    pub prev_hash: String,
    /// BLAKE3 hex digest of the tick's contents.
    pub content_digest: String,
    /// BLAKE3 hex digest of the fields above.
    pub hash: String,
}

impl AuditEntry {
    /// Build an entry, deriving its hash from the other fields.
    pub fn new(prev_hash: String, tick: u64, timestamp_ms: u64, content_digest: String) -> Self {
        let hash = entry_hash(&prev_hash, tick, tick, timestamp_ms, &content_digest);
        Self {
            sequence: tick,
            tick,
            timestamp_ms,
            prev_hash,
            content_digest,
            hash,
        }
    }

    /// Re-derive this entry's hash from its stored fields.
    pub fn compute_hash(&self) -> String {
        entry_hash(
            &self.prev_hash,
            self.sequence,
            self.tick,
            self.timestamp_ms,
            &self.content_digest,
        )
    }

    /// Whether the stored hash matches the fields.
    pub fn is_self_consistent(&self) -> bool {
        self.compute_hash() == self.hash
    }

    pub fn is_genesis_linked(&self) -> bool {
        self.prev_hash == GENESIS_HASH
    }
}

// ---------------------------------------------------------------------------
// Hashing helpers
// ---------------------------------------------------------------------------

/// BLAKE3 hex digest (64 lowercase hex chars) of the JSON encoding of
/// `contents`.
pub fn content_digest<T: Serialize + ?Sized>(contents: &T) -> Result<String, AuditError> {
    let json_bytes = serde_json::to_vec(contents)?;
    Ok(blake3::hash(&json_bytes).to_hex().to_string())
}

fn entry_hash(
    prev_hash: &str,
    sequence: u64,
    tick: u64,
    timestamp_ms: u64,
    content_digest: &str,
) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(ENTRY_DOMAIN);
    update_framed(&mut hasher, prev_hash.as_bytes());
    hasher.update(&sequence.to_le_bytes());
    hasher.update(&tick.to_le_bytes());
    hasher.update(&timestamp_ms.to_le_bytes());
    update_framed(&mut hasher, content_digest.as_bytes());
    hasher.finalize().to_hex().to_string()
}

fn update_framed(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
