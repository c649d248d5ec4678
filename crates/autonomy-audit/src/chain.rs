//! The audit chain and its integrity check.
//!
//! [`AuditChain::append`] is the only way entries get into a chain and it
//! never touches earlier entries. [`verify`] is a pure function over a slice
//! of entries; it reports a break instead of raising one, so callers decide
//! what a broken chain means for them.

use serde::{Deserialize, Serialize};

use crate::entry::{content_digest, AuditEntry, GENESIS_HASH};
use crate::{AuditError, ChainIntegrityError};

// ---------------------------------------------------------------------------
// AuditChain
// ---------------------------------------------------------------------------

/// Append-only sequence of [`AuditEntry`] records.
///
/// Deserializing goes through [`AuditChain::from_entries`], so a broken
/// export fails to load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "ExportedChain")]
pub struct AuditChain {
    entries: Vec<AuditEntry>,
}

/// Wire form of an [`AuditChain`], before verification.
#[derive(Deserialize)]
struct ExportedChain {
    entries: Vec<AuditEntry>,
}

impl TryFrom<ExportedChain> for AuditChain {
    type Error = ChainIntegrityError;

    fn try_from(exported: ExportedChain) -> Result<Self, Self::Error> {
        AuditChain::from_entries(exported.entries)
    }
}

impl AuditChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Rebuild a chain from previously exported entries.
    ///
    /// The entries are verified first; a broken chain is refused.
    pub fn from_entries(entries: Vec<AuditEntry>) -> Result<Self, ChainIntegrityError> {
        verify(&entries).into_result()?;
        Ok(Self { entries })
    }

    /// Append the record of one tick.
    ///
    /// Digests `contents`, links the new entry to the current tail, and
    /// pushes it. Nothing is pushed if `contents` cannot be encoded.
    ///
    /// The caller is trusted to supply ticks that increase by exactly one;
    /// [`verify`] reports a [`BreakKind::SequenceGap`] otherwise.
    pub fn append<T: Serialize + ?Sized>(
        &mut self,
        tick: u64,
        timestamp_ms: u64,
        contents: &T,
    ) -> Result<AuditEntry, AuditError> {
        let entry = self.seal(tick, timestamp_ms, contents)?;
        self.commit(entry.clone())?;
        Ok(entry)
    }

    /// Build the entry that would follow the current tail, without pushing
    /// it.
    pub fn seal<T: Serialize + ?Sized>(
        &self,
        tick: u64,
        timestamp_ms: u64,
        contents: &T,
    ) -> Result<AuditEntry, AuditError> {
        let digest = content_digest(contents)?;
        Ok(AuditEntry::new(
            self.tail_hash().to_owned(),
            tick,
            timestamp_ms,
            digest,
        ))
    }

    /// Push an entry produced by [`seal`](Self::seal).
    ///
    /// # Errors
    ///
    /// [`AuditError::StaleEntry`] if the tail moved since the entry was
    /// sealed; the chain is left unchanged.
    pub fn commit(&mut self, entry: AuditEntry) -> Result<(), AuditError> {
        if entry.prev_hash != self.tail_hash() {
            return Err(AuditError::StaleEntry {
                tick: entry.tick,
                prev_hash: entry.prev_hash,
                tail_hash: self.tail_hash().to_owned(),
            });
        }
        tracing::debug!(
            tick = entry.tick,
            hash = %entry.hash,
            prev_hash = %entry.prev_hash,
            "audit entry appended"
        );
        self.entries.push(entry);
        Ok(())
    }

    /// Hash the next entry will link to.
    pub fn tail_hash(&self) -> &str {
        self.entries
            .last()
            .map(|e| e.hash.as_str())
            .unwrap_or(GENESIS_HASH)
    }

    pub fn last(&self) -> Option<&AuditEntry> {
        self.entries.last()
    }

    /// All entries in append order.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry recorded for `tick`, if any.
    pub fn entry_for_tick(&self, tick: u64) -> Option<&AuditEntry> {
        // Ticks are dense, so the position is usually `tick - first.tick`.
        let first = self.entries.first()?.tick;
        let idx = usize::try_from(tick.checked_sub(first)?).ok()?;
        self.entries
            .get(idx)
            .filter(|e| e.tick == tick)
            .or_else(|| self.entries.iter().find(|e| e.tick == tick))
    }

    /// Verify this chain. See [`verify`].
    pub fn verify(&self) -> ChainVerification {
        verify(&self.entries)
    }
}

// ---------------------------------------------------------------------------
// Verification results
// ---------------------------------------------------------------------------

/// How an entry failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    /// The first entry does not link to [`GENESIS_HASH`].
    GenesisMismatch,
    /// `prev_hash` differs from the predecessor's hash.
    LinkMismatch,
    /// The stored hash differs from the hash re-derived from the fields.
    HashMismatch,
    /// The tick does not follow the predecessor's, or `sequence != tick`.
    SequenceGap,
}

impl std::fmt::Display for BreakKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            BreakKind::GenesisMismatch => "first entry does not link to the genesis hash",
            BreakKind::LinkMismatch => "prev_hash does not match the previous entry's hash",
            BreakKind::HashMismatch => "stored hash does not match the entry's fields",
            BreakKind::SequenceGap => "tick sequence is not contiguous",
        };
        f.write_str(text)
    }
}

/// The first offending entry of a broken chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainBreak {
    /// Position of the entry in the verified slice.
    pub index: usize,
    /// Tick recorded in that entry.
    pub tick: u64,
    pub kind: BreakKind,
}

impl std::fmt::Display for ChainBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entry {} (tick {}): {}", self.index, self.tick, self.kind)
    }
}

/// Outcome of [`verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    /// Number of entries that passed before the first break (all of them
    /// for a valid chain).
    pub entries_checked: usize,
    pub first_break: Option<ChainBreak>,
}

impl ChainVerification {
    pub fn is_valid(&self) -> bool {
        self.first_break.is_none()
    }

    /// Turn a break into a [`ChainIntegrityError`].
    pub fn into_result(self) -> Result<(), ChainIntegrityError> {
        match self.first_break {
            None => Ok(()),
            Some(b) => Err(ChainIntegrityError(b)),
        }
    }
}

// ---------------------------------------------------------------------------
// verify()
// ---------------------------------------------------------------------------

/// Check every entry from genesis to tail.
///
/// For each entry, in order:
///
/// 1. `prev_hash` must equal [`GENESIS_HASH`] (first entry) or the previous
///    entry's hash.
/// 2. `sequence` must equal `tick`, and `tick` must be the previous entry's
///    tick plus one.
/// 3. The stored hash must equal the hash re-derived from the fields.
///
/// Stops at the first failure. An empty slice is valid.
pub fn verify(entries: &[AuditEntry]) -> ChainVerification {
    let mut expected_prev = GENESIS_HASH;

    for (index, entry) in entries.iter().enumerate() {
        let broken = |kind| ChainVerification {
            entries_checked: index,
            first_break: Some(ChainBreak {
                index,
                tick: entry.tick,
                kind,
            }),
        };

        if entry.prev_hash != expected_prev {
            let kind = if index == 0 {
                BreakKind::GenesisMismatch
            } else {
                BreakKind::LinkMismatch
            };
            return report(broken(kind));
        }

        let contiguous = match index.checked_sub(1).map(|i| &entries[i]) {
            Some(prev) => prev.tick.checked_add(1) == Some(entry.tick),
            None => true,
        };
        if entry.sequence != entry.tick || !contiguous {
            return report(broken(BreakKind::SequenceGap));
        }

        if !entry.is_self_consistent() {
            return report(broken(BreakKind::HashMismatch));
        }

        expected_prev = entry.hash.as_str();
    }

    ChainVerification {
        entries_checked: entries.len(),
        first_break: None,
    }
}

fn report(verification: ChainVerification) -> ChainVerification {
    if let Some(b) = &verification.first_break {
        tracing::warn!(
            index = b.index,
            tick = b.tick,
            kind = ?b.kind,
            "audit chain verification failed"
        );
    }
    verification
}

/// Whether `contents` digest to the value recorded in `entry`.
///
/// Lets a caller that retained a tick's full result check it against the
/// chain.
pub fn verify_contents<T: Serialize + ?Sized>(
    entry: &AuditEntry,
    contents: &T,
) -> Result<bool, AuditError> {
    Ok(content_digest(contents)? == entry.content_digest)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
