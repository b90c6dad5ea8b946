//! Human-readable document numbers: `PREFIX-YYYYMMDD-NNNN`.
//!
//! Numbers are display identifiers, not keys; documents are keyed by UUID.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tradeflow_core::{Clock, DocumentType};

pub const DEFAULT_SEQUENCE_MODULUS: u32 = 10_000;

/// Source of the bounded sequence part of a document number.
pub trait SequenceSource: Send + Sync {
    /// Next value in `0..modulus`.
    fn next_sequence(&self) -> u32;
}

/// Process-wide atomic counter.
///
/// Assumes a single writer process; resume from a persisted value with
/// [`AtomicSequence::starting_at`] after a restart. Values repeat only after
/// `modulus` allocations.
#[derive(Debug)]
pub struct AtomicSequence {
    next: AtomicU64,
    modulus: u32,
}

impl AtomicSequence {
    pub fn new(modulus: u32) -> Self {
        Self::starting_at(1, modulus)
    }

    pub fn starting_at(start: u64, modulus: u32) -> Self {
        Self {
            next: AtomicU64::new(start),
            modulus: modulus.max(1),
        }
    }
}

impl Default for AtomicSequence {
    fn default() -> Self {
        Self::new(DEFAULT_SEQUENCE_MODULUS)
    }
}

impl SequenceSource for AtomicSequence {
    fn next_sequence(&self) -> u32 {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        (n % u64::from(self.modulus)) as u32
    }
}

/// Legacy scheme: clock seconds modulo the range.
///
/// Two numbers allocated within the same second collide; kept for
/// compatibility with numbers issued by older deployments.
pub struct TimeSequence {
    clock: Arc<dyn Clock>,
    modulus: u32,
}

impl TimeSequence {
    pub fn new(clock: Arc<dyn Clock>, modulus: u32) -> Self {
        Self {
            clock,
            modulus: modulus.max(1),
        }
    }
}

impl SequenceSource for TimeSequence {
    fn next_sequence(&self) -> u32 {
        self.clock
            .now()
            .timestamp()
            .rem_euclid(i64::from(self.modulus)) as u32
    }
}

/// Formats document numbers from a clock and a sequence source.
#[derive(Clone)]
pub struct DocumentNumberer {
    sequence: Arc<dyn SequenceSource>,
    clock: Arc<dyn Clock>,
}

impl DocumentNumberer {
    pub fn new(sequence: Arc<dyn SequenceSource>, clock: Arc<dyn Clock>) -> Self {
        Self { sequence, clock }
    }

    pub fn next_number(&self, document_type: DocumentType) -> String {
        let seq = self.sequence.next_sequence();
        format!(
            "{}-{}-{:04}",
            document_type.number_prefix(),
            self.clock.today().format("%Y%m%d"),
            seq
        )
    }
}

impl core::fmt::Debug for DocumentNumberer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DocumentNumberer").finish_non_exhaustive()
    }
}
