//! Per-sequence nonce counters.
//!
//! Each sequence allows at most one un-finalized flip. A nonce is reserved
//! with `begin`, published in the server commitment, and only `finalize`d if
//! it equals `last_finalized + 1` (or 0 for a fresh sequence).

use crate::errors::SequenceError;
use dashmap::DashMap;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlipSequence {
    next_nonce: u64,
    in_flight: Option<u64>,
}

impl FlipSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nonce the next flip will use
    pub fn next_nonce(&self) -> u64 {
        self.next_nonce
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    pub fn last_finalized(&self) -> Option<u64> {
        self.next_nonce.checked_sub(1)
    }

    /// Reserve the next nonce for a new flip
    pub fn begin(&mut self) -> Result<u64, SequenceError> {
        if let Some(in_flight) = self.in_flight {
            return Err(SequenceError::FlipInFlight { in_flight });
        }
        self.in_flight = Some(self.next_nonce);
        Ok(self.next_nonce)
    }

    /// Mark the reserved flip as completed and advance the counter
    pub fn finalize(&mut self, nonce: u64) -> Result<(), SequenceError> {
        if nonce < self.next_nonce {
            return Err(SequenceError::NonceReused { nonce });
        }
        if nonce != self.next_nonce {
            return Err(SequenceError::OutOfOrder {
                expected: self.next_nonce,
                actual: nonce,
            });
        }
        if self.in_flight != Some(nonce) {
            return Err(SequenceError::NotReserved { nonce });
        }

        self.next_nonce = nonce.checked_add(1).ok_or(SequenceError::Exhausted)?;
        self.in_flight = None;
        Ok(())
    }

    /// Release a reservation without advancing; the nonce is handed out again.
    pub fn abort(&mut self, nonce: u64) -> Result<(), SequenceError> {
        if self.in_flight != Some(nonce) {
            return Err(SequenceError::NotReserved { nonce });
        }
        self.in_flight = None;
        Ok(())
    }
}

/// Sequences keyed by owner.
///
/// DashMap entry guards give each sequence a single writer without a
/// process-wide lock.
#[derive(Debug, Default)]
pub struct SequenceRegistry {
    sequences: DashMap<String, FlipSequence>,
}

impl SequenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, key: &str) -> Result<u64, SequenceError> {
        self.sequences.entry(key.to_string()).or_default().begin()
    }

    pub fn finalize(&self, key: &str, nonce: u64) -> Result<(), SequenceError> {
        match self.sequences.get_mut(key) {
            Some(mut sequence) => sequence.finalize(nonce),
            None => Err(SequenceError::NotReserved { nonce }),
        }
    }

    pub fn abort(&self, key: &str, nonce: u64) -> Result<(), SequenceError> {
        match self.sequences.get_mut(key) {
            Some(mut sequence) => sequence.abort(nonce),
            None => Err(SequenceError::NotReserved { nonce }),
        }
    }

    pub fn snapshot(&self, key: &str) -> FlipSequence {
        self.sequences
            .get(key)
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}
