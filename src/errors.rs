//! Error types for the fairflip service
//!
//! One enum per concern, rolled up into [`FairFlipError`]. Everything except
//! [`FairFlipError::PrimitiveUnavailable`] is local and recoverable by the caller.

use crate::games::commit_reveal::Phase;
use thiserror::Error;

/// Root error type for all fairflip operations
#[derive(Debug, Error)]
pub enum FairFlipError {
    /// Caller supplied missing or malformed values
    #[error("malformed input: {0}")]
    MalformedInput(#[from] ValidationError),

    /// The hash primitive failed its known-answer check; fatal at startup
    #[error("hash primitive unavailable: {0}")]
    PrimitiveUnavailable(String),

    /// Nonce reuse, out-of-order finalize or a concurrent flip on one sequence
    #[error("sequence misuse: {0}")]
    SequenceMisuse(#[from] SequenceError),

    /// Commit-reveal step attempted out of order
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("room error: {0}")]
    Room(#[from] RoomError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("auth error: {0}")]
    Auth(#[from] crate::auth::AuthError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FairFlipError {
    /// Only a broken hash primitive is fatal; everything else is per-request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FairFlipError::PrimitiveUnavailable(_))
    }
}

/// Input validation failures (the MalformedInput class)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server seed is empty")]
    EmptyServerSeed,

    #[error("player seed is empty")]
    EmptyPlayerSeed,

    #[error("nonce must be a non-negative integer, got '{0}'")]
    InvalidNonce(String),

    #[error("digest must be 64 hex characters")]
    InvalidDigest,

    #[error("commitment must be 64 hex characters")]
    InvalidCommitment,

    #[error("outcome must be HEADS or TAILS, got '{0}'")]
    InvalidOutcome(String),

    #[error("bet must be between 1 and {max}, got {actual}")]
    InvalidBet { actual: u64, max: u64 },
}

/// Violations of the per-sequence nonce discipline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("flip with nonce {in_flight} is still in flight")]
    FlipInFlight { in_flight: u64 },

    #[error("nonce {nonce} was already finalized")]
    NonceReused { nonce: u64 },

    #[error("out-of-order nonce: expected {expected}, got {actual}")]
    OutOfOrder { expected: u64, actual: u64 },

    #[error("nonce {nonce} was never reserved")]
    NotReserved { nonce: u64 },

    #[error("nonce space exhausted")]
    Exhausted,
}

/// Commit-reveal state machine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("expected phase {expected}, session is {actual}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("revealed server seed does not match its commitment")]
    CommitmentMismatch,
}

/// Match room errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    NotFound(u32),

    #[error("{user} is not a participant of room {room}")]
    NotParticipant { room: u32, user: String },

    #[error("room {0} already has an opponent")]
    RoomFull(u32),

    #[error("cannot join your own room {0}")]
    OwnRoom(u32),

    #[error("room {0} is waiting for an opponent")]
    NotReady(u32),

    #[error("only the creator can cancel room {0}")]
    NotCreator(u32),

    #[error("no free room ids")]
    IdsExhausted,
}

/// Points ledger errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient points: needed {needed}, available {available}")]
    InsufficientPoints { needed: u64, available: u64 },

    #[error("balance overflow for {0}")]
    Overflow(String),
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("missing required field: {0}")]
    MissingRequired(String),
}

/// Convenience type alias for Results
pub type FairFlipResult<T> = Result<T, FairFlipError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err: FairFlipError = ValidationError::EmptyServerSeed.into();
        assert!(err.to_string().contains("malformed input"));
        assert!(err.to_string().contains("server seed is empty"));
    }

    #[test]
    fn test_sequence_error_details() {
        let err = SequenceError::OutOfOrder {
            expected: 5,
            actual: 3,
        };

        assert!(err.to_string().contains("expected 5"));
        assert!(err.to_string().contains("got 3"));
    }

    #[test]
    fn test_only_primitive_failure_is_fatal() {
        assert!(FairFlipError::PrimitiveUnavailable("kat".into()).is_fatal());
        assert!(!FairFlipError::from(SequenceError::Exhausted).is_fatal());
        assert!(!FairFlipError::from(RoomError::NotFound(1234)).is_fatal());
    }

    #[test]
    fn test_error_source() {
        let err: FairFlipError = LedgerError::Overflow("alice".into()).into();
        assert!(err.source().is_some());
    }
}
