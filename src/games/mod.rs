//! Coin-flip game core: outcome engine, commit-reveal sessions, nonce
//! sequences, match rooms and the archive of finished flips.

pub mod archive;
pub mod commit_reveal;
pub mod engine;
pub mod processor;
pub mod rooms;
pub mod seed;
pub mod sequence;
pub mod types;
pub mod verify;

pub use archive::{ArchiveEntry, FlipArchive};
pub use commit_reveal::{CommitRevealSession, Phase, ServerCommitment};
pub use engine::FairOutcomeEngine;
pub use processor::GameProcessor;
pub use rooms::{RoomRegistry, RoomSummary};
pub use seed::SeedCommitment;
pub use sequence::{FlipSequence, SequenceRegistry};
pub use types::{CoinSide, FlipRecord, MatchDetails};
pub use verify::{verify, Verification};
