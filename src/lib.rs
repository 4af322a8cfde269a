//! FairFlip - provably fair coin flips
//!
//! Commit-reveal coin flips between two players. The outcome is the parity of
//! the first byte of `SHA-256(server_seed || player_seed || nonce)`, and every
//! finished flip can be re-verified by anyone from its disclosed values.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod games;
pub mod ledger;

pub use config::FairFlipConfig;
pub use errors::{FairFlipError, FairFlipResult};
pub use games::{CoinSide, FairOutcomeEngine, FlipRecord, GameProcessor, Verification};
