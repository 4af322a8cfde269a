use crate::{
    errors::{FairFlipError, FairFlipResult, ValidationError},
    games::{
        seed::SeedCommitment,
        types::{CoinSide, FlipRecord, MatchDetails},
    },
};
use chrono::Utc;
use sha2::{Digest, Sha256};

/// Known-answer vector checked before the engine is handed out
const KAT_INPUT: &str = "abc123dexyz789fg0";
const KAT_DIGEST: &str = "2b1cf05b7055434ee54a65691e13dc8cf7f03984607f88b37320894076b99441";

/// Hex length of a SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Derives coin outcomes from seed commitments.
///
/// Stateless apart from the startup self test: every method is a pure function
/// of its inputs, so one engine can be shared across concurrent flips.
#[derive(Debug, Clone)]
pub struct FairOutcomeEngine {
    _checked: (),
}

impl FairOutcomeEngine {
    /// Run the SHA-256 known-answer test and return an engine.
    ///
    /// A failure here is a configuration error, never a per-flip one.
    pub fn new() -> FairFlipResult<Self> {
        let digest = Self::digest_hex(KAT_INPUT);
        if digest != KAT_DIGEST {
            return Err(FairFlipError::PrimitiveUnavailable(format!(
                "SHA-256 known-answer test failed: got {}",
                digest
            )));
        }

        tracing::debug!("SHA-256 known-answer test passed");
        Ok(Self { _checked: () })
    }

    /// Lowercase hex SHA-256 of the UTF-8 input
    pub fn digest_hex(input: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Even first byte is HEADS, odd is TAILS
    pub fn outcome_for_first_byte(first_byte: u8) -> CoinSide {
        if first_byte % 2 == 0 {
            CoinSide::Heads
        } else {
            CoinSide::Tails
        }
    }

    /// Map a hex digest to its outcome using the first two hex characters
    pub fn outcome_from_digest(digest_hex: &str) -> Result<CoinSide, ValidationError> {
        let first = digest_hex.get(..2).ok_or(ValidationError::InvalidDigest)?;
        let byte = u8::from_str_radix(first, 16).map_err(|_| ValidationError::InvalidDigest)?;
        Ok(Self::outcome_for_first_byte(byte))
    }

    /// Digest and outcome for a commitment
    pub fn derive(commitment: &SeedCommitment) -> (String, CoinSide) {
        let mut hasher = Sha256::new();
        hasher.update(commitment.hash_input().as_bytes());
        let digest = hasher.finalize();

        let outcome = Self::outcome_for_first_byte(digest[0]);
        (hex::encode(digest), outcome)
    }

    /// Produce the verifiable record for one flip.
    ///
    /// Advancing the sequence nonce is left to the caller, after this returns.
    pub fn compute_outcome(
        &self,
        match_id: impl Into<String>,
        commitment: SeedCommitment,
        details: Option<MatchDetails>,
    ) -> FlipRecord {
        let (digest, outcome) = Self::derive(&commitment);
        let (server_seed, player_seed, nonce) = commitment.into_parts();

        FlipRecord {
            match_id: match_id.into(),
            server_seed,
            player_seed,
            nonce,
            digest,
            outcome,
            created_at: Utc::now(),
            details,
        }
    }
}
