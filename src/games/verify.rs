//! Third-party verification of disclosed flips.
//!
//! Depends only on publicly disclosed values: anyone holding the seeds, the
//! nonce and the claimed digest/outcome can rerun this without engine state.

use crate::{
    errors::ValidationError,
    games::{
        engine::{FairOutcomeEngine, DIGEST_HEX_LEN},
        seed::SeedCommitment,
        types::{CoinSide, FlipRecord},
    },
};
use serde::{Deserialize, Serialize};

pub const DIGEST_MISMATCH: &str = "digest mismatch";
pub const OUTCOME_MISMATCH: &str = "outcome mismatch";
pub const COMMITMENT_MISMATCH: &str = "commitment mismatch";

/// Result of a verification run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Recomputed values, present whenever the inputs were well-formed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed_outcome: Option<CoinSide>,
}

impl Verification {
    fn valid(digest: String, outcome: CoinSide) -> Self {
        Self {
            valid: true,
            reason: None,
            computed_digest: Some(digest),
            computed_outcome: Some(outcome),
        }
    }

    fn mismatch(reason: &str, digest: String, outcome: CoinSide) -> Self {
        Self {
            valid: false,
            reason: Some(reason.to_string()),
            computed_digest: Some(digest),
            computed_outcome: Some(outcome),
        }
    }

    fn malformed(error: ValidationError) -> Self {
        Self {
            valid: false,
            reason: Some(error.to_string()),
            computed_digest: None,
            computed_outcome: None,
        }
    }
}

/// Parse a decimal nonce; only plain ASCII digits are accepted.
pub fn parse_nonce(raw: &str) -> Result<u64, ValidationError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidNonce(raw.to_string()));
    }
    raw.parse()
        .map_err(|_| ValidationError::InvalidNonce(raw.to_string()))
}

fn check_hex_digest(raw: &str, error: ValidationError) -> Result<(), ValidationError> {
    if raw.len() == DIGEST_HEX_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(error)
    }
}

/// Recompute digest and outcome from disclosed values and compare them to the claims.
///
/// The digest is compared by exact string equality, so an uppercase claim of a
/// correct digest is reported as a mismatch.
pub fn verify(
    server_seed: &str,
    player_seed: &str,
    nonce: &str,
    claimed_digest: &str,
    claimed_outcome: &str,
) -> Verification {
    let parsed = parse_nonce(nonce).and_then(|nonce| {
        let commitment = SeedCommitment::from_parts(server_seed, player_seed, nonce)?;
        check_hex_digest(claimed_digest, ValidationError::InvalidDigest)?;
        let outcome: CoinSide = claimed_outcome.parse()?;
        Ok((commitment, outcome))
    });

    match parsed {
        Ok((commitment, claimed)) => compare(&commitment, claimed_digest, claimed),
        Err(e) => {
            tracing::debug!("Rejected malformed verification input: {}", e);
            Verification::malformed(e)
        }
    }
}

/// Typed variant for callers that already hold parsed values
pub fn verify_parts(
    server_seed: &str,
    player_seed: &str,
    nonce: u64,
    claimed_digest: &str,
    claimed_outcome: CoinSide,
) -> Verification {
    let checked = SeedCommitment::from_parts(server_seed, player_seed, nonce).and_then(|c| {
        check_hex_digest(claimed_digest, ValidationError::InvalidDigest)?;
        Ok(c)
    });

    match checked {
        Ok(commitment) => compare(&commitment, claimed_digest, claimed_outcome),
        Err(e) => Verification::malformed(e),
    }
}

/// Re-verify a stored record against its own disclosed fields
pub fn verify_record(record: &FlipRecord) -> Verification {
    verify_parts(
        &record.server_seed,
        &record.player_seed,
        record.nonce,
        &record.digest,
        record.outcome,
    )
}

/// Check a revealed server seed against the hash published before the player seeded.
pub fn verify_commitment(server_seed: &str, server_seed_hash: &str) -> Verification {
    if server_seed.is_empty() {
        return Verification::malformed(ValidationError::EmptyServerSeed);
    }
    if let Err(e) = check_hex_digest(server_seed_hash, ValidationError::InvalidCommitment) {
        return Verification::malformed(e);
    }

    let computed = FairOutcomeEngine::digest_hex(server_seed);
    if computed == server_seed_hash {
        Verification {
            valid: true,
            reason: None,
            computed_digest: Some(computed),
            computed_outcome: None,
        }
    } else {
        Verification {
            valid: false,
            reason: Some(COMMITMENT_MISMATCH.to_string()),
            computed_digest: Some(computed),
            computed_outcome: None,
        }
    }
}

fn compare(commitment: &SeedCommitment, claimed_digest: &str, claimed: CoinSide) -> Verification {
    let (digest, outcome) = FairOutcomeEngine::derive(commitment);

    if digest != claimed_digest {
        return Verification::mismatch(DIGEST_MISMATCH, digest, outcome);
    }
    if outcome != claimed {
        return Verification::mismatch(OUTCOME_MISMATCH, digest, outcome);
    }
    Verification::valid(digest, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "2b1cf05b7055434ee54a65691e13dc8cf7f03984607f88b37320894076b99441";

    #[test]
    fn test_golden_vector_verifies() {
        let result = verify("abc123de", "xyz789fg", "0", DIGEST, "TAILS");
        assert!(result.valid, "{:?}", result.reason);
        assert_eq!(result.computed_outcome, Some(CoinSide::Tails));
    }

    #[test]
    fn test_wrong_outcome_is_reported() {
        let digest = "a65a0f6a48985eadb95df86fa7017d58341122e301336ff8c69cd9f6aaf02561";
        let result = verify("abc123de", "xyz789fg", "1", digest, "TAILS");
        assert!(!result.valid);
        assert_eq!(result.reason.as_deref(), Some(OUTCOME_MISMATCH));
    }

    #[test]
    fn test_wrong_digest_is_reported() {
        let mut digest = DIGEST.to_string();
        digest.replace_range(63..64, "0");
        let result = verify("abc123de", "xyz789fg", "0", &digest, "TAILS");
        assert_eq!(result.reason.as_deref(), Some(DIGEST_MISMATCH));
    }

    #[test]
    fn test_uppercase_digest_is_not_equal() {
        let mixed: String = DIGEST
            .char_indices()
            .map(|(i, c)| if i % 2 == 0 { c.to_ascii_uppercase() } else { c })
            .collect();

        for claimed in [DIGEST.to_uppercase(), mixed] {
            let result = verify("abc123de", "xyz789fg", "0", &claimed, "TAILS");
            assert!(!result.valid);
            assert_eq!(result.reason.as_deref(), Some(DIGEST_MISMATCH));
            // Well-formed, so the recomputed values are still reported
            assert_eq!(result.computed_digest.as_deref(), Some(DIGEST));
        }
    }

    #[test]
    fn test_malformed_inputs() {
        let non_hex = DIGEST.replace('b', "g");
        for (server, player, nonce, digest, outcome) in [
            ("", "xyz789fg", "0", DIGEST, "TAILS"),
            ("abc123de", "", "0", DIGEST, "TAILS"),
            ("abc123de", "xyz789fg", "-1", DIGEST, "TAILS"),
            ("abc123de", "xyz789fg", "1.5", DIGEST, "TAILS"),
            ("abc123de", "xyz789fg", "", DIGEST, "TAILS"),
            ("abc123de", "xyz789fg", " 0", DIGEST, "TAILS"),
            ("abc123de", "xyz789fg", "0", "2b1c", "TAILS"),
            ("abc123de", "xyz789fg", "0", non_hex.as_str(), "TAILS"),
            ("abc123de", "xyz789fg", "0", DIGEST, "EDGE"),
        ] {
            let result = verify(server, player, nonce, digest, outcome);
            assert!(!result.valid);
            assert!(result.computed_digest.is_none());
            assert!(result.reason.is_some());
        }
    }

    #[test]
    fn test_parse_nonce() {
        assert_eq!(parse_nonce("0").unwrap(), 0);
        assert_eq!(parse_nonce("18446744073709551615").unwrap(), u64::MAX);
        assert!(parse_nonce("18446744073709551616").is_err());
        assert!(parse_nonce("+3").is_err());
    }

    #[test]
    fn test_commitment_check() {
        let seed = "00112233445566778899aabbccddeeff";
        let hash = "5947d7c33d783f94b3b4c1a96ebc8991ed28f1b069b71e03376cba8caa98a720";
        assert!(verify_commitment(seed, hash).valid);

        let result = verify_commitment("00112233445566778899aabbccddeefe", hash);
        assert_eq!(result.reason.as_deref(), Some(COMMITMENT_MISMATCH));
        assert!(!verify_commitment(seed, "nothex").valid);
    }
}
