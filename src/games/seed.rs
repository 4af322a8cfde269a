//! Seed material for a single flip.

use crate::errors::ValidationError;
use rand_core::{OsRng, RngCore};
use serde::Serialize;

/// Bytes of OS randomness per seed (128 bits, 32 hex chars)
pub const SEED_BYTES: usize = 16;

/// Draw a fresh hex-encoded seed from the OS CSPRNG
pub fn random_seed() -> String {
    let mut bytes = [0u8; SEED_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// The `(server_seed, player_seed, nonce)` triple a flip is computed from
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SeedCommitment {
    server_seed: String,
    player_seed: String,
    nonce: u64,
}

impl SeedCommitment {
    /// Fresh seeds for both parties at the given sequence position
    pub fn generate(nonce: u64) -> Self {
        Self {
            server_seed: random_seed(),
            player_seed: random_seed(),
            nonce,
        }
    }

    /// Build from seeds contributed elsewhere (e.g. a player-supplied seed)
    pub fn from_parts(
        server_seed: impl Into<String>,
        player_seed: impl Into<String>,
        nonce: u64,
    ) -> Result<Self, ValidationError> {
        let server_seed = server_seed.into();
        let player_seed = player_seed.into();

        if server_seed.is_empty() {
            return Err(ValidationError::EmptyServerSeed);
        }
        if player_seed.is_empty() {
            return Err(ValidationError::EmptyPlayerSeed);
        }

        Ok(Self {
            server_seed,
            player_seed,
            nonce,
        })
    }

    pub fn server_seed(&self) -> &str {
        &self.server_seed
    }

    pub fn player_seed(&self) -> &str {
        &self.player_seed
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Hash input: server seed, player seed, decimal nonce, no separators
    pub fn hash_input(&self) -> String {
        compose_hash_input(&self.server_seed, &self.player_seed, self.nonce)
    }

    pub(crate) fn into_parts(self) -> (String, String, u64) {
        (self.server_seed, self.player_seed, self.nonce)
    }
}

impl std::fmt::Debug for SeedCommitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedCommitment")
            .field("server_seed", &"<hidden>")
            .field("player_seed", &self.player_seed)
            .field("nonce", &self.nonce)
            .finish()
    }
}

pub(crate) fn compose_hash_input(server_seed: &str, player_seed: &str, nonce: u64) -> String {
    let mut input = String::with_capacity(server_seed.len() + player_seed.len() + 20);
    input.push_str(server_seed);
    input.push_str(player_seed);
    input.push_str(&nonce.to_string());
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_width() {
        let seed = random_seed();
        assert_eq!(seed.len(), SEED_BYTES * 2);
        assert!(seed.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generate_draws_independent_seeds() {
        let commitment = SeedCommitment::generate(7);
        assert_ne!(commitment.server_seed(), commitment.player_seed());
        assert_eq!(commitment.nonce(), 7);

        let other = SeedCommitment::generate(7);
        assert_ne!(commitment.server_seed(), other.server_seed());
    }

    #[test]
    fn test_hash_input_order() {
        let commitment = SeedCommitment::from_parts("abc123de", "xyz789fg", 0).unwrap();
        assert_eq!(commitment.hash_input(), "abc123dexyz789fg0");

        let commitment = SeedCommitment::from_parts("a", "b", 1234).unwrap();
        assert_eq!(commitment.hash_input(), "ab1234");
    }

    #[test]
    fn test_from_parts_rejects_empty_seeds() {
        assert_eq!(
            SeedCommitment::from_parts("", "p", 0).unwrap_err(),
            ValidationError::EmptyServerSeed
        );
        assert_eq!(
            SeedCommitment::from_parts("s", "", 0).unwrap_err(),
            ValidationError::EmptyPlayerSeed
        );
    }

    #[test]
    fn test_debug_hides_server_seed() {
        let commitment = SeedCommitment::from_parts("topsecret", "visible", 3).unwrap();
        let printed = format!("{:?}", commitment);
        assert!(!printed.contains("topsecret"));
        assert!(printed.contains("visible"));
    }
}
