//! Two-phase commit-reveal session for a single flip.
//!
//! The server publishes `SHA-256(server_seed)` and the nonce first, the player
//! contributes a seed second, and only then is the server seed revealed and
//! the outcome computed: `Committed -> PlayerSeeded -> Revealed`.

use crate::{
    errors::{FairFlipResult, ProtocolError, ValidationError},
    games::{
        engine::FairOutcomeEngine,
        seed::{random_seed, SeedCommitment},
        types::{FlipRecord, MatchDetails},
    },
};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Committed,
    PlayerSeeded,
    Revealed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Committed => write!(f, "committed"),
            Phase::PlayerSeeded => write!(f, "player_seeded"),
            Phase::Revealed => write!(f, "revealed"),
        }
    }
}

/// What the server publishes before the player picks a seed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCommitment {
    pub match_id: String,
    pub server_seed_hash: String,
    pub nonce: u64,
}

enum SessionState {
    Committed { server_seed: String },
    PlayerSeeded { server_seed: String, player_seed: String },
    Revealed { record: Arc<FlipRecord> },
}

impl SessionState {
    fn phase(&self) -> Phase {
        match self {
            SessionState::Committed { .. } => Phase::Committed,
            SessionState::PlayerSeeded { .. } => Phase::PlayerSeeded,
            SessionState::Revealed { .. } => Phase::Revealed,
        }
    }
}

pub struct CommitRevealSession {
    match_id: String,
    nonce: u64,
    server_seed_hash: String,
    state: SessionState,
}

impl CommitRevealSession {
    /// Draw a server seed and commit to it at `nonce`
    pub fn commit(match_id: impl Into<String>, nonce: u64) -> Self {
        Self::committed(match_id.into(), random_seed(), nonce)
    }

    /// Commit to a caller-chosen server seed
    pub fn commit_with_seed(
        match_id: impl Into<String>,
        server_seed: impl Into<String>,
        nonce: u64,
    ) -> Result<Self, ValidationError> {
        let server_seed = server_seed.into();
        if server_seed.is_empty() {
            return Err(ValidationError::EmptyServerSeed);
        }

        Ok(Self::committed(match_id.into(), server_seed, nonce))
    }

    fn committed(match_id: String, server_seed: String, nonce: u64) -> Self {
        Self {
            match_id,
            nonce,
            server_seed_hash: FairOutcomeEngine::digest_hex(&server_seed),
            state: SessionState::Committed { server_seed },
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    pub fn commitment(&self) -> ServerCommitment {
        ServerCommitment {
            match_id: self.match_id.clone(),
            server_seed_hash: self.server_seed_hash.clone(),
            nonce: self.nonce,
        }
    }

    /// `Committed -> PlayerSeeded`
    pub fn accept_player_seed(&mut self, player_seed: impl Into<String>) -> FairFlipResult<()> {
        let player_seed = player_seed.into();
        if player_seed.is_empty() {
            return Err(ValidationError::EmptyPlayerSeed.into());
        }

        match std::mem::replace(&mut self.state, SessionState::Committed { server_seed: String::new() }) {
            SessionState::Committed { server_seed } => {
                self.state = SessionState::PlayerSeeded {
                    server_seed,
                    player_seed,
                };
                Ok(())
            }
            other => {
                let actual = other.phase();
                self.state = other;
                Err(ProtocolError::WrongPhase {
                    expected: Phase::Committed,
                    actual,
                }
                .into())
            }
        }
    }

    /// `PlayerSeeded -> Revealed`: disclose the server seed and compute the record.
    pub fn reveal(
        &mut self,
        engine: &FairOutcomeEngine,
        details: Option<MatchDetails>,
    ) -> FairFlipResult<Arc<FlipRecord>> {
        let (server_seed, player_seed) = match &self.state {
            SessionState::PlayerSeeded {
                server_seed,
                player_seed,
            } => (server_seed.clone(), player_seed.clone()),
            other => {
                return Err(ProtocolError::WrongPhase {
                    expected: Phase::PlayerSeeded,
                    actual: other.phase(),
                }
                .into())
            }
        };

        if FairOutcomeEngine::digest_hex(&server_seed) != self.server_seed_hash {
            return Err(ProtocolError::CommitmentMismatch.into());
        }

        let commitment = SeedCommitment::from_parts(server_seed, player_seed, self.nonce)?;
        let record = Arc::new(engine.compute_outcome(self.match_id.clone(), commitment, details));
        self.state = SessionState::Revealed {
            record: record.clone(),
        };

        Ok(record)
    }

    pub fn record(&self) -> Option<Arc<FlipRecord>> {
        match &self.state {
            SessionState::Revealed { record } => Some(record.clone()),
            _ => None,
        }
    }
}

impl fmt::Debug for CommitRevealSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitRevealSession")
            .field("match_id", &self.match_id)
            .field("nonce", &self.nonce)
            .field("server_seed_hash", &self.server_seed_hash)
            .field("phase", &self.phase())
            .finish()
    }
}
