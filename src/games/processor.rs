//! Match orchestration.
//!
//! Ties rooms to the commit-reveal sessions, nonce sequences, points ledger
//! and archive. Each room's handle is locked for the whole of a state change,
//! so a room runs at most one flip and a creator's sequence has a single writer.

use crate::{
    config::GameSettings,
    errors::{FairFlipResult, RoomError, ValidationError},
    games::{
        archive::{ArchiveEntry, FlipArchive},
        commit_reveal::{CommitRevealSession, ServerCommitment},
        engine::FairOutcomeEngine,
        rooms::{RoomRegistry, RoomSummary},
        seed::random_seed,
        sequence::{FlipSequence, SequenceRegistry},
        types::{CoinSide, FlipRecord},
    },
    ledger::{AccountSnapshot, PointsLedger},
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};

/// Room state plus the caller's balance after the step
#[derive(Debug, Clone, Serialize)]
pub struct RoomTicket {
    pub room: RoomSummary,
    pub balance: u64,
}

/// Commitment handed to both players when a room fills
#[derive(Debug, Clone, Serialize)]
pub struct JoinReceipt {
    pub room: RoomSummary,
    pub commitment: ServerCommitment,
    pub balance: u64,
}

pub struct GameProcessor {
    engine: FairOutcomeEngine,
    rooms: RoomRegistry,
    sequences: SequenceRegistry,
    ledger: PointsLedger,
    archive: Arc<FlipArchive>,
    max_bet: u64,
}

impl GameProcessor {
    /// Fails only if the hash primitive does not pass its self test
    pub fn new(settings: &GameSettings, archive_retention: Duration) -> FairFlipResult<Self> {
        Ok(Self {
            engine: FairOutcomeEngine::new()?,
            rooms: RoomRegistry::new(),
            sequences: SequenceRegistry::new(),
            ledger: PointsLedger::new(settings.starting_balance),
            archive: Arc::new(FlipArchive::new(archive_retention)),
            max_bet: settings.max_bet,
        })
    }

    pub fn engine(&self) -> &FairOutcomeEngine {
        &self.engine
    }

    pub fn archive(&self) -> &Arc<FlipArchive> {
        &self.archive
    }

    pub fn ledger(&self) -> &PointsLedger {
        &self.ledger
    }

    pub fn account(&self, username: &str) -> AccountSnapshot {
        self.ledger.account(username)
    }

    /// Nonce state of a creator's flip sequence
    pub fn sequence(&self, creator: &str) -> FlipSequence {
        self.sequences.snapshot(creator)
    }

    /// Open a room and take the creator's bet
    pub async fn create_room(
        &self,
        creator: &str,
        bet: u64,
        side: CoinSide,
    ) -> FairFlipResult<RoomTicket> {
        if bet == 0 || bet > self.max_bet {
            return Err(ValidationError::InvalidBet {
                actual: bet,
                max: self.max_bet,
            }
            .into());
        }

        let balance = self.ledger.place_bet(creator, bet)?;
        let id = match self
            .rooms
            .open(creator, bet, side, |id| self.archive.contains(&id.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                self.ledger.refund_bet(creator, bet)?;
                return Err(e.into());
            }
        };

        let room = self.rooms.get(id)?;
        let summary = room.lock().await.summary();
        info!("🆕 Room {} opened by {} ({} on {})", id, creator, bet, side);

        Ok(RoomTicket {
            room: summary,
            balance,
        })
    }

    /// Seat an opponent, take their bet and commit to a server seed.
    ///
    /// The nonce is reserved on the creator's sequence here so it can be
    /// published with the seed hash; a creator with a flip still running
    /// cannot start another.
    pub async fn join_room(&self, room_id: u32, user: &str) -> FairFlipResult<JoinReceipt> {
        let handle = self.rooms.get(room_id)?;
        let mut room = handle.lock().await;

        if room.closed {
            return Err(RoomError::NotFound(room_id).into());
        }
        if room.creator == user {
            return Err(RoomError::OwnRoom(room_id).into());
        }
        if room.opponent.is_some() {
            return Err(RoomError::RoomFull(room_id).into());
        }

        let nonce = self.sequences.begin(&room.creator)?;
        let balance = match self.ledger.place_bet(user, room.bet) {
            Ok(balance) => balance,
            Err(e) => {
                self.sequences.abort(&room.creator, nonce)?;
                return Err(e.into());
            }
        };

        let session = CommitRevealSession::commit(room.match_id(), nonce);
        let commitment = session.commitment();
        room.opponent = Some(user.to_string());
        room.session = Some(session);

        info!(
            "🤝 {} joined room {} (nonce {}, commitment {})",
            user,
            room_id,
            nonce,
            &commitment.server_seed_hash[..12]
        );

        Ok(JoinReceipt {
            room: room.summary(),
            commitment,
            balance,
        })
    }

    /// Close a room nobody has joined yet and return the creator's bet
    pub async fn cancel_room(&self, room_id: u32, user: &str) -> FairFlipResult<u64> {
        let handle = self.rooms.get(room_id)?;
        let mut room = handle.lock().await;

        if room.closed {
            return Err(RoomError::NotFound(room_id).into());
        }
        if room.creator != user {
            return Err(RoomError::NotCreator(room_id).into());
        }
        if room.opponent.is_some() {
            return Err(RoomError::RoomFull(room_id).into());
        }

        let balance = self.ledger.refund_bet(user, room.bet)?;
        room.closed = true;
        self.rooms.remove(room_id);
        info!("🚪 Room {} cancelled by {}", room_id, user);

        Ok(balance)
    }

    /// Take the player seed, reveal, settle and archive.
    ///
    /// Either participant may supply the seed; when none is given the
    /// server draws one.
    pub async fn submit_player_seed(
        &self,
        room_id: u32,
        user: &str,
        player_seed: Option<String>,
    ) -> FairFlipResult<Arc<FlipRecord>> {
        let handle = self.rooms.get(room_id)?;
        let mut room = handle.lock().await;

        if room.closed {
            return Err(RoomError::NotFound(room_id).into());
        }
        if !room.is_participant(user) {
            return Err(RoomError::NotParticipant {
                room: room_id,
                user: user.to_string(),
            }
            .into());
        }

        let details = room.details().ok_or(RoomError::NotReady(room_id))?;
        let player_seed = player_seed.unwrap_or_else(random_seed);

        let session = room.session.as_mut().ok_or(RoomError::NotReady(room_id))?;
        session.accept_player_seed(player_seed)?;
        let record = session.reveal(&self.engine, Some(details.clone()))?;

        room.closed = true;
        self.rooms.remove(room_id);

        if let Err(e) = self.sequences.finalize(&details.creator, record.nonce) {
            error!("❌ Room {} refused to finalize nonce {}: {}", room_id, record.nonce, e);
            self.refund_both(&details.creator, &details.opponent, details.bet);
            return Err(e.into());
        }

        let winner = details.holder_of(record.outcome);
        let loser = details.holder_of(record.outcome.opposite());
        if let Err(e) = self.ledger.settle(winner, loser, details.bet) {
            error!("❌ Room {} could not pay out {} to {}: {}", room_id, details.pot(), winner, e);
            self.refund_both(&details.creator, &details.opponent, details.bet);
            return Err(e.into());
        }
        self.archive.insert(record.clone());

        info!(
            "🪙 Room {} flipped {} (nonce {}, digest {}), {} wins {}",
            room_id,
            record.outcome,
            record.nonce,
            &record.digest[..12],
            winner,
            details.pot()
        );

        Ok(record)
    }

    fn refund_both(&self, creator: &str, opponent: &str, bet: u64) {
        for user in [creator, opponent] {
            if let Err(e) = self.ledger.refund_bet(user, bet) {
                warn!("⚠️ Refund of {} to {} failed: {}", bet, user, e);
            }
        }
    }

    pub async fn active_rooms(&self) -> Vec<RoomSummary> {
        self.rooms.summaries().await
    }

    /// Finished flips still inside the retention window, newest first
    pub fn finished_flips(&self) -> Vec<ArchiveEntry> {
        self.archive.recent()
    }

    pub fn flip_record(&self, match_id: &str) -> Option<ArchiveEntry> {
        self.archive.get(match_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::{FairFlipError, LedgerError, SequenceError},
        games::{commit_reveal::Phase, verify},
    };

    fn processor() -> GameProcessor {
        GameProcessor::new(&GameSettings::default(), Duration::from_secs(20)).unwrap()
    }

    #[tokio::test]
    async fn test_full_match() {
        let processor = processor();
        let ticket = processor.create_room("alice", 100, CoinSide::Heads).await.unwrap();
        assert_eq!(ticket.balance, 900);
        let room_id = ticket.room.id;

        let receipt = processor.join_room(room_id, "bob").await.unwrap();
        assert_eq!(receipt.balance, 900);
        assert_eq!(receipt.commitment.nonce, 0);
        assert_eq!(receipt.room.phase, Some(Phase::Committed));

        let record = processor
            .submit_player_seed(room_id, "bob", Some("bob-seed".into()))
            .await
            .unwrap();
        assert_eq!(record.player_seed, "bob-seed");
        assert!(verify::verify_record(&record).valid);
        assert!(
            verify::verify_commitment(&record.server_seed, &receipt.commitment.server_seed_hash).valid
        );

        let winner = record.winner().unwrap().to_string();
        let loser = if winner == "alice" { "bob" } else { "alice" };
        assert_eq!(processor.account(&winner).balance, 1100);
        assert_eq!(processor.account(loser).balance, 900);
        assert_eq!(processor.account(loser).stats.lost, 100);

        assert!(processor.active_rooms().await.is_empty());
        assert!(processor.flip_record(&room_id.to_string()).is_some());
        assert_eq!(processor.sequence("alice").last_finalized(), Some(0));
    }

    #[tokio::test]
    async fn test_creator_nonces_increase_across_matches() {
        let processor = processor();

        for expected in 0..3u64 {
            let room = processor.create_room("alice", 1, CoinSide::Tails).await.unwrap().room;
            let receipt = processor.join_room(room.id, "bob").await.unwrap();
            assert_eq!(receipt.commitment.nonce, expected);
            let record = processor.submit_player_seed(room.id, "alice", None).await.unwrap();
            assert_eq!(record.nonce, expected);
        }
    }

    #[tokio::test]
    async fn test_second_in_flight_flip_is_refused() {
        let processor = processor();
        let first = processor.create_room("alice", 10, CoinSide::Heads).await.unwrap().room;
        let second = processor.create_room("alice", 10, CoinSide::Heads).await.unwrap().room;

        processor.join_room(first.id, "bob").await.unwrap();
        let err = processor.join_room(second.id, "carol").await.unwrap_err();
        assert!(matches!(
            err,
            FairFlipError::SequenceMisuse(SequenceError::FlipInFlight { in_flight: 0 })
        ));
        // carol was not charged
        assert_eq!(processor.account("carol").balance, 1000);
    }

    #[tokio::test]
    async fn test_join_rules() {
        let processor = processor();
        let room = processor.create_room("alice", 10, CoinSide::Heads).await.unwrap().room;

        assert!(matches!(
            processor.join_room(room.id, "alice").await.unwrap_err(),
            FairFlipError::Room(RoomError::OwnRoom(_))
        ));

        processor.join_room(room.id, "bob").await.unwrap();
        assert!(matches!(
            processor.join_room(room.id, "carol").await.unwrap_err(),
            FairFlipError::Room(RoomError::RoomFull(_))
        ));
    }

    #[tokio::test]
    async fn test_broke_opponent_releases_nonce() {
        let processor = GameProcessor::new(
            &GameSettings {
                starting_balance: 50,
                ..GameSettings::default()
            },
            Duration::from_secs(20),
        )
        .unwrap();

        processor.ledger().place_bet("bob", 50).unwrap();
        let room = processor.create_room("alice", 50, CoinSide::Heads).await.unwrap().room;

        assert!(matches!(
            processor.join_room(room.id, "bob").await.unwrap_err(),
            FairFlipError::Ledger(LedgerError::InsufficientPoints { .. })
        ));
        assert_eq!(processor.sequence("alice").in_flight(), None);

        let receipt = processor.join_room(room.id, "carol").await.unwrap();
        assert_eq!(receipt.commitment.nonce, 0);
    }

    #[tokio::test]
    async fn test_failed_payout_refunds_both_bets() {
        let start = u64::MAX - 10;
        let processor = GameProcessor::new(
            &GameSettings {
                starting_balance: start,
                ..GameSettings::default()
            },
            Duration::from_secs(20),
        )
        .unwrap();

        let room = processor.create_room("alice", 100, CoinSide::Heads).await.unwrap().room;
        processor.join_room(room.id, "bob").await.unwrap();

        assert!(matches!(
            processor.submit_player_seed(room.id, "bob", None).await.unwrap_err(),
            FairFlipError::Ledger(LedgerError::Overflow(_))
        ));

        for user in ["alice", "bob"] {
            let account = processor.account(user);
            assert_eq!(account.balance, start);
            assert_eq!(account.stats.wagered, 0);
            assert_eq!(account.stats.won, 0);
            assert_eq!(account.stats.lost, 0);
        }
        assert!(processor.flip_record(&room.id.to_string()).is_none());
        assert!(processor.active_rooms().await.is_empty());
        assert_eq!(processor.sequence("alice").in_flight(), None);
    }

    #[tokio::test]
    async fn test_seed_requires_participant_and_opponent() {
        let processor = processor();
        let room = processor.create_room("alice", 10, CoinSide::Heads).await.unwrap().room;

        assert!(matches!(
            processor.submit_player_seed(room.id, "alice", None).await.unwrap_err(),
            FairFlipError::Room(RoomError::NotReady(_))
        ));

        processor.join_room(room.id, "bob").await.unwrap();
        assert!(matches!(
            processor.submit_player_seed(room.id, "mallory", None).await.unwrap_err(),
            FairFlipError::Room(RoomError::NotParticipant { .. })
        ));

        processor.submit_player_seed(room.id, "bob", None).await.unwrap();
        assert!(matches!(
            processor.submit_player_seed(room.id, "bob", None).await.unwrap_err(),
            FairFlipError::Room(RoomError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_player_seed_leaves_room_committed() {
        let processor = processor();
        let room = processor.create_room("alice", 10, CoinSide::Heads).await.unwrap().room;
        processor.join_room(room.id, "bob").await.unwrap();

        assert!(matches!(
            processor
                .submit_player_seed(room.id, "bob", Some(String::new()))
                .await
                .unwrap_err(),
            FairFlipError::MalformedInput(ValidationError::EmptyPlayerSeed)
        ));

        let rooms = processor.active_rooms().await;
        assert_eq!(rooms[0].phase, Some(Phase::Committed));
    }

    #[tokio::test]
    async fn test_bet_validation() {
        let processor = processor();
        assert!(matches!(
            processor.create_room("alice", 0, CoinSide::Heads).await.unwrap_err(),
            FairFlipError::MalformedInput(ValidationError::InvalidBet { .. })
        ));
        assert!(matches!(
            processor.create_room("alice", 1001, CoinSide::Heads).await.unwrap_err(),
            FairFlipError::Ledger(LedgerError::InsufficientPoints { .. })
        ));
        assert_eq!(processor.account("alice").balance, 1000);
    }

    #[tokio::test]
    async fn test_cancel_refunds_creator() {
        let processor = processor();
        let room = processor.create_room("alice", 400, CoinSide::Tails).await.unwrap().room;

        assert!(matches!(
            processor.cancel_room(room.id, "bob").await.unwrap_err(),
            FairFlipError::Room(RoomError::NotCreator(_))
        ));
        assert_eq!(processor.cancel_room(room.id, "alice").await.unwrap(), 1000);
        assert!(processor.active_rooms().await.is_empty());
    }
}
