use crate::{
    errors::RoomError,
    games::{
        commit_reveal::{CommitRevealSession, Phase, ServerCommitment},
        types::{CoinSide, MatchDetails},
    },
};
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Room ids are four digits, matching what players see in the lobby
pub const ROOM_ID_MIN: u32 = 1000;
pub const ROOM_ID_MAX: u32 = 9998;
const ROOM_ID_ATTEMPTS: usize = 64;

/// A two-player match waiting for, or running, its flip
#[derive(Debug)]
pub struct Room {
    pub id: u32,
    pub creator: String,
    pub opponent: Option<String>,
    pub bet: u64,
    pub creator_side: CoinSide,
    pub created_at: DateTime<Utc>,
    pub session: Option<CommitRevealSession>,
    /// Set once the room leaves the registry; stale handles must not act on it
    pub closed: bool,
}

impl Room {
    pub fn match_id(&self) -> String {
        self.id.to_string()
    }

    pub fn is_participant(&self, user: &str) -> bool {
        self.creator == user || self.opponent.as_deref() == Some(user)
    }

    /// Bookkeeping passed through the engine; needs an opponent
    pub fn details(&self) -> Option<MatchDetails> {
        Some(MatchDetails {
            bet: self.bet,
            creator: self.creator.clone(),
            opponent: self.opponent.clone()?,
            creator_side: self.creator_side,
        })
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id,
            creator: self.creator.clone(),
            opponent: self.opponent.clone(),
            bet: self.bet,
            creator_side: self.creator_side,
            phase: self.session.as_ref().map(CommitRevealSession::phase),
            commitment: self.session.as_ref().map(CommitRevealSession::commitment),
            created_at: self.created_at,
        }
    }
}

/// Public view of a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: u32,
    pub creator: String,
    pub opponent: Option<String>,
    pub bet: u64,
    pub creator_side: CoinSide,
    /// `None` until an opponent joins and the server commits
    pub phase: Option<Phase>,
    pub commitment: Option<ServerCommitment>,
    pub created_at: DateTime<Utc>,
}

/// Live rooms, each behind its own lock so flips in one room never wait on another
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<u32, Arc<Mutex<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a room under a fresh id; `reserved` rejects ids still in use elsewhere.
    pub fn open(
        &self,
        creator: &str,
        bet: u64,
        creator_side: CoinSide,
        reserved: impl Fn(u32) -> bool,
    ) -> Result<u32, RoomError> {
        let mut rng = rand::thread_rng();

        for _ in 0..ROOM_ID_ATTEMPTS {
            let id = rng.gen_range(ROOM_ID_MIN..=ROOM_ID_MAX);
            if reserved(id) {
                continue;
            }

            if let Entry::Vacant(slot) = self.rooms.entry(id) {
                slot.insert(Arc::new(Mutex::new(Room {
                    id,
                    creator: creator.to_string(),
                    opponent: None,
                    bet,
                    creator_side,
                    created_at: Utc::now(),
                    session: None,
                    closed: false,
                })));
                return Ok(id);
            }
        }

        Err(RoomError::IdsExhausted)
    }

    pub fn get(&self, id: u32) -> Result<Arc<Mutex<Room>>, RoomError> {
        self.rooms
            .get(&id)
            .map(|room| room.clone())
            .ok_or(RoomError::NotFound(id))
    }

    pub fn remove(&self, id: u32) -> bool {
        self.rooms.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Summaries of all live rooms, oldest first
    pub async fn summaries(&self) -> Vec<RoomSummary> {
        let handles: Vec<_> = self.rooms.iter().map(|r| r.value().clone()).collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let room = handle.lock().await;
            if !room.closed {
                summaries.push(room.summary());
            }
        }

        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        summaries
    }
}
