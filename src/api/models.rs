//! API Response Models
//!
//! Request and response bodies for the HTTP API.

use crate::{
    games::{ArchiveEntry, FlipRecord, RoomSummary, ServerCommitment},
    ledger::PlayerStats,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body of `POST /api/verify`.
///
/// Every field is optional so that a missing value reaches the verifier and
/// comes back as a malformed-input verdict instead of a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerifyRequest {
    pub server_seed: Option<String>,
    pub player_seed: Option<String>,
    /// Number or decimal string
    pub nonce: Option<serde_json::Value>,
    pub digest: Option<String>,
    pub outcome: Option<String>,
}

impl VerifyRequest {
    /// Nonce as the decimal text the verifier parses
    pub fn nonce_text(&self) -> String {
        match &self.nonce {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommitmentCheckRequest {
    pub server_seed: Option<String>,
    pub server_seed_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequest {
    pub bet: u64,
    /// HEADS or TAILS, either case
    pub side: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubmitSeedRequest {
    pub player_seed: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomResponse {
    pub room: RoomSummary,
    pub balance: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinResponse {
    pub room: RoomSummary,
    pub commitment: ServerCommitment,
    pub balance: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelResponse {
    pub room_id: u32,
    pub balance: u64,
}

/// A finished flip with its derived bookkeeping
#[derive(Debug, Clone, Serialize)]
pub struct FlipResponse {
    #[serde(flatten)]
    pub record: FlipRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_won: Option<u64>,
    /// Milliseconds until the archive drops this record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_ms: Option<u64>,
}

impl FlipResponse {
    pub fn from_record(record: &FlipRecord) -> Self {
        Self {
            winner: record.winner().map(str::to_string),
            amount_won: record.amount_won(),
            record: record.clone(),
            expires_in_ms: None,
        }
    }
}

impl From<ArchiveEntry> for FlipResponse {
    fn from(entry: ArchiveEntry) -> Self {
        let mut response = Self::from_record(&entry.record);
        response.expires_in_ms = Some(u64::try_from(entry.remaining.as_millis()).unwrap_or(u64::MAX));
        response
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomsResponse {
    pub active: Vec<RoomSummary>,
    pub finished: Vec<FlipResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub username: String,
    pub balance: u64,
    pub stats: PlayerStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_text_accepts_numbers_and_strings() {
        let from_number: VerifyRequest = serde_json::from_str(r#"{"nonce": 42}"#).unwrap();
        assert_eq!(from_number.nonce_text(), "42");

        let from_string: VerifyRequest = serde_json::from_str(r#"{"nonce": "7"}"#).unwrap();
        assert_eq!(from_string.nonce_text(), "7");

        let negative: VerifyRequest = serde_json::from_str(r#"{"nonce": -1}"#).unwrap();
        assert_eq!(negative.nonce_text(), "-1");

        let missing: VerifyRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.nonce_text(), "");
        assert!(missing.server_seed.is_none());
    }
}
