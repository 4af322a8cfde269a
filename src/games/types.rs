use crate::errors::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Coin side, used both as a player's pick and as the flip outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl CoinSide {
    pub fn opposite(self) -> Self {
        match self {
            CoinSide::Heads => CoinSide::Tails,
            CoinSide::Tails => CoinSide::Heads,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CoinSide::Heads => "HEADS",
            CoinSide::Tails => "TAILS",
        }
    }
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts either case so a human pasting "heads" into a form still verifies.
impl FromStr for CoinSide {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("heads") {
            Ok(CoinSide::Heads)
        } else if s.eq_ignore_ascii_case("tails") {
            Ok(CoinSide::Tails)
        } else {
            Err(ValidationError::InvalidOutcome(s.to_string()))
        }
    }
}

impl TryFrom<String> for CoinSide {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Match bookkeeping carried through a flip untouched by the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchDetails {
    pub bet: u64,
    pub creator: String,
    pub opponent: String,
    /// Side the creator picked; the opponent holds the other one
    pub creator_side: CoinSide,
}

impl MatchDetails {
    /// Participant holding the given side
    pub fn holder_of(&self, side: CoinSide) -> &str {
        if side == self.creator_side {
            &self.creator
        } else {
            &self.opponent
        }
    }

    /// Both bets go to the winner.
    pub fn pot(&self) -> u64 {
        self.bet.saturating_mul(2)
    }
}

/// Immutable, publicly verifiable record of one completed flip
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlipRecord {
    pub match_id: String,
    pub server_seed: String,
    pub player_seed: String,
    pub nonce: u64,
    /// Lowercase hex SHA-256 of `server_seed || player_seed || nonce`
    pub digest: String,
    pub outcome: CoinSide,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<MatchDetails>,
}

impl FlipRecord {
    /// Winner according to the carried match details, if any
    pub fn winner(&self) -> Option<&str> {
        self.details.as_ref().map(|d| d.holder_of(self.outcome))
    }

    pub fn amount_won(&self) -> Option<u64> {
        self.details.as_ref().map(MatchDetails::pot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> MatchDetails {
        MatchDetails {
            bet: 100,
            creator: "alice".to_string(),
            opponent: "bob".to_string(),
            creator_side: CoinSide::Heads,
        }
    }

    #[test]
    fn test_coin_side_parsing() {
        assert_eq!("HEADS".parse::<CoinSide>().unwrap(), CoinSide::Heads);
        assert_eq!("tails".parse::<CoinSide>().unwrap(), CoinSide::Tails);
        assert!("edge".parse::<CoinSide>().is_err());
        assert!("".parse::<CoinSide>().is_err());
    }

    #[test]
    fn test_coin_side_serde() {
        assert_eq!(serde_json::to_string(&CoinSide::Heads).unwrap(), "\"HEADS\"");
        let side: CoinSide = serde_json::from_str("\"tails\"").unwrap();
        assert_eq!(side, CoinSide::Tails);
        assert!(serde_json::from_str::<CoinSide>("\"side\"").is_err());
    }

    #[test]
    fn test_winner_follows_outcome() {
        let d = details();
        assert_eq!(d.holder_of(CoinSide::Heads), "alice");
        assert_eq!(d.holder_of(CoinSide::Tails), "bob");
        assert_eq!(d.pot(), 200);
    }
}
