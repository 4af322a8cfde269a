//! Server-authoritative points ledger
//!
//! Clients never submit balances: every debit and payout happens here, driven
//! by room and flip outcomes. In-memory only.

use crate::errors::LedgerError;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Lifetime wager statistics for one account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Sum of every bet placed
    pub wagered: u64,
    /// Sum of pots collected
    pub won: u64,
    /// Sum of bets lost
    pub lost: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub username: String,
    pub balance: u64,
    pub stats: PlayerStats,
}

#[derive(Debug, Clone)]
struct Account {
    balance: u64,
    stats: PlayerStats,
}

pub struct PointsLedger {
    accounts: DashMap<String, Account>,
    starting_balance: u64,
}

impl PointsLedger {
    pub fn new(starting_balance: u64) -> Self {
        Self {
            accounts: DashMap::new(),
            starting_balance,
        }
    }

    fn fresh(&self) -> Account {
        Account {
            balance: self.starting_balance,
            stats: PlayerStats::default(),
        }
    }

    /// Current state of an account, opening it on first sight
    pub fn account(&self, username: &str) -> AccountSnapshot {
        let account = self
            .accounts
            .entry(username.to_string())
            .or_insert_with(|| self.fresh());

        AccountSnapshot {
            username: username.to_string(),
            balance: account.balance,
            stats: account.stats,
        }
    }

    pub fn balance(&self, username: &str) -> u64 {
        self.account(username).balance
    }

    /// Take a bet from the player's balance; returns the new balance
    pub fn place_bet(&self, username: &str, bet: u64) -> Result<u64, LedgerError> {
        let mut account = self
            .accounts
            .entry(username.to_string())
            .or_insert_with(|| self.fresh());

        if account.balance < bet {
            return Err(LedgerError::InsufficientPoints {
                needed: bet,
                available: account.balance,
            });
        }

        account.balance -= bet;
        account.stats.wagered = account.stats.wagered.saturating_add(bet);
        Ok(account.balance)
    }

    /// Return an unplayed bet
    pub fn refund_bet(&self, username: &str, bet: u64) -> Result<u64, LedgerError> {
        let mut account = self
            .accounts
            .entry(username.to_string())
            .or_insert_with(|| self.fresh());

        account.balance = account
            .balance
            .checked_add(bet)
            .ok_or_else(|| LedgerError::Overflow(username.to_string()))?;
        account.stats.wagered = account.stats.wagered.saturating_sub(bet);
        Ok(account.balance)
    }

    /// Pay out a finished match: the winner collects both bets.
    pub fn settle(&self, winner: &str, loser: &str, bet: u64) -> Result<(), LedgerError> {
        let pot = bet.saturating_mul(2);

        {
            let mut account = self
                .accounts
                .entry(winner.to_string())
                .or_insert_with(|| self.fresh());
            account.balance = account
                .balance
                .checked_add(pot)
                .ok_or_else(|| LedgerError::Overflow(winner.to_string()))?;
            account.stats.won = account.stats.won.saturating_add(pot);
        }

        let mut account = self
            .accounts
            .entry(loser.to_string())
            .or_insert_with(|| self.fresh());
        account.stats.lost = account.stats.lost.saturating_add(bet);

        tracing::debug!("Settled {} points to {} ({} lost {})", pot, winner, loser, bet);
        Ok(())
    }
}
