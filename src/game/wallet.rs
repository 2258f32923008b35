//! Wallet and Session Statistics
//!
//! Credits owned by a single machine. Only the orchestrator mutates them:
//! one debit when a spin is accepted, one credit when it pays out.

use serde::{Serialize, Deserialize};

use crate::game::payout::{PayoutOutcome, PayoutReason};

/// Credit balance of one machine session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    balance: u64,
}

impl Wallet {
    /// Create a wallet holding `balance` credits.
    pub const fn new(balance: u64) -> Self {
        Self { balance }
    }

    /// Current balance.
    #[inline]
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Take `amount` out of the wallet.
    ///
    /// Returns `false` and leaves the balance untouched if it is too low.
    pub fn debit(&mut self, amount: u64) -> bool {
        match self.balance.checked_sub(amount) {
            Some(rest) => {
                self.balance = rest;
                true
            }
            None => false,
        }
    }

    /// Add `amount` to the wallet.
    pub fn credit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }
}

/// Running totals across completed spin cycles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Completed cycles.
    pub spins: u64,
    /// Credits bet across completed cycles.
    pub total_wagered: u64,
    /// Credits paid out.
    pub total_paid: u64,
    /// Triple matches.
    pub triples: u64,
    /// Pair matches.
    pub pairs: u64,
    /// Spins that paid nothing.
    pub losses: u64,
    /// Spins rejected before starting.
    pub rejected: u64,
}

impl SessionStats {
    /// Record a completed cycle.
    pub fn record(&mut self, bet: u64, outcome: &PayoutOutcome) {
        self.spins += 1;
        self.total_wagered = self.total_wagered.saturating_add(bet);
        self.total_paid = self.total_paid.saturating_add(outcome.amount);
        match outcome.reason {
            PayoutReason::TripleMatch { .. } => self.triples += 1,
            PayoutReason::PairMatch => self.pairs += 1,
            PayoutReason::NoMatch => self.losses += 1,
        }
    }

    /// Paid out divided by wagered, 0 before any spin.
    pub fn return_to_player(&self) -> f64 {
        if self.total_wagered == 0 {
            0.0
        } else {
            self.total_paid as f64 / self.total_wagered as f64
        }
    }

    /// Net credits won (negative when the house is ahead).
    pub fn net(&self) -> i128 {
        self.total_paid as i128 - self.total_wagered as i128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_and_credit() {
        let mut wallet = Wallet::new(1000);
        assert!(wallet.debit(10));
        assert_eq!(wallet.balance(), 990);
        wallet.credit(50);
        assert_eq!(wallet.balance(), 1040);
    }

    #[test]
    fn test_debit_insufficient_leaves_balance() {
        let mut wallet = Wallet::new(5);
        assert!(!wallet.debit(10));
        assert_eq!(wallet.balance(), 5);

        // Exact balance is enough
        assert!(wallet.debit(5));
        assert_eq!(wallet.balance(), 0);
    }

    #[test]
    fn test_stats_record() {
        let mut stats = SessionStats::default();
        assert_eq!(stats.return_to_player(), 0.0);

        stats.record(10, &PayoutOutcome {
            amount: 50,
            reason: PayoutReason::TripleMatch { symbol: 2, multiplier: 5 },
        });
        stats.record(10, &PayoutOutcome { amount: 5, reason: PayoutReason::PairMatch });
        stats.record(10, &PayoutOutcome { amount: 0, reason: PayoutReason::NoMatch });
        stats.record(10, &PayoutOutcome { amount: 0, reason: PayoutReason::NoMatch });

        assert_eq!(stats.spins, 4);
        assert_eq!(stats.total_wagered, 40);
        assert_eq!(stats.total_paid, 55);
        assert_eq!((stats.triples, stats.pairs, stats.losses), (1, 1, 2));
        assert_eq!(stats.net(), 15);
        assert!((stats.return_to_player() - 1.375).abs() < 1e-12);
    }
}
