//! Payout Evaluation
//!
//! Pure mapping from a settled symbol vector and a bet to a credit amount
//! and reason. No state, no randomness.
//!
//! Rules, first match wins:
//!
//! | Rule   | Condition                          | Pays                       |
//! |--------|------------------------------------|----------------------------|
//! | Triple | all three equal, none missing      | `bet * multiplier[symbol]` |
//! | Pair   | any two equal, neither missing     | `bet / 2`, half to even    |
//! | None   | otherwise                          | 0                          |

use std::fmt;
use serde::{Serialize, Deserialize};

/// Symbol index on a reel.
pub type SymbolIndex = u32;

/// Number of reel slots the payline reads.
pub const PAYLINE_LEN: usize = 3;

/// Multiplier used when a symbol has no entry in the table.
pub const FALLBACK_MULTIPLIER: u32 = 1;

/// Settled symbols, one per reel slot in reel order.
///
/// `None` is the sentinel for a slot with no reel behind it. It never
/// matches anything, including another sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinResult(pub Vec<Option<SymbolIndex>>);

impl SpinResult {
    /// Wrap a symbol vector.
    pub fn new(symbols: Vec<Option<SymbolIndex>>) -> Self {
        Self(symbols)
    }

    /// Symbols in reel order.
    pub fn symbols(&self) -> &[Option<SymbolIndex>] {
        &self.0
    }

    /// Number of reel slots.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no slots.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SpinResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, slot) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            match slot {
                Some(symbol) => write!(f, "{}", symbol)?,
                None => write!(f, "-")?,
            }
        }
        Ok(())
    }
}

/// Why a payout was (or was not) awarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayoutReason {
    /// All three reels show the same symbol.
    TripleMatch {
        /// Matched symbol
        symbol: SymbolIndex,
        /// Multiplier applied to the bet
        multiplier: u32,
    },
    /// Two reels show the same symbol.
    PairMatch,
    /// Nothing lines up.
    NoMatch,
}

impl fmt::Display for PayoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayoutReason::TripleMatch { symbol, multiplier } => {
                write!(f, "Triple match! Symbol {} pays x{}", symbol, multiplier)
            }
            PayoutReason::PairMatch => write!(f, "Pair matched, small win!"),
            PayoutReason::NoMatch => write!(f, "No match."),
        }
    }
}

/// Result of evaluating one spin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutOutcome {
    /// Credits to pay out.
    pub amount: u64,
    /// Category of the win.
    pub reason: PayoutReason,
}

impl PayoutOutcome {
    fn no_match() -> Self {
        Self { amount: 0, reason: PayoutReason::NoMatch }
    }
}

/// Payout rules with a per-symbol multiplier table for triples.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutEngine {
    /// Triple-match multipliers indexed by symbol.
    pub multipliers: Vec<u32>,
}

impl Default for PayoutEngine {
    fn default() -> Self {
        Self { multipliers: vec![2, 3, 5, 10] }
    }
}

impl PayoutEngine {
    /// Create an engine with the given multiplier table.
    pub fn new(multipliers: Vec<u32>) -> Self {
        Self { multipliers }
    }

    /// Triple multiplier for a symbol, [`FALLBACK_MULTIPLIER`] outside the table.
    pub fn multiplier_for(&self, symbol: SymbolIndex) -> u32 {
        self.multipliers
            .get(symbol as usize)
            .copied()
            .unwrap_or(FALLBACK_MULTIPLIER)
    }

    /// Evaluate the first three slots of a spin result.
    ///
    /// Fewer than three slots never pays.
    pub fn evaluate(&self, result: &SpinResult, bet: u64) -> PayoutOutcome {
        let [a, b, c] = match result.symbols() {
            [a, b, c, ..] => [*a, *b, *c],
            _ => return PayoutOutcome::no_match(),
        };

        if let (Some(x), Some(y), Some(z)) = (a, b, c) {
            if x == y && y == z {
                let multiplier = self.multiplier_for(x);
                return PayoutOutcome {
                    amount: bet.saturating_mul(multiplier as u64),
                    reason: PayoutReason::TripleMatch { symbol: x, multiplier },
                };
            }
        }

        if is_pair(a, b) || is_pair(b, c) || is_pair(a, c) {
            return PayoutOutcome {
                amount: half_to_even(bet),
                reason: PayoutReason::PairMatch,
            };
        }

        PayoutOutcome::no_match()
    }
}

#[inline]
fn is_pair(x: Option<SymbolIndex>, y: Option<SymbolIndex>) -> bool {
    matches!((x, y), (Some(x), Some(y)) if x == y)
}

/// `round(bet * 0.5)` with ties going to the even neighbour.
#[inline]
fn half_to_even(bet: u64) -> u64 {
    let half = bet / 2;
    if bet % 2 == 1 && half % 2 == 1 {
        half + 1
    } else {
        half
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn result(symbols: &[Option<u32>]) -> SpinResult {
        SpinResult::new(symbols.to_vec())
    }

    #[test]
    fn test_triple_match() {
        let engine = PayoutEngine::default();
        let outcome = engine.evaluate(&result(&[Some(2), Some(2), Some(2)]), 10);
        assert_eq!(outcome.amount, 50);
        assert_eq!(outcome.reason, PayoutReason::TripleMatch { symbol: 2, multiplier: 5 });
    }

    #[test]
    fn test_triple_outside_table_uses_fallback() {
        let engine = PayoutEngine::default();
        let outcome = engine.evaluate(&result(&[Some(7), Some(7), Some(7)]), 10);
        assert_eq!(outcome.amount, 10);
        assert_eq!(outcome.reason, PayoutReason::TripleMatch { symbol: 7, multiplier: 1 });
    }

    #[test]
    fn test_pair_match() {
        let engine = PayoutEngine::default();
        for symbols in [
            [Some(1), Some(1), Some(3)],
            [Some(3), Some(1), Some(1)],
            [Some(1), Some(3), Some(1)],
        ] {
            let outcome = engine.evaluate(&result(&symbols), 10);
            assert_eq!(outcome.amount, 5);
            assert_eq!(outcome.reason, PayoutReason::PairMatch);
        }
    }

    #[test]
    fn test_no_match() {
        let engine = PayoutEngine::default();
        let outcome = engine.evaluate(&result(&[Some(0), Some(1), Some(3)]), 10);
        assert_eq!(outcome.amount, 0);
        assert_eq!(outcome.reason, PayoutReason::NoMatch);
    }

    #[test]
    fn test_sentinels_never_match() {
        let engine = PayoutEngine::default();

        let outcome = engine.evaluate(&result(&[None, None, None]), 10);
        assert_eq!(outcome, PayoutOutcome { amount: 0, reason: PayoutReason::NoMatch });

        let outcome = engine.evaluate(&result(&[None, None, Some(1)]), 10);
        assert_eq!(outcome.reason, PayoutReason::NoMatch);

        // The two live reels still pair
        let outcome = engine.evaluate(&result(&[None, Some(1), Some(1)]), 10);
        assert_eq!(outcome.amount, 5);
        assert_eq!(outcome.reason, PayoutReason::PairMatch);
    }

    #[test]
    fn test_short_result_never_pays() {
        let engine = PayoutEngine::default();
        assert_eq!(engine.evaluate(&result(&[Some(1), Some(1)]), 10).amount, 0);
        assert_eq!(engine.evaluate(&result(&[]), 10).reason, PayoutReason::NoMatch);
    }

    #[test]
    fn test_pair_rounding_half_to_even() {
        assert_eq!(half_to_even(0), 0);
        assert_eq!(half_to_even(1), 0);
        assert_eq!(half_to_even(3), 2);
        assert_eq!(half_to_even(5), 2);
        assert_eq!(half_to_even(7), 4);
        assert_eq!(half_to_even(10), 5);
        assert_eq!(half_to_even(11), 6);
    }

    #[test]
    fn test_reason_text() {
        let triple = PayoutReason::TripleMatch { symbol: 3, multiplier: 10 };
        assert_eq!(triple.to_string(), "Triple match! Symbol 3 pays x10");
        assert_eq!(PayoutReason::NoMatch.to_string(), "No match.");
    }

    #[test]
    fn test_result_display() {
        assert_eq!(result(&[Some(2), None, Some(0)]).to_string(), "2 | - | 0");
    }

    fn slot() -> impl Strategy<Value = Option<u32>> {
        prop_oneof![Just(None), (0u32..6).prop_map(Some)]
    }

    proptest! {
        #[test]
        fn prop_evaluate_is_pure(
            symbols in prop::collection::vec(slot(), 3),
            bet in 0u64..1_000_000,
        ) {
            let engine = PayoutEngine::default();
            let r = SpinResult::new(symbols);
            prop_assert_eq!(engine.evaluate(&r, bet), engine.evaluate(&r, bet));
        }

        #[test]
        fn prop_triple_never_reported_as_pair(symbol in 0u32..16, bet in 1u64..10_000) {
            let engine = PayoutEngine::default();
            let r = SpinResult::new(vec![Some(symbol); 3]);
            let is_triple = matches!(
                engine.evaluate(&r, bet).reason,
                PayoutReason::TripleMatch { .. }
            );
            prop_assert!(is_triple);
        }
    }
}
