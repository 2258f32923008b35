//! Reel State Machine
//!
//! One reel is an explicit finite-state machine advanced by an external
//! clock. It knows nothing about other reels or about payouts.
//!
//! ```text
//!   Idle ──start_spin──▶ Spinning ──request_stop──▶ Decelerating
//!                           ▲                            │ rate <= SETTLE_THRESHOLD
//!                           └────────start_spin───── Settled ◀┘
//! ```

use serde::{Serialize, Deserialize};
use tracing::warn;

use crate::core::angle::{move_towards, nearest_symbol, normalize_degrees, symbol_angle};
use crate::core::rng::DeterministicRng;

/// Symbol count used when a reel is configured with zero symbols.
pub const DEFAULT_SYMBOL_COUNT: u32 = 4;

/// Rate (deg/s) at or below which a decelerating reel snaps to its target.
pub const SETTLE_THRESHOLD: f64 = 5.0;

/// Default spin rate (deg/s).
pub const DEFAULT_SPIN_RATE: f64 = 720.0;

/// Default deceleration (deg/s²).
pub const DEFAULT_DECELERATION: f64 = 600.0;

/// Per-reel configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    /// Number of distinct faces on the reel.
    pub symbol_count: u32,
    /// Full spin speed in degrees per second.
    pub spin_rate: f64,
    /// Slow-down rate in degrees per second squared.
    pub deceleration: f64,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            symbol_count: DEFAULT_SYMBOL_COUNT,
            spin_rate: DEFAULT_SPIN_RATE,
            deceleration: DEFAULT_DECELERATION,
        }
    }
}

/// Reel lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum ReelState {
    /// Never spun.
    #[default]
    Idle = 0,
    /// Spinning at full rate.
    Spinning = 1,
    /// Stop requested, rate falling toward zero.
    Decelerating = 2,
    /// Snapped onto the target symbol.
    Settled = 3,
}

/// A single reel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reel {
    symbol_count: u32,
    spin_rate: f64,
    deceleration: f64,
    /// Current angle in degrees, always in [0, 360).
    position: f64,
    /// Current angular rate (deg/s).
    rate: f64,
    target_index: u32,
    target_angle: f64,
    state: ReelState,
}

impl Reel {
    /// Create an idle reel at angle 0.
    pub fn new(config: &ReelConfig) -> Self {
        Self {
            symbol_count: config.symbol_count,
            spin_rate: config.spin_rate,
            deceleration: config.deceleration,
            position: 0.0,
            rate: 0.0,
            target_index: 0,
            target_angle: 0.0,
            state: ReelState::Idle,
        }
    }

    /// Pick this cycle's landing symbol.
    ///
    /// A zero symbol count is healed to [`DEFAULT_SYMBOL_COUNT`] first.
    pub fn choose_random_target(&mut self, rng: &mut DeterministicRng) -> u32 {
        if self.symbol_count == 0 {
            warn!(
                "Reel configured with 0 symbols, resetting to {}",
                DEFAULT_SYMBOL_COUNT
            );
            self.symbol_count = DEFAULT_SYMBOL_COUNT;
        }

        self.target_index = rng.next_int(self.symbol_count);
        self.target_angle = symbol_angle(self.target_index, self.symbol_count);
        self.target_index
    }

    /// Begin spinning from angle 0 at the configured rate.
    ///
    /// Any spin already in flight on this reel is discarded. The previous
    /// target is reused if no new one was chosen.
    pub fn start_spin(&mut self) {
        self.position = 0.0;
        self.rate = self.spin_rate;
        self.state = ReelState::Spinning;
    }

    /// Ask the reel to begin slowing down. No-op unless spinning.
    pub fn request_stop(&mut self) {
        if self.state == ReelState::Spinning {
            self.state = ReelState::Decelerating;
        }
    }

    /// Advance the reel by `dt` seconds.
    ///
    /// Returns `true` on the tick the reel settles.
    pub fn tick(&mut self, dt: f64) -> bool {
        if !self.is_spinning() {
            return false;
        }
        let dt = dt.max(0.0);

        self.position = normalize_degrees(self.position + self.rate * dt);

        if self.state == ReelState::Decelerating {
            self.rate = move_towards(self.rate, 0.0, self.deceleration * dt);

            #[cfg(feature = "debug-tracing")]
            tracing::trace!(position = self.position, rate = self.rate, "reel decelerating");

            if self.rate <= SETTLE_THRESHOLD {
                self.settle();
                return true;
            }
        }

        false
    }

    /// Snap a spinning reel onto its target immediately.
    ///
    /// Returns `true` if the reel was spinning.
    pub fn force_settle(&mut self) -> bool {
        if !self.is_spinning() {
            return false;
        }
        self.settle();
        true
    }

    fn settle(&mut self) {
        self.position = self.target_angle;
        self.rate = 0.0;
        self.state = ReelState::Settled;
    }

    /// Symbol currently nearest the payline.
    ///
    /// While spinning this is the instantaneous symbol, not the result.
    pub fn current_symbol_index(&self) -> u32 {
        nearest_symbol(self.position, self.effective_symbol_count())
    }

    /// Is the reel spinning or decelerating?
    #[inline]
    pub fn is_spinning(&self) -> bool {
        matches!(self.state, ReelState::Spinning | ReelState::Decelerating)
    }

    fn effective_symbol_count(&self) -> u32 {
        if self.symbol_count == 0 {
            DEFAULT_SYMBOL_COUNT
        } else {
            self.symbol_count
        }
    }

    /// Current angle in degrees.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current angular rate.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Lifecycle state.
    pub fn state(&self) -> ReelState {
        self.state
    }

    /// Symbol chosen for the current cycle.
    pub fn target_index(&self) -> u32 {
        self.target_index
    }

    /// Configured symbol count (0 until healed if misconfigured).
    pub fn symbol_count(&self) -> u32 {
        self.symbol_count
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: f64 = 1.0 / 60.0;

    fn spin_to_rest(reel: &mut Reel, spin_ticks: u32) -> u32 {
        reel.start_spin();
        for _ in 0..spin_ticks {
            reel.tick(DT);
        }
        reel.request_stop();
        let mut ticks = 0;
        while reel.is_spinning() {
            reel.tick(DT);
            ticks += 1;
            assert!(ticks < 10_000, "reel never settled");
        }
        ticks
    }

    #[test]
    fn test_new_reel_is_idle() {
        let reel = Reel::new(&ReelConfig::default());
        assert_eq!(reel.state(), ReelState::Idle);
        assert!(!reel.is_spinning());
        assert_eq!(reel.position(), 0.0);
        assert_eq!(reel.current_symbol_index(), 0);
    }

    #[test]
    fn test_spin_advances_position() {
        let mut reel = Reel::new(&ReelConfig::default());
        reel.start_spin();
        assert_eq!(reel.state(), ReelState::Spinning);

        reel.tick(0.1);
        assert!((reel.position() - 72.0).abs() < 1e-9);

        // Wraps past a full turn
        reel.tick(0.5);
        assert!((reel.position() - 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_idle_tick_is_noop() {
        let mut reel = Reel::new(&ReelConfig::default());
        assert!(!reel.tick(1.0));
        assert_eq!(reel.position(), 0.0);
    }

    #[test]
    fn test_spinning_reel_keeps_spinning_without_stop() {
        let mut reel = Reel::new(&ReelConfig::default());
        reel.start_spin();
        for _ in 0..1000 {
            assert!(!reel.tick(DT));
        }
        assert_eq!(reel.state(), ReelState::Spinning);
        assert_eq!(reel.rate(), DEFAULT_SPIN_RATE);
    }

    #[test]
    fn test_deceleration_settles_on_target() {
        let mut rng = DeterministicRng::new(7);
        let mut reel = Reel::new(&ReelConfig::default());
        let target = reel.choose_random_target(&mut rng);

        let ticks = spin_to_rest(&mut reel, 30);

        // 715 deg/s to shed at 600 deg/s² is a little over a second
        assert!(ticks > 60 && ticks < 80, "settled after {} ticks", ticks);
        assert_eq!(reel.state(), ReelState::Settled);
        assert_eq!(reel.rate(), 0.0);
        assert_eq!(reel.current_symbol_index(), target);
        assert_eq!(reel.position(), target as f64 * 90.0);
    }

    #[test]
    fn test_request_stop_idempotent() {
        let mut reel = Reel::new(&ReelConfig::default());

        // Idle: nothing happens
        reel.request_stop();
        assert_eq!(reel.state(), ReelState::Idle);

        reel.start_spin();
        reel.request_stop();
        reel.tick(DT);
        let rate = reel.rate();
        reel.request_stop();
        assert_eq!(reel.state(), ReelState::Decelerating);
        assert_eq!(reel.rate(), rate);

        spin_to_rest(&mut reel, 0);
        let position = reel.position();
        reel.request_stop();
        assert_eq!(reel.state(), ReelState::Settled);
        assert_eq!(reel.position(), position);
    }

    #[test]
    fn test_start_spin_resets_in_flight_spin() {
        let mut reel = Reel::new(&ReelConfig::default());
        reel.start_spin();
        reel.tick(0.2);
        reel.request_stop();
        reel.tick(0.2);

        reel.start_spin();
        assert_eq!(reel.state(), ReelState::Spinning);
        assert_eq!(reel.position(), 0.0);
        assert_eq!(reel.rate(), DEFAULT_SPIN_RATE);
    }

    #[test]
    fn test_start_without_new_target_reuses_previous() {
        let mut rng = DeterministicRng::new(99);
        let mut reel = Reel::new(&ReelConfig::default());
        let target = reel.choose_random_target(&mut rng);

        spin_to_rest(&mut reel, 10);
        spin_to_rest(&mut reel, 25);

        assert_eq!(reel.target_index(), target);
        assert_eq!(reel.current_symbol_index(), target);
    }

    #[test]
    fn test_zero_symbol_count_self_heals() {
        let config = ReelConfig { symbol_count: 0, ..Default::default() };
        let mut reel = Reel::new(&config);

        // Queries work before healing
        assert_eq!(reel.current_symbol_index(), 0);

        let mut rng = DeterministicRng::new(1);
        let target = reel.choose_random_target(&mut rng);
        assert_eq!(reel.symbol_count(), DEFAULT_SYMBOL_COUNT);
        assert!(target < DEFAULT_SYMBOL_COUNT);
    }

    #[test]
    fn test_force_settle() {
        let mut rng = DeterministicRng::new(3);
        let config = ReelConfig { deceleration: 0.0, ..Default::default() };
        let mut reel = Reel::new(&config);
        let target = reel.choose_random_target(&mut rng);

        reel.start_spin();
        reel.request_stop();
        for _ in 0..600 {
            reel.tick(DT);
        }
        // No deceleration: still turning
        assert!(reel.is_spinning());

        assert!(reel.force_settle());
        assert_eq!(reel.current_symbol_index(), target);
        assert!(!reel.force_settle());
    }

    #[test]
    fn test_current_symbol_while_spinning_is_instantaneous() {
        let mut reel = Reel::new(&ReelConfig::default());
        reel.start_spin();
        reel.tick(0.125); // 90 degrees
        assert_eq!(reel.current_symbol_index(), 1);
        reel.tick(0.25); // 270 degrees
        assert_eq!(reel.current_symbol_index(), 3);
    }

    proptest! {
        #[test]
        fn prop_target_in_range(seed in any::<u64>(), symbol_count in 1u32..64) {
            let mut rng = DeterministicRng::new(seed);
            let mut reel = Reel::new(&ReelConfig { symbol_count, ..Default::default() });
            for _ in 0..16 {
                prop_assert!(reel.choose_random_target(&mut rng) < symbol_count);
            }
        }

        #[test]
        fn prop_settled_symbol_equals_target(
            seed in any::<u64>(),
            symbol_count in 1u32..32,
            spin_ticks in 0u32..240,
            spin_rate in 100.0f64..1500.0,
            deceleration in 100.0f64..2000.0,
        ) {
            let mut rng = DeterministicRng::new(seed);
            let mut reel = Reel::new(&ReelConfig { symbol_count, spin_rate, deceleration });
            let target = reel.choose_random_target(&mut rng);

            spin_to_rest(&mut reel, spin_ticks);

            prop_assert_eq!(reel.state(), ReelState::Settled);
            prop_assert_eq!(reel.current_symbol_index(), target);
        }
    }
}
