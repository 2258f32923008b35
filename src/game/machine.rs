//! Spin Orchestration
//!
//! `SlotMachine` owns the reels and the wallet and runs one spin cycle at a
//! time on a single logical clock. Every call to [`SlotMachine::tick`]
//! advances all reels by one frame and then re-evaluates the cycle phase:
//!
//! ```text
//!  request_spin ──▶ Spinning ──spin_duration──▶ Stopping(reel 0..N) ──▶ Settling ──▶ Idle
//!   debit bet        all reels     each stop waits          barrier: no reel   payout,
//!   pick targets     turning       delay_between_stops      spinning (or       credit,
//!   start reels                    then stops one reel      timeout)           report
//! ```
//!
//! Stops are issued strictly in reel order; the other reels keep ticking
//! while the orchestrator waits.

use std::fmt;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, MachineConfig};
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::game::events::{MachineEvent, MachineEventData};
use crate::game::hooks::{
    AudioCue, DisplayReporter, NullAudio, NullRenderer, Renderer, TracingReporter,
};
use crate::game::payout::{PayoutEngine, PayoutOutcome, SpinResult};
use crate::game::reel::Reel;
use crate::game::wallet::{SessionStats, Wallet};

/// Why a spin request was refused. Nothing is mutated on refusal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum SpinRejected {
    /// Wallet cannot cover the bet.
    #[error("Not enough balance! (balance {balance}, bet {bet})")]
    InsufficientBalance {
        /// Balance at the time of the request
        balance: u64,
        /// Requested bet
        bet: u64,
    },

    /// Previous cycle has not finished.
    #[error("A spin is already in progress")]
    CycleInProgress,

    /// Bet of zero credits.
    #[error("Invalid bet: {0}")]
    InvalidBet(u64),
}

/// Outcome of one completed cycle, as shown to the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpinReport {
    /// Cycle number, starting at 1.
    pub cycle: u64,
    /// Credits wagered.
    pub bet: u64,
    /// Settled symbols in reel order.
    pub results: SpinResult,
    /// Payout rule applied.
    pub outcome: PayoutOutcome,
    /// Balance after the payout was credited.
    pub balance: u64,
    /// At least one reel had to be force-settled.
    pub force_settled: bool,
}

impl fmt::Display for SpinReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results: {}", self.results)?;
        writeln!(f, "{}", self.outcome.reason)?;
        writeln!(f, "Payout: {}", self.outcome.amount)?;
        write!(f, "Balance: {}", self.balance)
    }
}

/// Where the current cycle is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CyclePhase {
    /// Ready for a spin.
    Idle,
    /// All reels at full speed.
    Spinning {
        /// Ticks until the stop sequence begins
        ticks_remaining: u64,
    },
    /// Issuing staggered stops.
    Stopping {
        /// Next reel slot to stop
        next_reel: usize,
        /// Ticks until that stop
        ticks_remaining: u64,
    },
    /// Waiting for every reel to come to rest.
    Settling {
        /// Ticks spent waiting so far
        ticks_waited: u64,
    },
}

impl CyclePhase {
    fn tag(&self) -> u8 {
        match self {
            CyclePhase::Idle => 0,
            CyclePhase::Spinning { .. } => 1,
            CyclePhase::Stopping { .. } => 2,
            CyclePhase::Settling { .. } => 3,
        }
    }
}

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated since the previous tick
    pub events: Vec<MachineEvent>,
    /// Report, if a cycle completed this tick
    pub report: Option<SpinReport>,
}

/// The spin orchestrator.
pub struct SlotMachine {
    config: MachineConfig,
    reels: Vec<Option<Reel>>,
    wallet: Wallet,
    payout: PayoutEngine,
    rng: DeterministicRng,
    rng_seed: u64,
    tick: u64,
    cycle: u64,
    phase: CyclePhase,
    can_spin: bool,
    active_bet: u64,
    force_settled: bool,
    ambient_playing: bool,
    stats: SessionStats,
    pending_events: Vec<MachineEvent>,
    renderer: Box<dyn Renderer>,
    audio: Box<dyn AudioCue>,
    reporter: Box<dyn DisplayReporter>,
}

impl SlotMachine {
    /// Build a machine from a validated config and an RNG seed.
    pub fn new(config: MachineConfig, rng_seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let reels: Vec<Option<Reel>> = config
            .reels
            .iter()
            .map(|slot| slot.as_ref().map(Reel::new))
            .collect();

        for (i, slot) in reels.iter().enumerate() {
            if slot.is_none() {
                warn!("Reel slot {} has no reel; it will never match", i);
            }
        }

        info!(
            "Machine ready: {} reel slots, balance {}, base bet {}",
            reels.len(),
            config.starting_balance,
            config.base_bet
        );

        Ok(Self {
            wallet: Wallet::new(config.starting_balance),
            payout: config.payout.clone(),
            reels,
            rng: DeterministicRng::new(rng_seed),
            rng_seed,
            tick: 0,
            cycle: 0,
            phase: CyclePhase::Idle,
            can_spin: true,
            active_bet: 0,
            force_settled: false,
            ambient_playing: false,
            stats: SessionStats::default(),
            pending_events: Vec::new(),
            renderer: Box::new(NullRenderer),
            audio: Box::new(NullAudio),
            reporter: Box::new(TracingReporter),
            config,
        })
    }

    /// Replace the renderer.
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Replace the audio cue.
    pub fn with_audio(mut self, audio: impl AudioCue + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    /// Replace the display reporter.
    pub fn with_reporter(mut self, reporter: impl DisplayReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Start a spin cycle with the configured base bet.
    pub fn spin(&mut self) -> Result<u64, SpinRejected> {
        self.request_spin(self.config.base_bet)
    }

    /// Start a spin cycle.
    ///
    /// On success the bet is already debited and every reel is spinning;
    /// returns the new cycle number. On refusal nothing changes.
    pub fn request_spin(&mut self, bet: u64) -> Result<u64, SpinRejected> {
        if !self.can_spin {
            return Err(self.reject(SpinRejected::CycleInProgress));
        }
        if bet == 0 {
            return Err(self.reject(SpinRejected::InvalidBet(bet)));
        }
        let balance = self.wallet.balance();
        if !self.wallet.debit(bet) {
            return Err(self.reject(SpinRejected::InsufficientBalance { balance, bet }));
        }

        self.can_spin = false;
        self.cycle += 1;
        self.active_bet = bet;
        self.force_settled = false;

        for reel in self.reels.iter_mut().flatten() {
            reel.choose_random_target(&mut self.rng);
        }
        for reel in self.reels.iter_mut().flatten() {
            reel.start_spin();
        }

        self.phase = CyclePhase::Spinning {
            ticks_remaining: self.config.spin_ticks(),
        };

        let balance = self.wallet.balance();
        info!("Cycle {}: bet {}, balance {}", self.cycle, bet, balance);
        self.push_event(MachineEventData::SpinAccepted { bet, balance });
        self.reporter.spinning(balance);
        self.sync_ambient();

        Ok(self.cycle)
    }

    fn reject(&mut self, rejection: SpinRejected) -> SpinRejected {
        match rejection {
            // Debounce: a press while spinning is silently ignored
            SpinRejected::CycleInProgress => debug!("Spin ignored: {}", rejection),
            _ => {
                info!("Spin rejected: {}", rejection);
                self.reporter.rejected(&rejection);
            }
        }
        self.stats.rejected += 1;
        self.push_event(MachineEventData::SpinRejected { rejection: rejection.clone() });
        rejection
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Advance the machine by one tick (`1 / tick_rate` seconds).
    pub fn tick(&mut self) -> TickResult {
        self.tick += 1;
        let dt = self.config.tick_dt();

        // 1. Every reel advances in the same tick
        for (i, slot) in self.reels.iter_mut().enumerate() {
            let Some(reel) = slot else { continue };

            if reel.tick(dt) {
                let symbol = reel.current_symbol_index();
                debug!("Reel {} settled on symbol {}", i, symbol);
                self.pending_events.push(MachineEvent::new(
                    self.tick,
                    self.cycle,
                    MachineEventData::ReelSettled { reel: i, symbol },
                ));
            }

            self.renderer.render(i, reel.position());
        }

        // 2. Re-evaluate the cycle's waiting step
        let report = self.advance_cycle();

        // 3. Ambient sound follows "any reel spinning"
        self.sync_ambient();

        TickResult {
            events: self.take_events(),
            report,
        }
    }

    fn advance_cycle(&mut self) -> Option<SpinReport> {
        match self.phase {
            CyclePhase::Idle => None,

            CyclePhase::Spinning { ticks_remaining } => {
                self.phase = match countdown(ticks_remaining) {
                    Some(ticks_remaining) => CyclePhase::Spinning { ticks_remaining },
                    None => CyclePhase::Stopping {
                        next_reel: 0,
                        ticks_remaining: self.config.stop_delay_ticks(),
                    },
                };
                None
            }

            CyclePhase::Stopping { next_reel, ticks_remaining } => {
                if let Some(ticks_remaining) = countdown(ticks_remaining) {
                    self.phase = CyclePhase::Stopping { next_reel, ticks_remaining };
                    return None;
                }

                self.stop_reel(next_reel);

                let next_reel = next_reel + 1;
                self.phase = if next_reel < self.reels.len() {
                    CyclePhase::Stopping {
                        next_reel,
                        ticks_remaining: self.config.stop_delay_ticks(),
                    }
                } else {
                    CyclePhase::Settling { ticks_waited: 0 }
                };
                None
            }

            CyclePhase::Settling { ticks_waited } => {
                if !self.is_any_spinning() {
                    return Some(self.finish_cycle());
                }

                let ticks_waited = ticks_waited + 1;
                if ticks_waited >= self.config.settle_timeout_ticks() {
                    self.force_settle_all();
                    return Some(self.finish_cycle());
                }

                self.phase = CyclePhase::Settling { ticks_waited };
                None
            }
        }
    }

    fn stop_reel(&mut self, index: usize) {
        match self.reels.get_mut(index) {
            Some(Some(reel)) => {
                reel.request_stop();
                debug!("Stop requested for reel {}", index);
                self.push_event(MachineEventData::ReelStopRequested { reel: index });
            }
            _ => debug!("Reel slot {} is empty, skipping stop", index),
        }
    }

    fn force_settle_all(&mut self) {
        for (i, slot) in self.reels.iter_mut().enumerate() {
            let Some(reel) = slot else { continue };
            if reel.force_settle() {
                let symbol = reel.current_symbol_index();
                warn!(
                    "Reel {} did not settle within {}s, forced onto symbol {}",
                    i, self.config.settle_timeout_secs, symbol
                );
                self.force_settled = true;
                self.pending_events.push(MachineEvent::new(
                    self.tick,
                    self.cycle,
                    MachineEventData::ReelForceSettled { reel: i, symbol },
                ));
            }
        }
    }

    fn finish_cycle(&mut self) -> SpinReport {
        let results = self.current_results();
        let bet = self.active_bet;
        let outcome = self.payout.evaluate(&results, bet);

        self.wallet.credit(outcome.amount);
        self.stats.record(bet, &outcome);

        self.phase = CyclePhase::Idle;
        self.active_bet = 0;
        self.can_spin = true;

        let report = SpinReport {
            cycle: self.cycle,
            bet,
            results,
            outcome,
            balance: self.wallet.balance(),
            force_settled: self.force_settled,
        };

        info!(
            "Cycle {} complete: [{}] {} payout {} balance {}",
            report.cycle, report.results, report.outcome.reason, outcome.amount, report.balance
        );
        self.reporter.report(&report);
        self.push_event(MachineEventData::CycleCompleted { report: report.clone() });

        report
    }

    fn sync_ambient(&mut self) {
        let any_spinning = self.is_any_spinning();
        if any_spinning && !self.ambient_playing {
            self.ambient_playing = true;
            self.audio.start_ambient();
            self.push_event(MachineEventData::AmbientStarted);
        } else if !any_spinning && self.ambient_playing {
            self.ambient_playing = false;
            self.audio.stop_ambient();
            self.push_event(MachineEventData::AmbientStopped);
        }
    }

    /// Spin and tick until the cycle completes.
    ///
    /// Terminates because the settle barrier is bounded by the timeout.
    pub fn run_cycle(&mut self, bet: u64) -> Result<SpinReport, SpinRejected> {
        self.request_spin(bet)?;
        loop {
            if let Some(report) = self.tick().report {
                return Ok(report);
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Symbols currently under the payline; sentinel for empty slots.
    pub fn current_results(&self) -> SpinResult {
        SpinResult::new(
            self.reels
                .iter()
                .map(|slot| slot.as_ref().map(Reel::current_symbol_index))
                .collect(),
        )
    }

    /// Is any reel spinning or decelerating?
    pub fn is_any_spinning(&self) -> bool {
        self.reels.iter().flatten().any(Reel::is_spinning)
    }

    /// Ready for a new spin?
    pub fn can_spin(&self) -> bool {
        self.can_spin
    }

    /// Wallet balance.
    pub fn balance(&self) -> u64 {
        self.wallet.balance()
    }

    /// Reel slots in order.
    pub fn reels(&self) -> &[Option<Reel>] {
        &self.reels
    }

    /// Reel in a slot, if present.
    pub fn reel(&self, index: usize) -> Option<&Reel> {
        self.reels.get(index).and_then(Option::as_ref)
    }

    /// Cycle phase.
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Cycles started so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Seed the RNG was created with.
    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Session statistics.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Configuration in use.
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.rng_seed, |hasher| {
            hasher.update_u64(self.cycle);
            hasher.update_u64(self.wallet.balance());
            hasher.update_bool(self.can_spin);
            hasher.update_u8(self.phase.tag());

            for slot in &self.reels {
                hasher.update_bool(slot.is_some());
                if let Some(reel) = slot {
                    hasher.update_u8(reel.state() as u8);
                    hasher.update_f64(reel.position());
                    hasher.update_f64(reel.rate());
                    hasher.update_u32(reel.target_index());
                }
            }

            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<MachineEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn push_event(&mut self, data: MachineEventData) {
        self.pending_events.push(MachineEvent::new(self.tick, self.cycle, data));
    }
}

/// One step of a wait countdown; `None` once the wait is over.
///
/// A zero-tick wait still lasts one tick, like a zero-second frame wait.
#[inline]
fn countdown(ticks_remaining: u64) -> Option<u64> {
    if ticks_remaining > 1 {
        Some(ticks_remaining - 1)
    } else {
        None
    }
}

/// Replay a session from its seed and bet sequence.
///
/// Returns the final machine and the outcome of every spin request.
pub fn replay_session(
    config: MachineConfig,
    rng_seed: u64,
    bets: &[u64],
) -> Result<(SlotMachine, Vec<Result<SpinReport, SpinRejected>>), ConfigError> {
    let mut machine = SlotMachine::new(config, rng_seed)?;
    let outcomes = bets.iter().map(|bet| machine.run_cycle(*bet)).collect();
    Ok((machine, outcomes))
}

// =============================================================================
// TESTS
// =============================================================================
