//! Machine Driver
//!
//! Runs a `SlotMachine` in real time. One tokio task owns the machine and
//! ticks it on an interval at the configured tick rate; spin requests arrive
//! over an mpsc channel and machine events fan out over a broadcast channel.
//! Because a single task owns the machine, the wallet needs no lock.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::{ConfigError, MachineConfig};
use crate::core::rng::derive_session_seed;
use crate::game::events::MachineEvent;
use crate::game::machine::{SlotMachine, SpinRejected};
use crate::game::wallet::SessionStats;

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Capacity of the command channel.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Driver errors.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The driver task has exited.
    #[error("Machine driver has stopped")]
    Closed,

    /// The machine refused the spin.
    #[error("Spin rejected: {0}")]
    Rejected(#[from] SpinRejected),
}

/// Commands accepted by the driver.
#[derive(Debug)]
pub enum DriverCommand {
    /// Start a spin; `None` uses the configured base bet.
    Spin {
        /// Bet for this cycle
        bet: Option<u64>,
        /// Cycle number or refusal
        reply: oneshot::Sender<Result<u64, SpinRejected>>,
    },
    /// Finish any in-flight cycle, then stop.
    Shutdown,
}

/// What a finished session looked like.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: Uuid,
    /// Seed the reels were driven by.
    pub rng_seed: u64,
    /// When the driver started ticking.
    pub started_at: DateTime<Utc>,
    /// When the driver stopped.
    pub ended_at: DateTime<Utc>,
    /// Ticks simulated.
    pub ticks: u64,
    /// Balance at shutdown.
    pub final_balance: u64,
    /// Totals across the session.
    pub stats: SessionStats,
    /// Hex state hash at shutdown.
    pub state_hash: String,
}

/// Bet input and event feed for a running driver.
#[derive(Clone)]
pub struct MachineHandle {
    session_id: Uuid,
    commands: mpsc::Sender<DriverCommand>,
    events: broadcast::Sender<MachineEvent>,
}

impl MachineHandle {
    /// Request a spin with `bet` credits.
    pub async fn spin(&self, bet: u64) -> Result<u64, DriverError> {
        self.send_spin(Some(bet)).await
    }

    /// Request a spin with the configured base bet.
    pub async fn spin_base(&self) -> Result<u64, DriverError> {
        self.send_spin(None).await
    }

    async fn send_spin(&self, bet: Option<u64>) -> Result<u64, DriverError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(DriverCommand::Spin { bet, reply })
            .await
            .map_err(|_| DriverError::Closed)?;
        Ok(response.await.map_err(|_| DriverError::Closed)??)
    }

    /// Subscribe to machine events.
    pub fn subscribe(&self) -> broadcast::Receiver<MachineEvent> {
        self.events.subscribe()
    }

    /// Ask the driver to stop after the current cycle.
    pub async fn shutdown(&self) -> Result<(), DriverError> {
        self.commands
            .send(DriverCommand::Shutdown)
            .await
            .map_err(|_| DriverError::Closed)
    }

    /// Session this handle belongs to.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

/// Pick the RNG seed for a session: the configured one, or one derived from
/// the session id and the current time.
pub fn session_seed(config: &MachineConfig, session_id: &Uuid) -> u64 {
    config.seed.unwrap_or_else(|| {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        derive_session_seed(session_id.as_bytes(), &nanos.to_le_bytes())
    })
}

/// Real-time owner of one machine.
pub struct MachineDriver {
    session_id: Uuid,
    machine: SlotMachine,
    commands: mpsc::Receiver<DriverCommand>,
    events: broadcast::Sender<MachineEvent>,
}

impl MachineDriver {
    /// Wrap an existing machine in a new session.
    pub fn new(machine: SlotMachine) -> (Self, MachineHandle) {
        Self::with_session_id(Uuid::new_v4(), machine)
    }

    /// Build a machine from config for a fresh session.
    pub fn from_config(config: MachineConfig) -> Result<(Self, MachineHandle), ConfigError> {
        let session_id = Uuid::new_v4();
        let seed = session_seed(&config, &session_id);
        let machine = SlotMachine::new(config, seed)?;
        Ok(Self::with_session_id(session_id, machine))
    }

    /// Wrap a machine under a known session id.
    pub fn with_session_id(session_id: Uuid, machine: SlotMachine) -> (Self, MachineHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let handle = MachineHandle {
            session_id,
            commands: command_tx,
            events: event_tx.clone(),
        };

        let driver = Self {
            session_id,
            machine,
            commands: command_rx,
            events: event_tx,
        };

        (driver, handle)
    }

    /// Tick the machine until shut down.
    ///
    /// A shutdown (or every handle being dropped) while a cycle is in flight
    /// lets that cycle finish and pay out first.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub async fn run(mut self) -> SessionSummary {
        let started_at = Utc::now();
        let tick_rate = self.machine.config().tick_rate;
        info!(
            "Session started: seed {}, {} Hz",
            self.machine.rng_seed(),
            tick_rate
        );

        // tick_rate is validated to 1..=MAX_TICK_RATE, so the period is non-zero
        let tick_duration = Duration::from_micros(1_000_000 / tick_rate as u64);
        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut draining = false;

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    let result = self.machine.tick();
                    self.publish(result.events);

                    if draining && self.machine.can_spin() {
                        break;
                    }
                }

                command = self.commands.recv(), if !draining => {
                    match command {
                        Some(DriverCommand::Spin { bet, reply }) => {
                            let bet = bet.unwrap_or(self.machine.config().base_bet);
                            let _ = reply.send(self.machine.request_spin(bet));
                        }
                        Some(DriverCommand::Shutdown) | None => {
                            if self.machine.can_spin() {
                                break;
                            }
                            debug!("Shutdown requested, finishing cycle {}", self.machine.cycle());
                            draining = true;
                        }
                    }
                }
            }
        }

        let events = self.machine.take_events();
        self.publish(events);

        let summary = SessionSummary {
            session_id: self.session_id,
            rng_seed: self.machine.rng_seed(),
            started_at,
            ended_at: Utc::now(),
            ticks: self.machine.tick_count(),
            final_balance: self.machine.balance(),
            stats: self.machine.stats().clone(),
            state_hash: hex::encode(self.machine.compute_hash()),
        };

        info!(
            "Session ended: {} spins, balance {}, RTP {:.3}",
            summary.stats.spins,
            summary.final_balance,
            summary.stats.return_to_player()
        );

        summary
    }

    fn publish(&self, events: Vec<MachineEvent>) {
        for event in events {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }
}
