//! Machine Events
//!
//! Events generated during simulation for observers and replay checks.

use serde::{Serialize, Deserialize};

use crate::game::machine::{SpinRejected, SpinReport};
use crate::game::payout::SymbolIndex;

/// Machine event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MachineEventData {
    /// Bet debited, all reels started
    SpinAccepted {
        bet: u64,
        balance: u64,
    },

    /// Spin request refused, nothing changed
    SpinRejected {
        rejection: SpinRejected,
    },

    /// Staggered stop issued to one reel
    ReelStopRequested {
        reel: usize,
    },

    /// Reel decelerated and snapped onto its target
    ReelSettled {
        reel: usize,
        symbol: SymbolIndex,
    },

    /// Reel did not settle in time and was snapped by the orchestrator
    ReelForceSettled {
        reel: usize,
        symbol: SymbolIndex,
    },

    /// Some reel started spinning
    AmbientStarted,

    /// Every reel is at rest
    AmbientStopped,

    /// Payout applied, machine ready for the next spin
    CycleCompleted {
        report: SpinReport,
    },
}

/// A machine event with timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineEvent {
    /// Tick when event occurred
    pub tick: u64,

    /// Spin cycle the event belongs to (0 before the first spin)
    pub cycle: u64,

    /// Event data
    pub data: MachineEventData,
}

impl MachineEvent {
    /// Create a new event.
    pub fn new(tick: u64, cycle: u64, data: MachineEventData) -> Self {
        Self { tick, cycle, data }
    }

    /// Reel index involved, if any.
    pub fn reel(&self) -> Option<usize> {
        match &self.data {
            MachineEventData::ReelStopRequested { reel }
            | MachineEventData::ReelSettled { reel, .. }
            | MachineEventData::ReelForceSettled { reel, .. } => Some(*reel),
            _ => None,
        }
    }

    /// Is this the end of a cycle?
    pub fn is_cycle_completed(&self) -> bool {
        matches!(self.data, MachineEventData::CycleCompleted { .. })
    }

    /// Report carried by a completed-cycle event.
    pub fn report(&self) -> Option<&SpinReport> {
        match &self.data {
            MachineEventData::CycleCompleted { report } => Some(report),
            _ => None,
        }
    }
}
