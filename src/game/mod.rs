//! Game Logic Module
//!
//! All slot simulation code. Deterministic for a given seed and bet sequence.
//!
//! ## Module Structure
//!
//! - `reel`: Single reel state machine
//! - `payout`: Payline evaluation
//! - `wallet`: Balance and session totals
//! - `machine`: Spin orchestration and settle barrier
//! - `hooks`: Renderer, audio and display contracts
//! - `events`: Machine events for observers and replay

pub mod reel;
pub mod payout;
pub mod wallet;
pub mod machine;
pub mod hooks;
pub mod events;

// Re-export key types
pub use reel::{Reel, ReelConfig, ReelState};
pub use payout::{PayoutEngine, PayoutOutcome, PayoutReason, SpinResult, SymbolIndex};
pub use wallet::{SessionStats, Wallet};
pub use machine::{
    replay_session, CyclePhase, SlotMachine, SpinRejected, SpinReport, TickResult,
};
pub use hooks::{AudioCue, DisplayReporter, Renderer};
pub use events::{MachineEvent, MachineEventData};
