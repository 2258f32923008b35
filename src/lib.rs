//! # Slot Reels
//!
//! Coordination core for a three-reel slot machine: reel motion, staggered
//! stops, settle detection and payout.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        SLOT REELS                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── angle.rs    - Degree normalization, symbol angles       │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Machine logic (deterministic)             │
//! │  ├── reel.rs     - Reel state machine                        │
//! │  ├── payout.rs   - Payline evaluation                        │
//! │  ├── wallet.rs   - Balance and session stats                 │
//! │  ├── machine.rs  - Spin orchestrator, tick loop              │
//! │  ├── hooks.rs    - Renderer / audio / display contracts      │
//! │  └── events.rs   - Machine events                            │
//! │                                                              │
//! │  config.rs       - JSON machine configuration                │
//! │                                                              │
//! │  runtime/        - Real-time driving (non-deterministic)     │
//! │  └── driver.rs   - tokio tick loop, bet input, event feed    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules advance in fixed ticks:
//! - Time enters only as `1 / tick_rate` per tick
//! - Reel targets come from a seeded Xorshift128+
//! - No system time dependencies
//!
//! Given the same config, seed and bets, a session produces the same
//! results and the same state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod config;
pub mod runtime;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use config::{ConfigError, MachineConfig};
pub use game::machine::{SlotMachine, SpinRejected, SpinReport};
pub use game::payout::{PayoutEngine, SpinResult};
pub use runtime::{MachineDriver, MachineHandle, SessionSummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
