//! Runtime Layer
//!
//! Real-time driving of a machine on tokio. This layer is
//! **non-deterministic** (wall clock, session ids); outcomes still come only
//! from `game/`.

pub mod driver;

pub use driver::{
    session_seed, DriverCommand, DriverError, MachineDriver, MachineHandle, SessionSummary,
};
