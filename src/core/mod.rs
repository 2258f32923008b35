//! Core deterministic primitives.
//!
//! Everything the simulation needs that is not slot-specific: angle math,
//! the seeded PRNG and state hashing.

pub mod angle;
pub mod rng;
pub mod hash;

// Re-export core types
pub use angle::{normalize_degrees, DEGREES_PER_TURN};
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash};
