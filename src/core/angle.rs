//! Angular Arithmetic
//!
//! Degree helpers shared by the reel integrator and symbol lookup.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  A reel with N symbols places symbol i at i * (360 / N)     │
//! │                                                             │
//! │   N = 4:   0 ──── 90 ──── 180 ──── 270 ──── (360 = 0)       │
//! │           [0]     [1]     [2]      [3]                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

/// Degrees in one full reel revolution.
pub const DEGREES_PER_TURN: f64 = 360.0;

/// Wrap an angle into `[0, 360)`.
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(DEGREES_PER_TURN);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= DEGREES_PER_TURN {
        0.0
    } else {
        wrapped
    }
}

/// Angular spacing between adjacent symbols.
#[inline]
pub fn symbol_spacing(symbol_count: u32) -> f64 {
    DEGREES_PER_TURN / symbol_count as f64
}

/// Angle at which a symbol sits on the reel.
#[inline]
pub fn symbol_angle(index: u32, symbol_count: u32) -> f64 {
    index as f64 * symbol_spacing(symbol_count)
}

/// Symbol nearest to an angle.
///
/// `symbol_count` must be non-zero.
pub fn nearest_symbol(angle: f64, symbol_count: u32) -> u32 {
    let steps = (normalize_degrees(angle) / symbol_spacing(symbol_count)).round();
    // steps is in [0, symbol_count]; the upper edge wraps to symbol 0
    (steps.max(0.0) as u64 % symbol_count as u64) as u32
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
#[inline]
pub fn move_towards(current: f64, target: f64, max_delta: f64) -> f64 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}
