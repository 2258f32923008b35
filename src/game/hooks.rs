//! External Collaborators
//!
//! Narrow contracts for the things the simulation drives but does not own:
//! drawing reels, the spin sound loop, and the balance display. None of
//! them can influence an outcome.

use tracing::info;

use crate::game::machine::{SpinRejected, SpinReport};

/// Draws a reel at an angle.
pub trait Renderer: Send {
    /// Called every tick for every present reel.
    fn render(&mut self, reel: usize, position: f64);
}

/// Ambient spin sound.
pub trait AudioCue: Send {
    /// Some reel began spinning while all were at rest.
    fn start_ambient(&mut self);
    /// The last spinning reel came to rest.
    fn stop_ambient(&mut self);
}

/// Player-facing text output.
pub trait DisplayReporter: Send {
    /// A spin was accepted; `balance` is after the bet was taken.
    fn spinning(&mut self, balance: u64) {
        let _ = balance;
    }

    /// A cycle completed.
    fn report(&mut self, report: &SpinReport);

    /// A spin request was refused.
    fn rejected(&mut self, rejection: &SpinRejected);
}

/// Renderer that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _reel: usize, _position: f64) {}
}

/// Audio that plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioCue for NullAudio {
    fn start_ambient(&mut self) {}
    fn stop_ambient(&mut self) {}
}

/// Reporter that writes to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl DisplayReporter for TracingReporter {
    fn spinning(&mut self, balance: u64) {
        info!("Spinning... Balance: {}", balance);
    }

    fn report(&mut self, report: &SpinReport) {
        for line in report.to_string().lines() {
            info!("{}", line);
        }
    }

    fn rejected(&mut self, rejection: &SpinRejected) {
        info!("{}", rejection);
    }
}
