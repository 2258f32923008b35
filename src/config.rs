//! Machine Configuration
//!
//! Every tunable of a machine in one serde struct. Defaults reproduce the
//! classic three-reel cabinet; a JSON file may override any subset.

use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::payout::PayoutEngine;
use crate::game::reel::ReelConfig;
use crate::TICK_RATE;

/// Highest accepted tick rate (Hz).
pub const MAX_TICK_RATE: u32 = 1000;

/// Configuration errors. All are raised before any machine state exists.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Tick rate outside `1..=MAX_TICK_RATE`.
    #[error("tick rate must be between 1 and {max} Hz (got {0})", max = MAX_TICK_RATE)]
    InvalidTickRate(u32),

    /// A machine needs at least one reel slot.
    #[error("no reel slots configured")]
    NoReels,

    /// Bets must be positive.
    #[error("invalid bet: {0}")]
    InvalidBet(u64),

    /// A duration is negative or not finite.
    #[error("{field} must be a finite, non-negative number of seconds (got {value})")]
    InvalidDuration {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// A reel rate is negative or not finite.
    #[error("reel {reel}: {field} must be finite and non-negative (got {value})")]
    InvalidReelRate {
        /// Reel slot
        reel: usize,
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Machine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Reel slots in payline order; `null` leaves a slot without a reel.
    pub reels: Vec<Option<ReelConfig>>,
    /// Time all reels spin before the first stop.
    pub spin_duration_secs: f64,
    /// Wait before each individual reel stop.
    pub delay_between_stops_secs: f64,
    /// Longest wait for reels to settle after the last stop.
    pub settle_timeout_secs: f64,
    /// Bet used when a spin request does not name one.
    pub base_bet: u64,
    /// Credits in the wallet at startup.
    pub starting_balance: u64,
    /// Payout table.
    pub payout: PayoutEngine,
    /// RNG seed. A session seed is derived when absent.
    pub seed: Option<u64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            reels: vec![Some(ReelConfig::default()); 3],
            spin_duration_secs: 2.5,
            delay_between_stops_secs: 0.7,
            settle_timeout_secs: 10.0,
            base_bet: 10,
            starting_balance: 1000,
            payout: PayoutEngine::default(),
            seed: None,
        }
    }
}

impl MachineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check every field; the first problem found is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 || self.tick_rate > MAX_TICK_RATE {
            return Err(ConfigError::InvalidTickRate(self.tick_rate));
        }
        if self.reels.is_empty() {
            return Err(ConfigError::NoReels);
        }
        if self.base_bet == 0 {
            return Err(ConfigError::InvalidBet(self.base_bet));
        }

        for (field, value) in [
            ("spin_duration_secs", self.spin_duration_secs),
            ("delay_between_stops_secs", self.delay_between_stops_secs),
            ("settle_timeout_secs", self.settle_timeout_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDuration { field, value });
            }
        }

        for (reel, slot) in self.reels.iter().enumerate() {
            let Some(reel_config) = slot else { continue };
            for (field, value) in [
                ("spin_rate", reel_config.spin_rate),
                ("deceleration", reel_config.deceleration),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::InvalidReelRate { reel, field, value });
                }
            }
        }

        Ok(())
    }

    /// Seconds per tick.
    pub fn tick_dt(&self) -> f64 {
        1.0 / self.tick_rate as f64
    }

    /// Whole ticks closest to `secs`.
    pub fn ticks_for(&self, secs: f64) -> u64 {
        (secs * self.tick_rate as f64).round().max(0.0) as u64
    }

    /// Ticks of full spin before the stop sequence.
    pub fn spin_ticks(&self) -> u64 {
        self.ticks_for(self.spin_duration_secs)
    }

    /// Ticks between consecutive reel stops.
    pub fn stop_delay_ticks(&self) -> u64 {
        self.ticks_for(self.delay_between_stops_secs)
    }

    /// Ticks the settle barrier waits before force-settling.
    pub fn settle_timeout_ticks(&self) -> u64 {
        self.ticks_for(self.settle_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MachineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reels.len(), 3);
        assert_eq!(config.spin_ticks(), 150);
        assert_eq!(config.stop_delay_ticks(), 42);
        assert_eq!(config.settle_timeout_ticks(), 600);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MachineConfig::from_json_str(r#"{ "base_bet": 25, "seed": 7 }"#).unwrap();
        assert_eq!(config.base_bet, 25);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.starting_balance, 1000);
        assert_eq!(config.payout.multipliers, vec![2, 3, 5, 10]);
    }

    #[test]
    fn test_json_missing_reel_slot() {
        let json = r#"{ "reels": [ { "symbol_count": 6 }, null, {} ] }"#;
        let config = MachineConfig::from_json_str(json).unwrap();
        assert_eq!(config.reels.len(), 3);
        assert_eq!(config.reels[0].as_ref().map(|r| r.symbol_count), Some(6));
        assert!(config.reels[1].is_none());
        assert_eq!(config.reels[2], Some(ReelConfig::default()));
    }

    #[test]
    fn test_rejects_zero_bet() {
        let config = MachineConfig { base_bet: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBet(0))));
    }

    #[test]
    fn test_rejects_bad_timing() {
        let config = MachineConfig { delay_between_stops_secs: -0.1, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration { field: "delay_between_stops_secs", .. })
        ));

        let config = MachineConfig { spin_duration_secs: f64::NAN, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_reel_rates() {
        let mut config = MachineConfig::default();
        config.reels[2] = Some(ReelConfig { deceleration: -1.0, ..Default::default() });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidReelRate { reel: 2, field: "deceleration", .. })
        ));
    }

    #[test]
    fn test_rejects_empty_and_zero_rate() {
        let config = MachineConfig { reels: Vec::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::NoReels)));

        let config = MachineConfig { tick_rate: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTickRate(0))));
    }

    #[test]
    fn test_rejects_tick_rate_above_max() {
        let config = MachineConfig { tick_rate: MAX_TICK_RATE, ..Default::default() };
        assert!(config.validate().is_ok());

        let config = MachineConfig { tick_rate: 2_000_000, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTickRate(2_000_000))
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            MachineConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_zero_symbol_reel_is_accepted() {
        let json = r#"{ "reels": [ { "symbol_count": 0 }, {}, {} ] }"#;
        assert!(MachineConfig::from_json_str(json).is_ok());
    }
}
