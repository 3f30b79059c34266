//! Configuration for the development engine.
//!
//! All configuration is loaded from environment variables, each with a
//! default suited to a local viewer on `ws://127.0.0.1:9001`.

use std::time::Duration;

use crate::error::DevEngineError;

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Host address to bind to.
    pub host: String,
    /// TCP port to listen on. `0` picks an ephemeral port.
    pub port: u16,
    /// Time between ticks.
    pub tick_interval: Duration,
    /// Cells live in `[-range, range]` on each axis.
    pub range: u16,
    /// Random cells rewritten on every tick.
    pub flips_per_tick: u32,
    /// Seed for the cell-flip generator.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 9001,
            tick_interval: Duration::from_millis(100),
            range: 25,
            flips_per_tick: 8,
            seed: 137,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `DEVENGINE_HOST` -- bind address (default `127.0.0.1`)
    /// - `DEVENGINE_PORT` -- listen port (default `9001`)
    /// - `DEVENGINE_TICK_MS` -- tick interval in milliseconds (default `100`)
    /// - `DEVENGINE_RANGE` -- lattice half-extent (default `25`)
    /// - `DEVENGINE_FLIPS_PER_TICK` -- random cells per tick (default `8`)
    /// - `DEVENGINE_SEED` -- RNG seed (default `137`)
    ///
    /// # Errors
    ///
    /// Returns [`DevEngineError::Config`] if a variable does not parse.
    pub fn from_env() -> Result<Self, DevEngineError> {
        let defaults = Self::default();

        let host = std::env::var("DEVENGINE_HOST").unwrap_or(defaults.host);
        let port: u16 = env_or("DEVENGINE_PORT", defaults.port)?;
        let tick_ms: u64 = env_or("DEVENGINE_TICK_MS", 100)?;
        let range: u16 = env_or("DEVENGINE_RANGE", defaults.range)?;
        let flips_per_tick: u32 = env_or("DEVENGINE_FLIPS_PER_TICK", defaults.flips_per_tick)?;
        let seed: u64 = env_or("DEVENGINE_SEED", defaults.seed)?;

        let config = Self {
            host,
            port,
            tick_interval: Duration::from_millis(tick_ms),
            range,
            flips_per_tick,
            seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the tick loop cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`DevEngineError::Config`] for a zero tick interval.
    pub fn validate(&self) -> Result<(), DevEngineError> {
        if self.tick_interval.is_zero() {
            return Err(DevEngineError::Config(
                "tick interval must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Parse an optional environment variable, falling back to `default`.
fn env_or<T>(name: &str, default: T) -> Result<T, DevEngineError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| DevEngineError::Config(format!("invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}
