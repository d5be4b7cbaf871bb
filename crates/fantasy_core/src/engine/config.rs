//! Engine configuration with named presets.

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};

/// Hard cap on trials per run.
pub const MAX_TRIALS: usize = 1_000_000;

/// Performance model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Most recent observations kept per unit (default: 10)
    pub window_size: usize,
    /// Sample size at which a unit's own history gets full weight (default: 6)
    pub reference_window_size: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            reference_window_size: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Season trials per run (default: 10_000)
    pub num_trials: usize,
    /// Trials per parallel batch; cancellation is checked between batches (default: 500)
    pub batch_size: usize,
    /// Fixed master seed. `None` draws one from the thread RNG.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Lineup draws per WAR estimate (default: 10_000)
    pub war_trials: usize,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_trials: 10_000,
            batch_size: 500,
            seed: None,
            war_trials: 10_000,
            performance: PerformanceConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Fast, noisy runs for interactive exploration.
    pub fn quick() -> Self {
        Self {
            num_trials: 1_000,
            batch_size: 250,
            war_trials: 2_000,
            ..Self::default()
        }
    }

    /// Final numbers for reports.
    pub fn thorough() -> Self {
        Self {
            num_trials: 50_000,
            batch_size: 1_000,
            war_trials: 50_000,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_trials(mut self, num_trials: usize) -> Self {
        self.num_trials = num_trials;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_trials == 0 || self.num_trials > MAX_TRIALS {
            return Err(SimError::InvalidConfig(format!(
                "num_trials must be in 1..={MAX_TRIALS}, got {}",
                self.num_trials
            )));
        }
        if self.war_trials == 0 || self.war_trials > MAX_TRIALS {
            return Err(SimError::InvalidConfig(format!(
                "war_trials must be in 1..={MAX_TRIALS}, got {}",
                self.war_trials
            )));
        }
        if self.batch_size == 0 {
            return Err(SimError::InvalidConfig("batch_size must be positive".into()));
        }
        if self.performance.reference_window_size == 0 || self.performance.window_size == 0 {
            return Err(SimError::InvalidConfig(
                "performance windows must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Master seed for this run.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}
