use crate::error::{LabError, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Table parameters for a lab session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabConfig {
    /// Number of slots in a freshly created or reset table.
    pub initial_size: usize,
    /// Growth is triggered once `count / size` reaches this value.
    pub max_load_factor: f64,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            initial_size: Self::DEFAULT_INITIAL_SIZE,
            max_load_factor: Self::DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

impl LabConfig {
    pub const DEFAULT_INITIAL_SIZE: usize = 10;
    pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.7;
    pub const ENV_INITIAL_SIZE: &'static str = "PROBE_BUCKETS_INITIAL_SIZE";
    pub const ENV_MAX_LOAD_FACTOR: &'static str = "PROBE_BUCKETS_MAX_LOAD_FACTOR";

    pub fn with_initial_size(mut self, initial_size: usize) -> Self {
        self.initial_size = initial_size;
        self
    }

    pub fn with_max_load_factor(mut self, max_load_factor: f64) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_size == 0 {
            return Err(LabError::configuration("initial size must be at least 1"));
        }
        if !(self.max_load_factor > 0.0 && self.max_load_factor < 1.0) {
            return Err(LabError::configuration(format!(
                "max load factor must be in (0, 1), got {}",
                self.max_load_factor
            )));
        }
        Ok(())
    }

    /// Starts from the defaults and overrides whatever the environment provides.
    pub fn from_env() -> Result<Self> {
        let mut config: LabConfig = Self::default();
        if let Ok(raw) = env::var(Self::ENV_INITIAL_SIZE) {
            config.initial_size = raw.trim().parse::<usize>().map_err(|e| {
                LabError::configuration(format!("{}={:?}: {}", Self::ENV_INITIAL_SIZE, raw, e))
            })?;
        }
        if let Ok(raw) = env::var(Self::ENV_MAX_LOAD_FACTOR) {
            config.max_load_factor = raw.trim().parse::<f64>().map_err(|e| {
                LabError::configuration(format!("{}={:?}: {}", Self::ENV_MAX_LOAD_FACTOR, raw, e))
            })?;
        }
        config.validate()?;
        Ok(config)
    }
}
