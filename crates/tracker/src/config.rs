//! Sampler configuration.

use std::env;

use serde::{Deserialize, Serialize};

use crate::{errors::ConfigError, source::WatchOptions};

/// Options recognised by [`PositionSampler`](crate::sampler::PositionSampler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Ask the host for the best fix quality it can deliver.
    pub high_accuracy_requested: bool,
    /// Maximum wait for a single fix before the host reports a timeout.
    pub fix_timeout_ms: u64,
    /// Oldest cached fix the host may hand back; 0 requires a fresh one.
    pub max_fix_age_ms: u64,
    /// Minimum wall-clock gap between two accepted samples.
    pub min_interval_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            high_accuracy_requested: true,
            fix_timeout_ms: 10_000,
            max_fix_age_ms: 0,
            min_interval_ms: 15_000,
        }
    }
}

impl SamplerConfig {
    pub fn with_min_interval_ms(mut self, ms: u64) -> Self {
        self.min_interval_ms = ms;
        self
    }

    pub fn with_fix_timeout_ms(mut self, ms: u64) -> Self {
        self.fix_timeout_ms = ms;
        self
    }

    pub fn with_max_fix_age_ms(mut self, ms: u64) -> Self {
        self.max_fix_age_ms = ms;
        self
    }

    pub fn with_high_accuracy(mut self, enabled: bool) -> Self {
        self.high_accuracy_requested = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fix_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fix_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `TRACKER_*` overrides from the environment on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("TRACKER_HIGH_ACCURACY") {
            config.high_accuracy_requested = parse_var("TRACKER_HIGH_ACCURACY", &value)?;
        }
        if let Some(value) = lookup("TRACKER_FIX_TIMEOUT_MS") {
            config.fix_timeout_ms = parse_var("TRACKER_FIX_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("TRACKER_MAX_FIX_AGE_MS") {
            config.max_fix_age_ms = parse_var("TRACKER_MAX_FIX_AGE_MS", &value)?;
        }
        if let Some(value) = lookup("TRACKER_MIN_INTERVAL_MS") {
            config.min_interval_ms = parse_var("TRACKER_MIN_INTERVAL_MS", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            enable_high_accuracy: self.high_accuracy_requested,
            timeout_ms: self.fix_timeout_ms,
            maximum_age_ms: self.max_fix_age_ms,
        }
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
    })
}
