//! Configuration for the trigger event system.

use crate::error::TriggerError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How participant order inside a raw overlap is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairOrder {
    /// Keep the order the physics step reported.
    ///
    /// A producer that flips the pair between frames will see `Exit` + `Enter`
    /// instead of `Stay` for a persisting contact.
    #[default]
    AsReported,

    /// Reorder every pair so that participant A is the smaller entity.
    Canonical,
}

/// How the fan-out stage walks the diff result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    /// One pass in result order. Buffers receive events sorted.
    #[default]
    Sequential,

    /// Parallel over result records once the result reaches
    /// `parallel_threshold`. Order inside a buffer is then unspecified.
    Parallel,
}

/// Configuration for [`TriggerEventSystem`](crate::TriggerEventSystem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Pair order handling at collection time
    pub pair_order: PairOrder,

    /// Fan-out strategy
    pub distribution: DistributionMode,

    /// Minimum result length before parallel fan-out kicks in
    pub parallel_threshold: usize,

    /// Initial capacity of each frame buffer
    pub initial_capacity: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            pair_order: PairOrder::AsReported,
            distribution: DistributionMode::Sequential,
            parallel_threshold: 512,
            initial_capacity: 64,
        }
    }
}

impl TriggerConfig {
    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, TriggerError> {
        serde_json::from_str(json).map_err(|e| TriggerError::config(format!("Invalid JSON: {}", e)))
    }

    /// Loads a config from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TriggerError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| TriggerError::config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Sets the pair order.
    pub fn with_pair_order(mut self, pair_order: PairOrder) -> Self {
        self.pair_order = pair_order;
        self
    }

    /// Sets the distribution mode.
    pub fn with_distribution(mut self, distribution: DistributionMode) -> Self {
        self.distribution = distribution;
        self
    }

    /// Sets the parallel fan-out threshold.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keeps_reported_order() {
        let config = TriggerConfig::default();
        assert_eq!(config.pair_order, PairOrder::AsReported);
        assert_eq!(config.distribution, DistributionMode::Sequential);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = TriggerConfig::from_json(r#"{ "pair_order": "canonical" }"#).unwrap();
        assert_eq!(config.pair_order, PairOrder::Canonical);
        assert_eq!(config.parallel_threshold, 512);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = TriggerConfig::from_json(r#"{ "pair_order": "sideways" }"#).unwrap_err();
        assert!(matches!(err, TriggerError::Config(_)));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = TriggerConfig::load("/nonexistent/trigger.json").unwrap_err();
        assert!(matches!(err, TriggerError::Config(_)));
    }

    #[test]
    fn test_builders() {
        let config = TriggerConfig::default()
            .with_pair_order(PairOrder::Canonical)
            .with_distribution(DistributionMode::Parallel)
            .with_parallel_threshold(2);
        assert_eq!(config.pair_order, PairOrder::Canonical);
        assert_eq!(config.distribution, DistributionMode::Parallel);
        assert_eq!(config.parallel_threshold, 2);
    }
}
