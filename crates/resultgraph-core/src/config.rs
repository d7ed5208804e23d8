//! Engine configuration: ranking weights, score weights, render options.
//!
//! Everything is injected. No engine operation reads ambient state.

use crate::error::{EngineError, EngineResult};
use crate::filter::Filter;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Ranking Policy
// ============================================================================

/// Weights used by the path ranking pass.
///
/// `heavy_weight` marks an exclusion and must dominate any sum of
/// `light_weight` inclusion bonuses a path can collect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingPolicy {
    pub heavy_weight: f64,
    pub light_weight: f64,
    /// Support trees deeper than this are cut off while building rank trees.
    pub max_support_depth: usize,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            heavy_weight: 1000.0,
            light_weight: 1.0,
            max_support_depth: 32,
        }
    }
}

impl RankingPolicy {
    pub fn new(heavy_weight: f64, light_weight: f64) -> EngineResult<Self> {
        let policy = Self {
            heavy_weight,
            light_weight,
            ..Self::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(self.heavy_weight > self.light_weight && self.light_weight >= 0.0) {
            return Err(EngineError::InvalidPolicy {
                heavy: self.heavy_weight,
                light: self.light_weight,
            });
        }
        Ok(())
    }

    /// Rank assigned to an excluded path.
    pub fn exclusion_rank(&self, filter: Option<&Filter>) -> f64 {
        let extra = filter
            .and_then(|f| f.exclude_weight)
            .filter(|w| *w > 0.0)
            .unwrap_or(0.0);
        self.heavy_weight + extra
    }
}

// ============================================================================
// Score Weights
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoreWeights {
    pub confidence_weight: f64,
    pub novelty_weight: f64,
    pub clinical_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            confidence_weight: 1.0,
            novelty_weight: 0.1,
            clinical_weight: 1.0,
        }
    }
}

impl ScoreWeights {
    /// Preset that favors novel answers.
    pub fn novelty_boost() -> Self {
        Self {
            confidence_weight: 0.5,
            novelty_weight: 1.0,
            clinical_weight: 0.5,
        }
    }

    pub fn total(&self) -> f64 {
        self.confidence_weight + self.novelty_weight + self.clinical_weight
    }
}

// ============================================================================
// Render Options
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Nodes with at least this many incident edges are hubs.
    pub hub_degree: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { hub_degree: 4 }
    }
}

// ============================================================================
// Engine Config
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ranking: RankingPolicy,
    pub weights: ScoreWeights,
    pub render: RenderOptions,
}

impl EngineConfig {
    pub fn with_policy(mut self, policy: RankingPolicy) -> Self {
        self.ranking = policy;
        self
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_render(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.ranking.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| EngineError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.ranking.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_rejects_light_heavier_than_heavy() {
        assert!(RankingPolicy::new(1.0, 5.0).is_err());
        assert!(RankingPolicy::new(100.0, 1.0).is_ok());
    }

    #[test]
    fn exclude_weight_adds_to_heavy() {
        let policy = RankingPolicy::default();
        let plain = Filter::exclude("fda:approved");
        let weighted = Filter::exclude("fda:approved").with_exclude_weight(5.0);
        assert_eq!(policy.exclusion_rank(Some(&plain)), 1000.0);
        assert_eq!(policy.exclusion_rank(Some(&weighted)), 1005.0);
        assert_eq!(policy.exclusion_rank(None), 1000.0);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config = EngineConfig::from_json_str(r#"{"ranking": {"heavy_weight": 50.0}}"#).unwrap();
        assert_eq!(config.ranking.heavy_weight, 50.0);
        assert_eq!(config.ranking.light_weight, 1.0);
        assert_eq!(config.weights, ScoreWeights::default());
    }
}
