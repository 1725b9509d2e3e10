//! Job files: pieces, stock and an optional optimizer configuration.

use anyhow::Context;
use foamcut::{Mode, OptimizerConfig, Piece, StockBlock, StrategyKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A JSON job file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub pieces: Vec<Piece>,
    pub stock: Vec<StockBlock>,
    /// Shorthand for `config.mode`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    /// Shorthand for `config.algorithms`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithms: Option<Vec<StrategyKind>>,
    #[serde(default)]
    pub config: OptimizerConfig,
}

impl Job {
    /// Loads a job from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read job file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse job file {}", path.display()))
    }

    /// `config` with the top-level shorthands applied.
    pub fn effective_config(&self) -> OptimizerConfig {
        let mut config = self.config.clone();
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(algorithms) = &self.algorithms {
            config.algorithms = algorithms.clone();
        }
        config
    }

    /// A small furniture order printed by `foamcut example`.
    pub fn example() -> Self {
        Self {
            pieces: vec![
                Piece::new("seat", 60.0, 60.0, 12.0)
                    .with_label("Seat cushion")
                    .with_quantity(4),
                Piece::new("back", 60.0, 45.0, 10.0)
                    .with_label("Back cushion")
                    .with_quantity(4),
                Piece::new("arm", 70.0, 20.0, 15.0)
                    .with_label("Armrest pad")
                    .with_quantity(2),
                Piece::new("bolster", 40.0, 20.0, 20.0)
                    .with_label("Bolster")
                    .with_color("#c0392b"),
            ],
            stock: vec![
                StockBlock::new("std", 200.0, 120.0, 60.0)
                    .with_label("Standard block")
                    .with_quantity(2)
                    .with_price(85.0),
                StockBlock::new("slab", 120.0, 120.0, 30.0)
                    .with_label("Slab")
                    .with_price(40.0),
            ],
            mode: Some(Mode::Multi),
            algorithms: None,
            config: OptimizerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foamcut::Mode;

    #[test]
    fn test_parse_minimal_job() {
        let job: Job = serde_json::from_str(
            r#"{
                "pieces": [{"id": "a", "length": 10, "width": 10, "height": 5, "quantity": 3}],
                "stock": [{"id": "s", "length": 100, "width": 100, "height": 50}]
            }"#,
        )
        .unwrap();
        assert_eq!(job.pieces[0].quantity, 3);
        assert_eq!(job.stock[0].quantity, 1);
        assert_eq!(job.effective_config().mode, Mode::Adaptive);
    }

    #[test]
    fn test_shorthands_override_config() {
        let job: Job = serde_json::from_str(
            r#"{
                "pieces": [{"id": "a", "length": 10, "width": 10, "height": 5}],
                "stock": [{"id": "s", "length": 100, "width": 100, "height": 50}],
                "mode": "multi",
                "algorithms": ["basic", "guillotine"],
                "config": {"mode": "genetic", "seed": 9}
            }"#,
        )
        .unwrap();
        let config = job.effective_config();
        assert_eq!(config.mode, Mode::Multi);
        assert_eq!(
            config.algorithms,
            vec![StrategyKind::Greedy, StrategyKind::Guillotine]
        );
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn test_example_is_valid() {
        let job = Job::example();
        assert!(foamcut::Problem::new(job.pieces, job.stock).is_ok());
    }
}
