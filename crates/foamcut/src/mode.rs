//! Optimization modes and strategy names.

use foamcut_core::Error;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single packing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StrategyKind {
    /// Deterministic first-fit-decreasing.
    #[cfg_attr(feature = "serde", serde(alias = "basic"))]
    Greedy,
    /// Genetic search.
    Genetic,
    /// Simulated annealing.
    Annealing,
    /// Guillotine shelf packing.
    Guillotine,
}

impl StrategyKind {
    /// Every strategy.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Greedy,
        StrategyKind::Genetic,
        StrategyKind::Annealing,
        StrategyKind::Guillotine,
    ];

    /// Name used in reports.
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Greedy => "greedy",
            StrategyKind::Genetic => "genetic",
            StrategyKind::Annealing => "annealing",
            StrategyKind::Guillotine => "guillotine",
        }
    }

    /// Returns true if the strategy uses randomness.
    pub fn is_stochastic(self) -> bool {
        matches!(self, StrategyKind::Genetic | StrategyKind::Annealing)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" | "basic" => Ok(StrategyKind::Greedy),
            "genetic" => Ok(StrategyKind::Genetic),
            "annealing" => Ok(StrategyKind::Annealing),
            "guillotine" => Ok(StrategyKind::Guillotine),
            _ => Err(Error::UnknownStrategy(s.to_string())),
        }
    }
}

/// What an optimize call runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Mode {
    /// Greedy packer only.
    Basic,
    /// Genetic search only.
    Genetic,
    /// Simulated annealing only.
    Annealing,
    /// Guillotine engine only.
    Guillotine,
    /// Run several strategies and keep the most efficient.
    Multi,
    /// Greedy, genetic and annealing in sequence; keep the best stage.
    Hybrid,
    /// Pick strategies from the problem size.
    #[default]
    Adaptive,
}

impl Mode {
    /// Every mode.
    pub const ALL: [Mode; 7] = [
        Mode::Basic,
        Mode::Genetic,
        Mode::Annealing,
        Mode::Guillotine,
        Mode::Multi,
        Mode::Hybrid,
        Mode::Adaptive,
    ];

    /// Lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Basic => "basic",
            Mode::Genetic => "genetic",
            Mode::Annealing => "annealing",
            Mode::Guillotine => "guillotine",
            Mode::Multi => "multi",
            Mode::Hybrid => "hybrid",
            Mode::Adaptive => "adaptive",
        }
    }

    /// One-line description.
    pub fn description(self) -> &'static str {
        match self {
            Mode::Basic => "deterministic first-fit-decreasing packer",
            Mode::Genetic => "genetic search over placements and rotations",
            Mode::Annealing => "simulated annealing with a geometric cooling schedule",
            Mode::Guillotine => "shelf packing restricted to straight through-cuts",
            Mode::Multi => "run several strategies and keep the most efficient",
            Mode::Hybrid => "greedy, genetic and annealing stages; keep the best",
            Mode::Adaptive => "choose strategies from the problem size",
        }
    }

    /// The strategy a single-strategy mode runs.
    pub fn single_strategy(self) -> Option<StrategyKind> {
        match self {
            Mode::Basic => Some(StrategyKind::Greedy),
            Mode::Genetic => Some(StrategyKind::Genetic),
            Mode::Annealing => Some(StrategyKind::Annealing),
            Mode::Guillotine => Some(StrategyKind::Guillotine),
            Mode::Multi | Mode::Hybrid | Mode::Adaptive => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Mode::ALL
            .into_iter()
            .find(|m| m.name() == lower)
            .ok_or_else(|| Error::UnknownStrategy(s.to_string()))
    }
}
