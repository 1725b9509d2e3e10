//! # foamcut packing
//!
//! 3D packing strategies for the foamcut cutting-stock engine.
//!
//! - [`GreedyPacker`]: deterministic first-fit-decreasing baseline
//! - [`GeneticPacker`]: population search over placement encodings
//! - [`AnnealingPacker`]: single-solution search with a cooling schedule
//!
//! Every strategy implements [`foamcut_core::Solver`] and expands piece and
//! stock quantities into instances before searching.

pub mod ga_packing;
pub mod greedy;
pub mod packing_utils;
pub mod sa_packing;

// Re-exports
pub use ga_packing::{run_ga_packing, GeneticOptions, GeneticPacker};
pub use greedy::{anchor_candidates, find_anchor_position, pack_greedy, GreedyPacker};
pub use packing_utils::{FeasibilityMode, PackingMetrics};
pub use sa_packing::{run_sa_packing, AnnealingOptions, AnnealingPacker};
pub use foamcut_core::{Error, OptimizationResult, Problem, Result, Solver};
