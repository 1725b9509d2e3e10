//! # foamcut
//!
//! 3D cutting-stock optimization for foam blocks.
//!
//! Rectangular pieces are placed into rectangular stock blocks by one of
//! four strategies, or by an orchestrator that combines them:
//! - **Greedy**: volume-descending first fit over corner anchors
//! - **Genetic**: population search over position/rotation chromosomes
//! - **Annealing**: simulated annealing over the same encoding
//! - **Guillotine**: shelf packing with a through-cut plan and time estimate
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use foamcut::{optimize, Mode, OptimizerConfig, Piece, StockBlock};
//!
//! let pieces = vec![Piece::new("cushion", 50.0, 40.0, 10.0).with_quantity(6)];
//! let stock = vec![StockBlock::new("block", 200.0, 100.0, 50.0).with_price(25.0)];
//!
//! let result = optimize(pieces, stock, OptimizerConfig::new().with_mode(Mode::Multi))?;
//! println!("{}: {:.1}% in {} blocks", result.strategy, result.efficiency, result.layouts.len());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Serialization of inputs, configuration and results

pub mod analysis;
pub mod config;
pub mod mode;
pub mod orchestrator;
pub mod strategy;

/// Shared types, geometry and search frameworks.
pub use foamcut_core as core;

/// Greedy, genetic and annealing packers.
pub use foamcut_packing as packing;

/// Guillotine engine and cut instructions.
pub use foamcut_cutting as cutting;

pub use config::OptimizerConfig;
pub use mode::{Mode, StrategyKind};
pub use orchestrator::{optimize, Optimizer};
pub use strategy::build_solver;

// Re-export commonly used types at root level
pub use foamcut_core::{
    progress_channel, AlgorithmComparison, CancellationToken, Error, Layout, OptimizationResult,
    Piece, Placement, Problem, ProgressCallback, ProgressInfo, Result, ResultSummary, Solver,
    StockBlock, Warning,
};
pub use foamcut_packing::FeasibilityMode;
