//! # foamcut core
//!
//! Shared types and search frameworks for the foamcut 3D cutting-stock engine.
//!
//! ## Core Components
//!
//! - **Data model**: [`Piece`], [`StockBlock`] and the expanded [`Problem`] arena
//! - **Geometry kernel**: [`overlaps`], [`fits`], [`rotations`] over axis-aligned boxes
//! - **Results**: [`Layout`], [`OptimizationResult`], warnings and reports
//! - **Solver trait**: common interface for every strategy, with progress and cancellation
//! - **GA / SA frameworks**: generic runners reused by the packing strategies
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod cut_plan;
pub mod error;
pub mod ga;
pub mod geometry;
pub mod model;
pub mod placement;
pub mod problem;
pub mod report;
pub mod result;
pub mod sa;
pub mod solver;

// Re-exports
pub use cut_plan::{
    BlockInstructions, Cut, CutAxis, CuttingInstructions, CuttingPattern, CuttingPhase,
    CuttingSummary,
};
pub use error::{Error, Result};
pub use ga::{GaConfig, GaProblem, GaProgress, GaResult, GaRunner, Individual};
pub use geometry::{fits, overlaps, rotations, Aabb3, Rotation, Vec3, EPS};
pub use model::{Piece, StockBlock};
pub use placement::Placement;
pub use problem::{PieceInstance, Problem, StockInstance};
pub use report::{
    AdaptiveAnalysis, AlgorithmComparison, AlgorithmData, ComparisonStats, ComplexityTier,
    ConvergenceSummary, CoolingRecord, GenerationRecord, HybridAnalysis, HybridStage,
    RankedResult, StrategyFailureRecord, StrategyRun,
};
pub use result::{Layout, OptimizationResult, ResultSummary, UnplacedReason, Warning};
pub use sa::{
    CoolingSchedule, NeighborhoodOperator, SaConfig, SaProblem, SaResult, SaRunner, SaSample,
    SaSolution,
};
pub use solver::{
    progress_channel, rng_from_seed, CancellationToken, ProgressCallback, ProgressInfo, Solver,
};
