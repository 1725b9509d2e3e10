//! # foamcut cutting
//!
//! Guillotine-constrained packing for saws that only make full-length
//! straight cuts.
//!
//! Pieces are shelf-packed in the footprint plane of each block; every
//! placement edge that stops short of the block registers a cut. The
//! resulting [`CuttingInstructions`](foamcut_core::CuttingInstructions)
//! list all horizontal cuts first, then all vertical cuts, with a time
//! estimate from [`GuillotineConfig::seconds_per_cut`].

pub mod config;
pub mod engine;
pub mod instructions;
pub mod shelf;

// Re-exports
pub use config::GuillotineConfig;
pub use engine::GuillotineEngine;
pub use instructions::{block_instructions, estimate_time, generate_instructions};
pub use shelf::{by_footprint_desc, fill_block, fits_upright, footprint_rotations};
