//! Heat-island transformation pipeline.
//!
//! Raw readings are normalized once, then each zone runs independently
//! through cleaning, rolling features, seasonal decomposition, daily
//! aggregation, hotspot extraction and intervention-window ranking.

pub mod aggregate;
pub mod analyzer;
pub mod clean;
pub mod hotspot;
pub mod normalize;
pub mod rank;
pub mod rolling;
pub mod seasonal;
pub mod types;
pub mod utility;
