//! Statistical reductions and weighted percentiles
//!
//! # Organization
//!
//! - [`operations`]: the [`StatOperation`] set and the [`StatisticalReduction`] trait
//! - [`reduce`]: NaN-skipping reductions along one axis
//! - [`percentile`]: percentiles from cumulative weights and take-along-axis

pub mod operations;
pub mod percentile;
pub mod reduce;

pub use operations::{StatOperation, StatisticalReduction};
pub use percentile::{argtake, cumulative_weights, get_percentile, sort_along_axis};
pub use reduce::{max_axis, mean_axis, min_axis, sum_axis};
