//! Dimension-aware variables
//!
//! A [`Variable`] is anything that can describe itself (name, unit,
//! dimensions) and produce a [`Slice`] for per-dimension coordinate bounds.
//!
//! - [`StoredVariable`]: data resident in memory
//! - [`DerivedVariable`]: forwards to another variable under a new name
//! - [`FunctionVariable`]: piecewise functions evaluated on a synthesized grid

pub mod derived;
pub mod function;
pub mod stored;

pub use derived::DerivedVariable;
pub use function::FunctionVariable;
pub use stored::StoredVariable;

use crate::errors::{PlotVarError, Result};
pub use crate::interp::Bounds;
use crate::slice::Slice;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Plot axis a dimension prefers to be drawn along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis2D {
    X,
    Y,
}

/// Value type of a dimension's coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Float,
    /// Day numbers as produced by [`crate::dates::date_to_num`]
    Datetime,
}

/// Descriptive metadata of one dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionInfo {
    pub label: String,
    pub unit: String,
    pub preferred_axis: Option<Axis2D>,
    pub datatype: DataType,
    pub reversed: bool,
}

/// Capability set shared by all variables.
///
/// The `*_raw` accessors report what the variable itself knows; the plain
/// accessors are what a consumer should display and default to the raw ones.
pub trait Variable: fmt::Debug + Send + Sync {
    /// Internal name
    fn name_raw(&self) -> String;

    /// Name as addressed by consumers
    fn name(&self) -> String {
        self.name_raw()
    }

    /// Descriptive name
    fn long_name(&self) -> String {
        String::new()
    }

    fn unit(&self) -> String {
        String::new()
    }

    /// Dimension names as stored
    fn dimensions_raw(&self) -> Vec<String>;

    /// Dimension names as addressed by consumers
    fn dimensions(&self) -> Vec<String> {
        self.dimensions_raw()
    }

    fn dimension_info(&self, _dimension: &str) -> DimensionInfo {
        DimensionInfo::default()
    }

    fn has_reversed_dimensions(&self) -> bool {
        false
    }

    /// Number of data items produced per grid point
    fn item_count(&self) -> usize {
        1
    }

    /// Extent per dimension, `None` when it depends on the request
    fn shape(&self) -> Option<Vec<usize>>;

    /// Data and coordinates covering `bounds` (one pair per dimension, or an
    /// empty list for everything).
    fn get_slice(&self, bounds: &[Bounds]) -> Result<Slice>;
}

/// Unbounded request for `ndim` dimensions.
#[must_use]
pub fn unbounded(ndim: usize) -> Vec<Bounds> {
    vec![(None, None); ndim]
}

/// Snapshot a variable into memory with an unbounded request.
pub fn materialize(variable: &dyn Variable) -> Result<StoredVariable> {
    let dimensions = variable.dimensions();
    let slice = variable.get_slice(&unbounded(dimensions.len()))?;
    let mut stored = StoredVariable::new(variable.name(), slice)?
        .with_long_name(variable.long_name())
        .with_unit(variable.unit())
        .with_reversed_dimensions(variable.has_reversed_dimensions());
    for dimension in &dimensions {
        stored = stored.with_dimension_info(dimension, variable.dimension_info(dimension));
    }
    Ok(stored)
}

/// Bounds list normalized to one pair per dimension.
pub(crate) fn expand_bounds(bounds: &[Bounds], ndim: usize) -> Result<Vec<Bounds>> {
    if bounds.is_empty() {
        return Ok(unbounded(ndim));
    }
    if bounds.len() != ndim {
        return Err(PlotVarError::shape_mismatch(format!(
            "{} bound pairs supplied for a variable with {ndim} dimensions",
            bounds.len()
        )));
    }
    Ok(bounds.to_vec())
}
