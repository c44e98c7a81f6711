//! Variables whose data are resident in memory

use super::{expand_bounds, DimensionInfo, Variable};
use crate::errors::Result;
use crate::interp::{find_indices, get_bound_indices, Bounds};
use crate::slice::{Slice, SliceArg};
use ndarray::{ArrayD, Ix1};
use std::collections::HashMap;
use tracing::{debug, trace};

/// A complete [`Slice`] plus descriptive metadata.
///
/// Requests are answered by translating coordinate bounds into index ranges
/// and sub-slicing the resident data.
#[derive(Debug, Clone)]
pub struct StoredVariable {
    name: String,
    long_name: String,
    unit: String,
    dimension_info: HashMap<String, DimensionInfo>,
    reversed_dimensions: bool,
    slice: Slice,
}

impl StoredVariable {
    /// Wrap a slice holding data and center coordinates for every dimension.
    ///
    /// Missing interface coordinates are generated, which requires 1-D
    /// center coordinates.
    pub fn new(name: impl Into<String>, mut slice: Slice) -> Result<Self> {
        slice.data()?;
        slice.check()?;
        for i in 0..slice.ndim() {
            slice.coord(i)?;
        }
        if slice.coords_stag.iter().any(Option::is_none) {
            slice.generate_staggered()?;
        }
        Ok(Self {
            name: name.into(),
            long_name: String::new(),
            unit: String::new(),
            dimension_info: HashMap::new(),
            reversed_dimensions: false,
            slice,
        })
    }

    /// Variable over 1-D coordinate vectors, one per dimension.
    pub fn from_arrays(
        name: impl Into<String>,
        dimensions: Vec<String>,
        coords: Vec<ArrayD<f64>>,
        data: ArrayD<f64>,
    ) -> Result<Self> {
        Self::new(name, Slice::with_centers(dimensions, coords, data)?)
    }

    #[must_use]
    pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = long_name.into();
        self
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    #[must_use]
    pub fn with_dimension_info(mut self, dimension: impl Into<String>, info: DimensionInfo) -> Self {
        self.dimension_info.insert(dimension.into(), info);
        self
    }

    #[must_use]
    pub fn with_reversed_dimensions(mut self, reversed: bool) -> Self {
        self.reversed_dimensions = reversed;
        self
    }

    /// The resident slice
    #[must_use]
    pub fn slice(&self) -> &Slice {
        &self.slice
    }

    /// Half-open index range along dimension `i` covering `bounds`.
    fn index_range(&self, i: usize, bounds: Bounds) -> Result<(usize, usize)> {
        let coord = self.slice.coord(i)?;
        let extent = self.slice.data()?.shape()[i];
        let (lower, upper) = bounds;

        let (start, stop) = if coord.ndim() == 1 {
            let (start, stop) = find_indices(bounds, coord.view().into_dimensionality::<Ix1>()?);
            if start > stop {
                let start = start.clamp(0, extent as isize) as usize;
                (start, start)
            } else {
                (start as usize, stop as usize + 1)
            }
        } else {
            // Widen by one lane on each bounded side so the request is covered.
            let (start, stop) = get_bound_indices(coord.view(), i, lower, upper)?;
            let start = if lower.is_some() { start.saturating_sub(1) } else { start };
            let stop = if upper.is_some() { (stop + 1).min(extent) } else { stop };
            (start, stop.max(start))
        };
        trace!(
            dimension = %self.slice.dimensions[i],
            ?lower,
            ?upper,
            start,
            stop,
            "translated coordinate bounds"
        );
        Ok((start, stop))
    }
}

impl Variable for StoredVariable {
    fn name_raw(&self) -> String {
        self.name.clone()
    }

    fn long_name(&self) -> String {
        if self.long_name.is_empty() {
            self.name.clone()
        } else {
            self.long_name.clone()
        }
    }

    fn unit(&self) -> String {
        self.unit.clone()
    }

    fn dimensions_raw(&self) -> Vec<String> {
        self.slice.dimensions.clone()
    }

    fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        self.dimension_info
            .get(dimension)
            .cloned()
            .unwrap_or_default()
    }

    fn has_reversed_dimensions(&self) -> bool {
        self.reversed_dimensions
    }

    fn shape(&self) -> Option<Vec<usize>> {
        self.slice.data.as_ref().map(|d| d.shape().to_vec())
    }

    fn get_slice(&self, bounds: &[Bounds]) -> Result<Slice> {
        let ndim = self.slice.ndim();
        let bounds = expand_bounds(bounds, ndim)?;
        debug!(variable = %self.name, ?bounds, "slicing stored variable");

        let mut args = Vec::with_capacity(ndim);
        for (i, &pair) in bounds.iter().enumerate() {
            let (start, stop) = self.index_range(i, pair)?;
            args.push(SliceArg::Range {
                start: Some(start as isize),
                stop: Some(stop as isize),
                step: 1,
            });
        }
        self.slice.index(&args)
    }
}
