//! The [`Slice`] bundle: a data array with per-dimension coordinates
//!
//! A slice holds the data of a variable over some subdomain together with, for
//! every dimension, its center coordinates and its interface ("staggered")
//! coordinates. Coordinates are either 1-D vectors along their own dimension
//! or full-rank arrays (curvilinear grids) broadcastable to the data shape.
//!
//! Slices are treated as values: every transformation returns a new slice.

use crate::errors::{PlotVarError, Result};
use crate::grid::get_centers;
use crate::statistics::{StatOperation, StatisticalReduction};
use ndarray::{ArrayD, Axis, Ix1, Slice as AxisSlice};
use std::ops::{Range, RangeFull};

/// Per-dimension argument for [`Slice::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceArg {
    /// Single position; the dimension is dropped from the result.
    Index(isize),
    /// Half-open range. Negative ends count from the back; missing ends
    /// default to the full extent.
    Range {
        start: Option<isize>,
        stop: Option<isize>,
        step: isize,
    },
}

impl SliceArg {
    /// Whole extent of the dimension
    #[must_use]
    pub const fn full() -> Self {
        Self::Range {
            start: None,
            stop: None,
            step: 1,
        }
    }
}

impl From<isize> for SliceArg {
    fn from(index: isize) -> Self {
        Self::Index(index)
    }
}

impl From<Range<isize>> for SliceArg {
    fn from(range: Range<isize>) -> Self {
        Self::Range {
            start: Some(range.start),
            stop: Some(range.end),
            step: 1,
        }
    }
}

impl From<RangeFull> for SliceArg {
    fn from(_: RangeFull) -> Self {
        Self::full()
    }
}

/// Resolved slice argument: a position or a half-open `[start, stop)` range.
#[derive(Debug, Clone, Copy)]
enum Pick {
    Index(usize),
    Range(usize, usize),
}

/// Data array with center and interface coordinates for each dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slice {
    /// Dimension names, one per data axis
    pub dimensions: Vec<String>,
    /// Data values; `None` until assigned
    pub data: Option<ArrayD<f64>>,
    /// Center coordinates per dimension
    pub coords: Vec<Option<ArrayD<f64>>>,
    /// Interface coordinates per dimension (one extra element along the
    /// staggered axes)
    pub coords_stag: Vec<Option<ArrayD<f64>>>,
    /// Lower confidence bound, same shape as the data
    pub lbound: Option<ArrayD<f64>>,
    /// Upper confidence bound, same shape as the data
    pub ubound: Option<ArrayD<f64>>,
    /// Dimensions eliminated by [`Slice::squeeze`] with their fixed coordinate
    pub fixed_coords: Vec<(String, f64)>,
}

impl Slice {
    /// Empty slice over `dimensions`: no data and no coordinates yet.
    #[must_use]
    pub fn new(dimensions: Vec<String>) -> Self {
        let n = dimensions.len();
        Self {
            dimensions,
            coords: vec![None; n],
            coords_stag: vec![None; n],
            ..Self::default()
        }
    }

    /// Fully populated slice, validated against the shape invariants.
    pub fn from_parts(
        dimensions: Vec<String>,
        coords: Vec<ArrayD<f64>>,
        coords_stag: Vec<ArrayD<f64>>,
        data: ArrayD<f64>,
    ) -> Result<Self> {
        let slice = Self {
            dimensions,
            data: Some(data),
            coords: coords.into_iter().map(Some).collect(),
            coords_stag: coords_stag.into_iter().map(Some).collect(),
            ..Self::default()
        };
        slice.check()?;
        Ok(slice)
    }

    /// Slice from center coordinates only; interfaces are derived with
    /// [`Slice::generate_staggered`].
    pub fn with_centers(
        dimensions: Vec<String>,
        coords: Vec<ArrayD<f64>>,
        data: ArrayD<f64>,
    ) -> Result<Self> {
        let n = dimensions.len();
        let mut slice = Self {
            dimensions,
            data: Some(data),
            coords: coords.into_iter().map(Some).collect(),
            coords_stag: vec![None; n],
            ..Self::default()
        };
        slice.check()?;
        slice.generate_staggered()?;
        Ok(slice)
    }

    #[must_use]
    pub fn ndim(&self) -> usize {
        self.dimensions.len()
    }

    /// True when data and all center and interface coordinates are present.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.data.is_some()
            && self.coords.len() == self.ndim()
            && self.coords_stag.len() == self.ndim()
            && self.coords.iter().all(Option::is_some)
            && self.coords_stag.iter().all(Option::is_some)
    }

    /// Verify the rank and shape invariants of whatever is present.
    pub fn check(&self) -> Result<()> {
        let ndim = self.ndim();
        if self.coords.len() != ndim || self.coords_stag.len() != ndim {
            return Err(PlotVarError::shape_mismatch(format!(
                "{ndim} dimensions but {} center and {} interface coordinate entries",
                self.coords.len(),
                self.coords_stag.len()
            )));
        }
        let Some(data) = &self.data else {
            return Ok(());
        };
        if data.ndim() != ndim {
            return Err(PlotVarError::shape_mismatch(format!(
                "Dimension count of data ({}) does not match number of dimensions ({ndim})",
                data.ndim()
            )));
        }

        let shape = data.shape();
        for (i, name) in self.dimensions.iter().enumerate() {
            if let Some(c) = &self.coords[i] {
                let ok = if c.ndim() == 1 {
                    c.len() == shape[i]
                } else {
                    c.ndim() == ndim && c.broadcast(shape).is_some()
                };
                if !ok {
                    return Err(PlotVarError::shape_mismatch(format!(
                        "center coordinates of '{name}' have shape {:?}, incompatible with data shape {shape:?}",
                        c.shape()
                    )));
                }
            }
            if let Some(c) = &self.coords_stag[i] {
                let ok = if c.ndim() == 1 {
                    c.len() == shape[i] + 1
                } else {
                    c.ndim() == ndim
                        && c.shape()[i] == shape[i] + 1
                        && c.shape()
                            .iter()
                            .zip(shape)
                            .all(|(&s, &n)| s == 1 || s == n || s == n + 1)
                };
                if !ok {
                    return Err(PlotVarError::shape_mismatch(format!(
                        "interface coordinates of '{name}' have shape {:?}, incompatible with data shape {shape:?}",
                        c.shape()
                    )));
                }
            }
        }

        for (label, bound) in [("lower", &self.lbound), ("upper", &self.ubound)] {
            if let Some(b) = bound {
                if b.shape() != shape {
                    return Err(PlotVarError::shape_mismatch(format!(
                        "{label} confidence bound has shape {:?}, data has {shape:?}",
                        b.shape()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Data array, or `ShapeMismatch` if none is assigned.
    pub fn data(&self) -> Result<&ArrayD<f64>> {
        self.data
            .as_ref()
            .ok_or_else(|| PlotVarError::shape_mismatch("slice holds no data"))
    }

    /// Center coordinates of dimension `i`.
    pub fn coord(&self, i: usize) -> Result<&ArrayD<f64>> {
        self.coords.get(i).and_then(Option::as_ref).ok_or_else(|| {
            PlotVarError::shape_mismatch(format!("center coordinates for dimension {i} are not set"))
        })
    }

    /// Interface coordinates of dimension `i`.
    pub fn coord_stag(&self, i: usize) -> Result<&ArrayD<f64>> {
        self.coords_stag.get(i).and_then(Option::as_ref).ok_or_else(|| {
            PlotVarError::shape_mismatch(format!(
                "interface coordinates for dimension {i} are not set"
            ))
        })
    }

    /// Replace the data; the slice is left untouched if the new data break
    /// the shape invariants.
    pub fn set_data(&mut self, data: ArrayD<f64>) -> Result<()> {
        let previous = self.data.replace(data);
        if let Err(err) = self.check() {
            self.data = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Attach lower and upper confidence bounds shaped like the data.
    pub fn set_bounds(&mut self, lbound: ArrayD<f64>, ubound: ArrayD<f64>) -> Result<()> {
        let data = self.data()?;
        if lbound.shape() != data.shape() || ubound.shape() != data.shape() {
            return Err(PlotVarError::shape_mismatch(format!(
                "confidence bounds {:?}/{:?} must match data shape {:?}",
                lbound.shape(),
                ubound.shape(),
                data.shape()
            )));
        }
        self.lbound = Some(lbound);
        self.ubound = Some(ubound);
        Ok(())
    }

    /// Derive interface coordinates from 1-D center coordinates.
    ///
    /// Fails with `UnsupportedGrid` if any dimension has curvilinear centers;
    /// the slice is only modified when every dimension succeeds.
    pub fn generate_staggered(&mut self) -> Result<()> {
        let mut stag = Vec::with_capacity(self.ndim());
        for (i, name) in self.dimensions.iter().enumerate() {
            let centers = self.coord(i)?;
            if centers.ndim() != 1 {
                return Err(PlotVarError::unsupported_grid(format!(
                    "interface coordinates can only be generated for 1-D coordinates, '{name}' has {} dimensions",
                    centers.ndim()
                )));
            }
            let centers = centers.view().into_dimensionality::<Ix1>()?;
            stag.push(Some(get_centers(centers, true)?.into_dyn()));
        }
        self.coords_stag = stag;
        Ok(())
    }

    /// Sub-slice with one argument per dimension.
    ///
    /// Center coordinates, data and confidence bounds are sliced with the
    /// ranges as given; interface coordinates with `[start, stop + 1)`.
    /// Dimensions addressed by a single index are dropped.
    pub fn index(&self, args: &[SliceArg]) -> Result<Slice> {
        let data = self.data()?;
        if args.len() != data.ndim() {
            return Err(PlotVarError::shape_mismatch(format!(
                "Number of slices ({}) does not match number of variable dimensions ({})",
                args.len(),
                data.ndim()
            )));
        }

        let extents = data.shape();
        let mut picks = Vec::with_capacity(args.len());
        for ((arg, name), &extent) in args.iter().zip(&self.dimensions).zip(extents) {
            picks.push(resolve(*arg, name, extent)?);
        }

        let mut out = Slice {
            fixed_coords: self.fixed_coords.clone(),
            ..Slice::default()
        };
        for (i, pick) in picks.iter().enumerate() {
            if let Pick::Range(..) = pick {
                out.dimensions.push(self.dimensions[i].clone());
                out.coords
                    .push(self.coords[i].as_ref().map(|c| take_coordinate(c, &picks, i, extents)));
                out.coords_stag.push(
                    self.coords_stag[i]
                        .as_ref()
                        .map(|c| take_coordinate(c, &picks, i, extents)),
                );
            }
        }
        out.data = Some(take(data, &picks, extents));
        out.lbound = self.lbound.as_ref().map(|b| take(b, &picks, extents));
        out.ubound = self.ubound.as_ref().map(|b| take(b, &picks, extents));
        Ok(out)
    }

    /// Eliminate every dimension of extent 1.
    ///
    /// Each eliminated dimension is recorded in `fixed_coords` with its
    /// coordinate value. Curvilinear coordinates of the remaining dimensions
    /// are averaged over the eliminated axes.
    pub fn squeeze(&self) -> Result<Slice> {
        let data = self.data()?;

        let mut kept = Vec::new();
        let mut removed = Vec::new();
        let mut fixed_coords = self.fixed_coords.clone();
        for (i, name) in self.dimensions.iter().enumerate() {
            if data.shape()[i] == 1 {
                let c = self.coord(i)?;
                let value = if c.ndim() == 1 {
                    c.iter().next().copied().unwrap_or(f64::NAN)
                } else {
                    c.mean().unwrap_or(f64::NAN)
                };
                fixed_coords.push((name.clone(), value));
                removed.push(i);
            } else {
                kept.push(i);
            }
        }

        let mut out = Slice {
            fixed_coords,
            ..Slice::default()
        };
        for &i in &kept {
            out.dimensions.push(self.dimensions[i].clone());
            out.coords
                .push(self.coords[i].as_ref().map(|c| average_out(c, &removed)).transpose()?);
            out.coords_stag.push(
                self.coords_stag[i]
                    .as_ref()
                    .map(|c| average_out(c, &removed))
                    .transpose()?,
            );
        }
        out.data = Some(drop_axes(data, &removed));
        out.lbound = self.lbound.as_ref().map(|b| drop_axes(b, &removed));
        out.ubound = self.ubound.as_ref().map(|b| drop_axes(b, &removed));
        Ok(out)
    }

    /// Slice without dimension `idim` and without data.
    ///
    /// Curvilinear coordinates of the other dimensions take their values at
    /// index 0 along the removed axis. The caller assigns data for the reduced
    /// shape with [`Slice::set_data`].
    pub fn remove_dimension(&self, idim: usize) -> Result<Slice> {
        if idim >= self.ndim() {
            return Err(PlotVarError::shape_mismatch(format!(
                "cannot remove dimension {idim} from a slice with {} dimensions",
                self.ndim()
            )));
        }

        let first_along = |c: &ArrayD<f64>| {
            if c.ndim() > 1 {
                c.index_axis(Axis(idim), 0).to_owned()
            } else {
                c.clone()
            }
        };

        let mut out = Slice {
            fixed_coords: self.fixed_coords.clone(),
            ..Slice::default()
        };
        for i in (0..self.ndim()).filter(|&i| i != idim) {
            out.dimensions.push(self.dimensions[i].clone());
            out.coords.push(self.coords[i].as_ref().map(first_along));
            out.coords_stag.push(self.coords_stag[i].as_ref().map(first_along));
        }
        Ok(out)
    }

    /// Remove dimension `idim` and fill the data with a reduction along it.
    pub fn reduce_dimension(&self, idim: usize, operation: StatOperation) -> Result<Slice> {
        let data = self.data()?;
        let mut out = self.remove_dimension(idim)?;
        out.set_data(data.reduce_along_axis(idim, operation)?)?;
        Ok(out)
    }
}

fn resolve(arg: SliceArg, dimension: &str, extent: usize) -> Result<Pick> {
    let len = extent as isize;
    match arg {
        SliceArg::Index(i) => {
            let position = if i < 0 { i + len } else { i };
            if position < 0 || position >= len {
                return Err(PlotVarError::UnsupportedSlice {
                    dimension: dimension.to_string(),
                    message: format!("index {i} is out of range for extent {extent}"),
                });
            }
            Ok(Pick::Index(position as usize))
        }
        SliceArg::Range { start, stop, step } => {
            if step != 1 {
                return Err(PlotVarError::UnsupportedSlice {
                    dimension: dimension.to_string(),
                    message: format!("step {step} is not supported, only unit steps are"),
                });
            }
            let clamp = |v: isize| if v < 0 { (v + len).max(0) } else { v.min(len) };
            let start = start.map_or(0, clamp);
            let stop = stop.map_or(len, clamp).max(start);
            Ok(Pick::Range(start as usize, stop as usize))
        }
    }
}

/// Apply `picks` to an array broadcastable to the data `extents`.
///
/// Axes one element longer than the data are interface axes and get one
/// extra element per range. Broadcast axes of length 1 are left alone.
fn take(arr: &ArrayD<f64>, picks: &[Pick], extents: &[usize]) -> ArrayD<f64> {
    let mut view = arr.view();
    for (axis, pick) in picks.iter().enumerate() {
        if let Pick::Range(start, stop) = *pick {
            let len = view.len_of(Axis(axis));
            if len == 1 && extents[axis] != 1 {
                continue;
            }
            let stop = if len > extents[axis] { stop + 1 } else { stop };
            view.slice_axis_inplace(Axis(axis), AxisSlice::from(start..stop));
        }
    }
    for (axis, pick) in picks.iter().enumerate().rev() {
        if let Pick::Index(i) = *pick {
            let len = view.len_of(Axis(axis));
            let i = if len == 1 && extents[axis] != 1 { 0 } else { i };
            view = view.index_axis_move(Axis(axis), i);
        }
    }
    view.to_owned()
}

/// Coordinates of dimension `i`: 1-D vectors follow their own pick only.
fn take_coordinate(c: &ArrayD<f64>, picks: &[Pick], i: usize, extents: &[usize]) -> ArrayD<f64> {
    if c.ndim() == 1 {
        take(c, &picks[i..=i], &extents[i..=i])
    } else {
        take(c, picks, extents)
    }
}

/// Average curvilinear coordinates over `removed` axes, last axis first.
fn average_out(c: &ArrayD<f64>, removed: &[usize]) -> Result<ArrayD<f64>> {
    if c.ndim() == 1 {
        return Ok(c.clone());
    }
    let mut out = c.clone();
    for &axis in removed.iter().rev() {
        out = out.mean_axis(Axis(axis)).ok_or_else(|| {
            PlotVarError::shape_mismatch(format!("cannot average empty axis {axis}"))
        })?;
    }
    Ok(out)
}

/// Drop extent-1 `axes`, last axis first.
fn drop_axes(arr: &ArrayD<f64>, axes: &[usize]) -> ArrayD<f64> {
    let mut view = arr.view();
    for &axis in axes.iter().rev() {
        view = view.index_axis_move(Axis(axis), 0);
    }
    view.to_owned()
}
