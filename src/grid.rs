//! Coordinate geometry: cell centers, cell interfaces and full-rank grids
//!
//! Interface ("staggered") coordinates have one more element than the center
//! coordinates along every staggered axis: N centers are bounded by N+1
//! interfaces.

use crate::errors::{PlotVarError, Result};
use ndarray::{s, Array1, ArrayD, ArrayView1, Axis, IxDyn, Slice as AxisSlice};
use tracing::trace;

/// Supplies the spacing used to extend a dimension that has a single center.
///
/// `delta` receives the name of the dimension being extended and the full
/// center-coordinate array; `dim_names` maps axis indices to those names.
pub struct DefaultDelta<'a> {
    pub dim_names: &'a [String],
    pub delta: &'a dyn Fn(&str, &ArrayD<f64>) -> f64,
}

impl std::fmt::Debug for DefaultDelta<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultDelta")
            .field("dim_names", &self.dim_names)
            .finish_non_exhaustive()
    }
}

/// Midpoints between consecutive coordinates.
///
/// With `add_ends`, the vector is extended at both ends by the adjacent
/// half-interval, producing the N+1 interfaces that bound N centers.
pub fn get_centers(coords: ArrayView1<'_, f64>, add_ends: bool) -> Result<Array1<f64>> {
    let n = coords.len();
    if n < 2 {
        return Err(PlotVarError::unsupported_grid(format!(
            "at least two coordinates are needed to derive interfaces, got {n}"
        )));
    }

    let delta: Array1<f64> = (&coords.slice(s![1..]) - &coords.slice(s![..-1])) / 2.0;
    let midpoints = &coords.slice(s![..-1]) + &delta;
    if !add_ends {
        return Ok(midpoints);
    }

    let mut interfaces = Array1::zeros(n + 1);
    interfaces[0] = coords[0] - delta[0];
    interfaces.slice_mut(s![1..n]).assign(&midpoints);
    interfaces[n] = coords[n - 1] + delta[n - 2];
    Ok(interfaces)
}

/// Full-rank coordinate arrays for a set of 1-D axes.
///
/// Array `k` has the shape `(len(axes[0]), .., len(axes[n-1]))` and varies
/// along axis `k` only.
pub fn ndgrid(axes: &[Array1<f64>]) -> Vec<ArrayD<f64>> {
    let shape: Vec<usize> = axes.iter().map(|a| a.len()).collect();
    axes.iter()
        .enumerate()
        .map(|(k, axis)| ArrayD::from_shape_fn(IxDyn(&shape), |idx| axis[idx[k]]))
        .collect()
}

/// Broadcast a 1-D coordinate vector along `axis` of an array with `shape`.
pub fn replicate_coordinates(
    coords: ArrayView1<'_, f64>,
    shape: &[usize],
    axis: usize,
) -> Result<ArrayD<f64>> {
    let extent = *shape.get(axis).ok_or_else(|| {
        PlotVarError::shape_mismatch(format!(
            "axis {axis} is out of bounds for shape {shape:?}"
        ))
    })?;
    if coords.len() != extent {
        return Err(PlotVarError::shape_mismatch(format!(
            "length of coordinate vector ({}) and dimension {axis} of the data ({extent}) must match",
            coords.len()
        )));
    }
    Ok(ArrayD::from_shape_fn(IxDyn(shape), |idx| coords[idx[axis]]))
}

/// Interface coordinates for (possibly curvilinear) center coordinates.
///
/// Every axis listed in `dim_indices` (all axes when `None`) gains one
/// element. Two candidate arrays are built: one holding the centers shifted
/// forward and one holding them shifted backward. Each is extended linearly at
/// its open boundary with the delta of the two adjacent intervals, or with the
/// spacing returned by `default_delta` when the axis holds a single center.
/// The element-wise average of both candidates is returned, so interior
/// interface `i` lies between centers `i-1` and `i`.
pub fn stagger(
    coords: &ArrayD<f64>,
    dim_indices: Option<&[usize]>,
    default_delta: Option<&DefaultDelta<'_>>,
) -> Result<ArrayD<f64>> {
    let ndim = coords.ndim();
    let all_axes: Vec<usize> = (0..ndim).collect();
    let axes = dim_indices.unwrap_or(&all_axes);
    if let Some(&bad) = axes.iter().find(|&&axis| axis >= ndim) {
        return Err(PlotVarError::shape_mismatch(format!(
            "cannot stagger axis {bad} of a {ndim}-dimensional coordinate array"
        )));
    }
    if let Some(&empty) = axes.iter().find(|&&axis| coords.shape()[axis] == 0) {
        return Err(PlotVarError::unsupported_grid(format!(
            "axis {empty} holds no centers to derive interfaces from"
        )));
    }
    if let Some(default) = default_delta {
        if default.dim_names.len() != ndim {
            return Err(PlotVarError::shape_mismatch(format!(
                "{} dimension names supplied for a {ndim}-dimensional coordinate array",
                default.dim_names.len()
            )));
        }
    }

    let mut stag_shape = coords.shape().to_vec();
    for &axis in axes {
        stag_shape[axis] += 1;
    }
    trace!(shape = ?coords.shape(), stag_shape = ?stag_shape, "staggering coordinates");

    let head = AxisSlice::new(0, Some(-1), 1);
    let tail = AxisSlice::new(1, None, 1);

    let mut forward = ArrayD::<f64>::zeros(IxDyn(&stag_shape));
    let mut backward = ArrayD::<f64>::zeros(IxDyn(&stag_shape));
    {
        let mut lead = forward.view_mut();
        let mut trail = backward.view_mut();
        for &axis in axes {
            lead.slice_axis_inplace(Axis(axis), head);
            trail.slice_axis_inplace(Axis(axis), tail);
        }
        lead.assign(coords);
        trail.assign(coords);
    }

    for &axis in axes {
        let n = stag_shape[axis];
        let later: Vec<usize> = axes.iter().copied().filter(|&a| a > axis).collect();

        let step = if coords.shape()[axis] == 1 {
            let default = default_delta.ok_or_else(|| {
                PlotVarError::unsupported_grid(format!(
                    "axis {axis} holds a single center and no default spacing was supplied"
                ))
            })?;
            Step::Scalar((default.delta)(&default.dim_names[axis], coords))
        } else {
            let inner = edge(&forward, &later, head, axis, n - 3);
            let outer = edge(&forward, &later, head, axis, n - 2);
            Step::Array(outer - inner)
        };
        let last = edge(&forward, &later, head, axis, n - 2);
        assign_edge(&mut forward, &later, head, axis, n - 1, &step.add_to(&last));

        let step = if coords.shape()[axis] == 1 {
            step
        } else {
            let inner = edge(&backward, &later, tail, axis, 1);
            let outer = edge(&backward, &later, tail, axis, 2);
            Step::Array(outer - inner)
        };
        let first = edge(&backward, &later, tail, axis, 1);
        assign_edge(&mut backward, &later, tail, axis, 0, &step.subtract_from(&first));
    }

    Ok((forward + backward) * 0.5)
}

enum Step {
    Scalar(f64),
    Array(ArrayD<f64>),
}

impl Step {
    fn add_to(&self, base: &ArrayD<f64>) -> ArrayD<f64> {
        match self {
            Step::Scalar(delta) => base + *delta,
            Step::Array(delta) => base + delta,
        }
    }

    fn subtract_from(&self, base: &ArrayD<f64>) -> ArrayD<f64> {
        match self {
            Step::Scalar(delta) => base - *delta,
            Step::Array(delta) => base - delta,
        }
    }
}

/// Copy of the hyperplane `index` along `axis`, restricted on `later` axes.
fn edge(
    arr: &ArrayD<f64>,
    later: &[usize],
    restrict: AxisSlice,
    axis: usize,
    index: usize,
) -> ArrayD<f64> {
    let mut view = arr.view();
    for &a in later {
        view.slice_axis_inplace(Axis(a), restrict);
    }
    view.index_axis_move(Axis(axis), index).to_owned()
}

fn assign_edge(
    arr: &mut ArrayD<f64>,
    later: &[usize],
    restrict: AxisSlice,
    axis: usize,
    index: usize,
    values: &ArrayD<f64>,
) {
    let mut view = arr.view_mut();
    for &a in later {
        view.slice_axis_inplace(Axis(a), restrict);
    }
    view.index_axis_move(Axis(axis), index).assign(values);
}
