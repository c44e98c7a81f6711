//! Index search and linear interpolation on monotonic coordinates

use crate::errors::{PlotVarError, Result};
use ndarray::{ArrayD, ArrayView1, ArrayViewD, Axis, IxDyn, Zip};

/// Optional lower and upper coordinate bound for one dimension.
pub type Bounds = (Option<f64>, Option<f64>);

/// Inclusive index range of `data` covering `bounds`, relaxed by one sample.
///
/// `data` must be monotonically increasing. The range starts one position
/// before the first value not below the lower bound and ends one position
/// after the last value not above the upper bound, so the covered interval
/// always encloses the requested one when the data allow it. A range that
/// lies entirely outside the data comes back inverted (`start > stop`).
pub fn find_indices(bounds: Bounds, data: ArrayView1<'_, f64>) -> (isize, isize) {
    let len = data.len() as isize;
    let (lower, upper) = bounds;

    let mut start: isize = 0;
    let mut stop: isize = len - 1;
    if let Some(lower) = lower {
        while start < len && data[start as usize] < lower {
            start += 1;
        }
    }
    if let Some(upper) = upper {
        while stop >= 0 && data[stop as usize] > upper {
            stop -= 1;
        }
    }

    if start > 0 && start < len {
        start -= 1;
    }
    if stop >= 0 && stop < len - 1 {
        stop += 1;
    }
    (start, stop)
}

/// Half-open index range along `axis` of curvilinear coordinates.
///
/// Each position along `axis` is summarized by the envelope of its lane (the
/// lane maximum for the lower bound, the lane minimum for the upper bound),
/// which is then searched like a sorted vector.
pub fn get_bound_indices(
    coords: ArrayViewD<'_, f64>,
    axis: usize,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(usize, usize)> {
    if axis >= coords.ndim() {
        return Err(PlotVarError::shape_mismatch(format!(
            "axis {axis} is out of bounds for {}-dimensional coordinates",
            coords.ndim()
        )));
    }
    let n = coords.len_of(Axis(axis));
    if n == 0 {
        return Ok((0, 0));
    }

    let mut lower_envelope = Vec::with_capacity(n);
    let mut upper_envelope = Vec::with_capacity(n);
    for lane in coords.axis_iter(Axis(axis)) {
        lower_envelope.push(lane.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v)));
        upper_envelope.push(lane.fold(f64::INFINITY, |acc, &v| acc.min(v)));
    }

    let mut imin = 0;
    let mut imax = n;
    if let Some(min) = min {
        imin = lower_envelope.partition_point(|&v| v < min).min(n - 1);
    }
    if let Some(max) = max {
        imax = upper_envelope.partition_point(|&v| v < max).clamp(1, n);
    }
    Ok((imin, imax))
}

/// Piecewise-linear interpolation of `y` (sampled at `x` along its first
/// axis) onto the positions `xi`.
///
/// Targets outside `[x[0], x[n-1]]` take the nearest boundary sample
/// (flat extrapolation). `x` is assumed increasing; see [`interp1_checked`].
pub fn interp1(
    x: ArrayView1<'_, f64>,
    y: ArrayViewD<'_, f64>,
    xi: ArrayView1<'_, f64>,
) -> Result<ArrayD<f64>> {
    if y.ndim() == 0 || y.len_of(Axis(0)) != x.len() {
        return Err(PlotVarError::shape_mismatch(format!(
            "first axis of the values ({:?}) must match the {} interpolation coordinates",
            y.shape(),
            x.len()
        )));
    }
    let n = x.len();
    if n == 0 {
        return Err(PlotVarError::shape_mismatch(
            "cannot interpolate from an empty coordinate vector",
        ));
    }

    let xs = x.to_vec();
    let mut shape = y.shape().to_vec();
    shape[0] = xi.len();
    let mut out = ArrayD::<f64>::zeros(IxDyn(&shape));

    for (j, &target) in xi.iter().enumerate() {
        let hi = xs.partition_point(|&v| v < target);
        let mut row = out.index_axis_mut(Axis(0), j);
        if hi == 0 {
            row.assign(&y.index_axis(Axis(0), 0));
        } else if hi >= n {
            row.assign(&y.index_axis(Axis(0), n - 1));
        } else {
            let lo = hi - 1;
            let w = (target - xs[lo]) / (xs[hi] - xs[lo]);
            Zip::from(&mut row)
                .and(&y.index_axis(Axis(0), lo))
                .and(&y.index_axis(Axis(0), hi))
                .for_each(|r, &a, &b| *r = a * (1.0 - w) + b * w);
        }
    }
    Ok(out)
}

/// [`interp1`] that first verifies `x` is strictly increasing.
pub fn interp1_checked(
    x: ArrayView1<'_, f64>,
    y: ArrayViewD<'_, f64>,
    xi: ArrayView1<'_, f64>,
) -> Result<ArrayD<f64>> {
    let xs = x.to_vec();
    if let Some(pos) = xs.windows(2).position(|pair| !(pair[0] < pair[1])) {
        return Err(PlotVarError::NonMonotonicInput {
            message: format!(
                "x[{pos}] = {} is not below x[{}] = {}",
                xs[pos],
                pos + 1,
                xs[pos + 1]
            ),
        });
    }
    interp1(x, y, xi)
}
