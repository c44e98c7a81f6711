//! Weighted percentiles along one axis
//!
//! The percentile routines work on a (data, cumulative weight, axis) triple:
//! the cumulative weights are non-decreasing along the axis and end at 1, and
//! the data are ordered consistently with them (typically sorted ascending).

use crate::errors::{PlotVarError, Result};
use ndarray::{ArrayD, Axis, Dimension, IxDyn, Zip};

/// Value at cumulative weight `value` along `axis`.
///
/// Cumulative weights below `value` are masked with a sentinel above one and
/// the last index along the axis is clamped to exactly 1.0. The first index
/// holding the smallest remaining weight is the "high" index and its
/// predecessor the "low" index; the data are interpolated linearly between
/// them, using the cumulative weights as coordinates.
///
/// When the high index would be 0 (the first bin already reaches `value`),
/// it is moved to 1, so the result is interpolated (or extrapolated) from
/// indices 0 and 1 rather than being the bare value at index 0. For
/// `value = 0` and a first cumulative weight above zero, this extrapolates
/// below the first data value.
///
/// # Errors
///
/// - [`PlotVarError::InvalidQuantile`] if `value` is outside `[0, 1]`
/// - [`PlotVarError::ShapeMismatch`] if the arrays differ in shape, the axis is
///   out of bounds or it holds fewer than two samples
pub fn get_percentile(
    data: &ArrayD<f64>,
    cumweights: &ArrayD<f64>,
    value: f64,
    axis: usize,
) -> Result<ArrayD<f64>> {
    if !(0.0..=1.0).contains(&value) {
        return Err(PlotVarError::InvalidQuantile { value });
    }
    if data.shape() != cumweights.shape() {
        return Err(PlotVarError::shape_mismatch(format!(
            "data shape {:?} differs from cumulative weight shape {:?}",
            data.shape(),
            cumweights.shape()
        )));
    }
    check_axis(data, axis)?;
    let n = data.len_of(Axis(axis));
    if n < 2 {
        return Err(PlotVarError::shape_mismatch(format!(
            "percentiles need at least two samples along axis {axis}, got {n}"
        )));
    }

    let mut clamped = cumweights.clone();
    clamped.index_axis_mut(Axis(axis), n - 1).fill(1.0);
    let masked = clamped.mapv(|w| if w < value { 2.0 } else { w });

    let high = masked.map_axis(Axis(axis), |lane| {
        let mut best = 0;
        let mut best_value = f64::INFINITY;
        for (i, &w) in lane.iter().enumerate() {
            if w < best_value {
                best = i;
                best_value = w;
            }
        }
        best.max(1)
    });
    let low = high.mapv(|h| h - 1);

    let high_values = argtake(data, &high, axis)?;
    let low_values = argtake(data, &low, axis)?;
    let high_coords = argtake(&clamped, &high, axis)?;
    let low_coords = argtake(&clamped, &low, axis)?;

    Ok(Zip::from(&high_values)
        .and(&low_values)
        .and(&high_coords)
        .and(&low_coords)
        .map_collect(|&hv, &lv, &hc, &lc| {
            // Tied weights: take the high sample.
            let w = if hc == lc { 1.0 } else { (value - lc) / (hc - lc) };
            hv * w + lv * (1.0 - w)
        }))
}

/// Take values from `data` at per-lane positions along `axis`.
///
/// `indices` either omits `axis` (one position per lane, rank
/// `data.ndim() - 1`) or has the same rank as `data`, in which case it must
/// match `data` on every other axis and may select any number of positions per
/// lane.
pub fn argtake(
    data: &ArrayD<f64>,
    indices: &ArrayD<usize>,
    axis: usize,
) -> Result<ArrayD<f64>> {
    check_axis(data, axis)?;
    let n = data.len_of(Axis(axis));
    let reduced = indices.ndim() + 1 == data.ndim();

    if reduced {
        let mut expected = data.shape().to_vec();
        expected.remove(axis);
        if indices.shape() != expected.as_slice() {
            return Err(PlotVarError::shape_mismatch(format!(
                "index shape {:?} must equal the data shape without axis {axis} ({expected:?})",
                indices.shape()
            )));
        }
    } else if indices.ndim() == data.ndim() {
        let compatible = (0..data.ndim())
            .filter(|&i| i != axis)
            .all(|i| indices.shape()[i] == data.shape()[i]);
        if !compatible {
            return Err(PlotVarError::shape_mismatch(format!(
                "index shape {:?} must match data shape {:?} outside axis {axis}",
                indices.shape(),
                data.shape()
            )));
        }
    } else {
        return Err(PlotVarError::shape_mismatch(format!(
            "number of dimensions for indices ({}) must be equal to, or one less than number of data dimensions ({})",
            indices.ndim(),
            data.ndim()
        )));
    }

    if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
        return Err(PlotVarError::shape_mismatch(format!(
            "index {bad} is out of bounds for axis {axis} with length {n}"
        )));
    }

    Ok(ArrayD::from_shape_fn(indices.raw_dim(), |idx| {
        let position = idx.slice();
        let mut full = position.to_vec();
        if reduced {
            full.insert(axis, indices[position]);
        } else {
            full[axis] = indices[position];
        }
        data[IxDyn(&full)]
    }))
}

/// Cumulative sum of `weights` along `axis`, normalized so each lane ends at 1.
///
/// Lanes whose total weight is zero are left as an all-zero cumulative sum.
pub fn cumulative_weights(weights: &ArrayD<f64>, axis: usize) -> Result<ArrayD<f64>> {
    check_axis(weights, axis)?;
    let mut out = weights.clone();
    for mut lane in out.lanes_mut(Axis(axis)) {
        let mut total = 0.0;
        for w in lane.iter_mut() {
            total += *w;
            *w = total;
        }
        if total > 0.0 {
            lane.mapv_inplace(|w| w / total);
        }
    }
    Ok(out)
}

/// Copy of `data` with every lane along `axis` sorted ascending (NaN last).
pub fn sort_along_axis(data: &ArrayD<f64>, axis: usize) -> Result<ArrayD<f64>> {
    check_axis(data, axis)?;
    let mut out = data.clone();
    for mut lane in out.lanes_mut(Axis(axis)) {
        let mut values = lane.to_vec();
        values.sort_by(|a, b| a.total_cmp(b));
        for (slot, v) in lane.iter_mut().zip(values) {
            *slot = v;
        }
    }
    Ok(out)
}

fn check_axis(data: &ArrayD<f64>, axis: usize) -> Result<()> {
    if axis >= data.ndim() {
        return Err(PlotVarError::shape_mismatch(format!(
            "Axis {axis} is out of bounds for array with {} dimensions",
            data.ndim()
        )));
    }
    Ok(())
}
