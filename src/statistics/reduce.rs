//! NaN-skipping reductions along one axis
//!
//! Non-finite values are ignored. Lanes without a single finite value reduce
//! to NaN for mean, minimum and maximum, and to 0 for the sum. Callers check
//! the axis; see [`StatisticalReduction`](super::StatisticalReduction).

use ndarray::{ArrayD, Axis};

/// Mean along an axis
pub fn mean_axis(data: &ArrayD<f64>, axis: usize) -> ArrayD<f64> {
    data.map_axis(Axis(axis), |lane| {
        let (sum, count) = lane
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0_f64, 0_usize), |(sum, count), &v| (sum + v, count + 1));
        if count > 0 {
            sum / count as f64
        } else {
            f64::NAN
        }
    })
}

/// Sum along an axis
pub fn sum_axis(data: &ArrayD<f64>, axis: usize) -> ArrayD<f64> {
    data.fold_axis(Axis(axis), 0.0_f64, |&acc, &x| {
        if x.is_finite() {
            acc + x
        } else {
            acc
        }
    })
}

/// Minimum along an axis
pub fn min_axis(data: &ArrayD<f64>, axis: usize) -> ArrayD<f64> {
    let result = data.fold_axis(Axis(axis), f64::INFINITY, |&acc, &x| {
        if x.is_finite() {
            acc.min(x)
        } else {
            acc
        }
    });

    // No finite value in the lane
    result.mapv(|x| if x == f64::INFINITY { f64::NAN } else { x })
}

/// Maximum along an axis
pub fn max_axis(data: &ArrayD<f64>, axis: usize) -> ArrayD<f64> {
    let result = data.fold_axis(Axis(axis), f64::NEG_INFINITY, |&acc, &x| {
        if x.is_finite() {
            acc.max(x)
        } else {
            acc
        }
    });

    result.mapv(|x| if x == f64::NEG_INFINITY { f64::NAN } else { x })
}
