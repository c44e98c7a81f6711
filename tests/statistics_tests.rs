//! Tests for weighted percentiles and axis reductions

use approx::assert_abs_diff_eq;
use ndarray::{array, ArrayD};
use plotvar::errors::PlotVarError;
use plotvar::statistics::{
    argtake, cumulative_weights, get_percentile, max_axis, mean_axis, min_axis,
    sort_along_axis, sum_axis, StatOperation, StatisticalReduction,
};

fn assert_values(actual: &ArrayD<f64>, expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "length of {actual:?}");
    for (a, e) in actual.iter().zip(expected) {
        if e.is_nan() {
            assert!(a.is_nan(), "expected NaN, got {a}");
        } else {
            assert_abs_diff_eq!(*a, *e, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_percentile_extremes() {
    let data = array![10.0, 20.0, 30.0, 40.0].into_dyn();
    let weights = array![0.25, 0.5, 0.75, 1.0].into_dyn();

    // The last bin is clamped to exactly 1, so value 1 gives the maximum
    let top = get_percentile(&data, &weights, 1.0, 0).unwrap();
    assert_values(&top, &[40.0]);

    // Value 0 is extrapolated below the first sample from indices 0 and 1
    let bottom = get_percentile(&data, &weights, 0.0, 0).unwrap();
    assert_values(&bottom, &[0.0]);
}

#[test]
fn test_percentile_interpolates_between_bins() {
    let data = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].into_dyn();
    let weights = cumulative_weights(&ArrayD::ones(data.raw_dim()), 1).unwrap();

    let median = get_percentile(&data, &weights, 0.5, 1).unwrap();
    assert_eq!(median.shape(), &[2]);
    assert_values(&median, &[1.5, 4.5]);
}

#[test]
fn test_percentile_tied_weights() {
    // Zero-weight sample at index 1 ties with index 0
    let data = array![1.0, 2.0, 3.0].into_dyn();
    let weights = array![0.5, 0.5, 1.0].into_dyn();
    let out = get_percentile(&data, &weights, 0.5, 0).unwrap();
    assert_values(&out, &[2.0]);
}

#[test]
fn test_percentile_errors() {
    let data = array![1.0, 2.0].into_dyn();
    let weights = array![0.5, 1.0].into_dyn();

    let err = get_percentile(&data, &weights, 1.5, 0).unwrap_err();
    assert!(matches!(err, PlotVarError::InvalidQuantile { .. }));

    let err = get_percentile(&data, &array![1.0].into_dyn(), 0.5, 0).unwrap_err();
    assert!(matches!(err, PlotVarError::ShapeMismatch { .. }));

    let err = get_percentile(&data, &weights, 0.5, 1).unwrap_err();
    assert!(matches!(err, PlotVarError::ShapeMismatch { .. }));
}

#[test]
fn test_argtake() {
    let data = array![[10.0, 20.0, 30.0], [40.0, 50.0, 60.0]].into_dyn();

    // One position per lane
    let picked = argtake(&data, &array![2_usize, 0].into_dyn(), 1).unwrap();
    assert_values(&picked, &[30.0, 40.0]);

    // Several positions per lane
    let picked = argtake(&data, &array![[0_usize, 0], [1, 2]].into_dyn(), 1).unwrap();
    assert_eq!(picked.shape(), &[2, 2]);
    assert_values(&picked, &[10.0, 10.0, 50.0, 60.0]);

    let err = argtake(&data, &array![3_usize, 0].into_dyn(), 1).unwrap_err();
    assert!(matches!(err, PlotVarError::ShapeMismatch { .. }));

    let err = argtake(&data, &ArrayD::zeros(vec![1, 1, 1]), 1).unwrap_err();
    assert!(matches!(err, PlotVarError::ShapeMismatch { .. }));
}

#[test]
fn test_cumulative_weights() {
    let weights = array![[1.0, 1.0, 2.0], [0.0, 0.0, 0.0]].into_dyn();
    let cumulative = cumulative_weights(&weights, 1).unwrap();
    assert_values(&cumulative, &[0.25, 0.5, 1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn test_sort_along_axis() {
    let data = array![[3.0, 1.0, 2.0], [0.0, f64::NAN, -1.0]].into_dyn();
    let sorted = sort_along_axis(&data, 1).unwrap();
    assert_values(&sorted, &[1.0, 2.0, 3.0, -1.0, 0.0, f64::NAN]);
}

#[test]
fn test_reductions_skip_nan() {
    let data = array![[1.0, f64::NAN], [3.0, 4.0]].into_dyn();

    assert_values(&mean_axis(&data, 0), &[2.0, 4.0]);
    assert_values(&mean_axis(&data, 1), &[1.0, 3.5]);
    assert_values(&sum_axis(&data, 0), &[4.0, 4.0]);
    assert_values(&min_axis(&data, 0), &[1.0, 4.0]);
    assert_values(&max_axis(&data, 1), &[1.0, 4.0]);

    // Lanes without finite values
    let empty = array![[f64::NAN], [f64::NAN]].into_dyn();
    assert_values(&mean_axis(&empty, 0), &[f64::NAN]);
    assert_values(&sum_axis(&empty, 0), &[0.0]);
    assert_values(&max_axis(&empty, 0), &[f64::NAN]);
}

#[test]
fn test_stat_operation() {
    assert_eq!("mean".parse::<StatOperation>().unwrap(), StatOperation::Mean);
    assert_eq!("MIN".parse::<StatOperation>().unwrap(), StatOperation::Min);
    assert_eq!("maximum".parse::<StatOperation>().unwrap(), StatOperation::Max);
    assert!("median".parse::<StatOperation>().is_err());
    assert_eq!(StatOperation::Min.to_string(), "minimum");

    let data = array![[1.0, 2.0], [3.0, 4.0]].into_dyn();
    let summed = data.reduce_along_axis(1, StatOperation::Sum).unwrap();
    assert_values(&summed, &[3.0, 7.0]);
    assert!(data.reduce_along_axis(2, StatOperation::Mean).is_err());
}
