//! Tests for index searches and linear interpolation

use approx::assert_abs_diff_eq;
use ndarray::{array, ArrayD, IxDyn};
use plotvar::errors::PlotVarError;
use plotvar::interp::{find_indices, get_bound_indices, interp1, interp1_checked};

#[test]
fn test_find_indices_relaxed_by_one_sample() {
    let data = array![1.0, 2.0, 3.0, 4.0, 5.0];

    assert_eq!(find_indices((Some(2.0), Some(4.0)), data.view()), (0, 4));
    assert_eq!(find_indices((Some(2.5), Some(3.5)), data.view()), (1, 3));
    assert_eq!(find_indices((None, None), data.view()), (0, 4));
    assert_eq!(find_indices((Some(0.5), Some(1.5)), data.view()), (0, 1));
}

#[test]
fn test_find_indices_outside_data_is_inverted() {
    let data = array![1.0, 2.0, 3.0, 4.0, 5.0];
    let (start, stop) = find_indices((Some(10.0), Some(20.0)), data.view());
    assert_eq!((start, stop), (5, 4));
    assert!(start > stop);
}

#[test]
fn test_get_bound_indices_1d() {
    let coords = array![1.0, 2.0, 3.0, 4.0, 5.0].into_dyn();
    assert_eq!(
        get_bound_indices(coords.view(), 0, Some(2.5), Some(3.5)).unwrap(),
        (2, 3)
    );
    assert_eq!(get_bound_indices(coords.view(), 0, None, None).unwrap(), (0, 5));
}

#[test]
fn test_get_bound_indices_curvilinear() {
    // c[i, j] = i + 0.1 * j
    let coords = ArrayD::from_shape_fn(IxDyn(&[4, 2]), |idx| idx[0] as f64 + 0.1 * idx[1] as f64);
    assert_eq!(
        get_bound_indices(coords.view(), 0, Some(1.5), Some(2.5)).unwrap(),
        (2, 3)
    );

    // Bounds beyond the data are clamped to a usable range
    assert_eq!(
        get_bound_indices(coords.view(), 0, Some(10.0), Some(-10.0)).unwrap(),
        (3, 1)
    );

    let err = get_bound_indices(coords.view(), 2, None, None).unwrap_err();
    assert!(matches!(err, PlotVarError::ShapeMismatch { .. }));
}

#[test]
fn test_interp1_linear_with_flat_extrapolation() {
    let x = array![0.0, 1.0, 2.0];
    let y = array![0.0, 10.0, 20.0].into_dyn();
    let xi = array![-1.0, 0.5, 1.5, 2.0, 3.0];

    let out = interp1(x.view(), y.view(), xi.view()).unwrap();
    let expected = [0.0, 5.0, 15.0, 20.0, 20.0];
    for (a, e) in out.iter().zip(expected) {
        assert_abs_diff_eq!(*a, e, epsilon = 1e-12);
    }
}

#[test]
fn test_interp1_identity_on_samples() {
    let x = array![0.0, 2.0, 5.0];
    let y = array![[1.0, -1.0], [3.0, -3.0], [9.0, -9.0]].into_dyn();

    let out = interp1(x.view(), y.view(), x.view()).unwrap();
    assert_eq!(out, y);

    // Trailing axes are interpolated independently
    let out = interp1(x.view(), y.view(), array![1.0].view()).unwrap();
    assert_eq!(out.shape(), &[1, 2]);
    assert_abs_diff_eq!(out[IxDyn(&[0, 0])], 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(out[IxDyn(&[0, 1])], -2.0, epsilon = 1e-12);
}

#[test]
fn test_interp1_shape_mismatch() {
    let x = array![0.0, 1.0];
    let y = array![0.0, 1.0, 2.0].into_dyn();
    let err = interp1(x.view(), y.view(), x.view()).unwrap_err();
    assert!(matches!(err, PlotVarError::ShapeMismatch { .. }));
}

#[test]
fn test_interp1_checked_rejects_non_increasing() {
    let x = array![0.0, 2.0, 1.0];
    let y = array![0.0, 1.0, 2.0].into_dyn();
    let err = interp1_checked(x.view(), y.view(), array![0.5].view()).unwrap_err();
    assert!(matches!(err, PlotVarError::NonMonotonicInput { .. }));

    let x = array![0.0, 1.0, 2.0];
    assert!(interp1_checked(x.view(), y.view(), array![0.5].view()).is_ok());
}
