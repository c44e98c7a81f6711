//! Tests for slice construction, indexing, squeezing and dimension reduction

use approx::assert_abs_diff_eq;
use ndarray::{array, Array, ArrayD, Dimension, IxDyn};
use plotvar::errors::PlotVarError;
use plotvar::slice::{Slice, SliceArg};
use plotvar::statistics::StatOperation;

fn assert_values<D: Dimension>(actual: &Array<f64, D>, expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "length of {actual:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert_abs_diff_eq!(*a, *e, epsilon = 1e-12);
    }
}

fn dims(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// 3x2 slice over x = [0, 1, 2] and y = [10, 20] holding 0..6.
fn sample_slice() -> Slice {
    let data = Array::from_iter((0..6).map(f64::from))
        .into_shape((3, 2))
        .unwrap()
        .into_dyn();
    Slice::with_centers(
        dims(&["x", "y"]),
        vec![array![0.0, 1.0, 2.0].into_dyn(), array![10.0, 20.0].into_dyn()],
        data,
    )
    .unwrap()
}

#[test]
fn test_with_centers_generates_interfaces() {
    let slice = sample_slice();
    assert!(slice.is_valid());
    assert_eq!(slice.ndim(), 2);
    assert_values(slice.coord_stag(0).unwrap(), &[-0.5, 0.5, 1.5, 2.5]);
    assert_values(slice.coord_stag(1).unwrap(), &[5.0, 15.0, 25.0]);
}

#[test]
fn test_new_slice_is_incomplete() {
    let slice = Slice::new(dims(&["x"]));
    assert!(!slice.is_valid());
    assert!(slice.check().is_ok());
    assert!(matches!(
        slice.data().unwrap_err(),
        PlotVarError::ShapeMismatch { .. }
    ));
}

#[test]
fn test_from_parts_validates_shapes() {
    let err = Slice::from_parts(
        dims(&["x"]),
        vec![array![0.0, 1.0].into_dyn()],
        vec![array![-0.5, 0.5].into_dyn()],
        array![1.0, 2.0].into_dyn(),
    )
    .unwrap_err();
    assert!(matches!(err, PlotVarError::ShapeMismatch { .. }));

    let err = Slice::with_centers(
        dims(&["x", "y"]),
        vec![array![0.0, 1.0].into_dyn(), array![0.0].into_dyn()],
        array![1.0, 2.0].into_dyn(),
    )
    .unwrap_err();
    assert!(matches!(err, PlotVarError::ShapeMismatch { .. }));
}

#[test]
fn test_index_ranges() {
    let slice = sample_slice();
    let sub = slice
        .index(&[SliceArg::from(1..3), SliceArg::full()])
        .unwrap();

    assert_eq!(sub.dimensions, dims(&["x", "y"]));
    assert_eq!(sub.data().unwrap().shape(), &[2, 2]);
    assert_values(sub.data().unwrap(), &[2.0, 3.0, 4.0, 5.0]);
    assert_values(sub.coord(0).unwrap(), &[1.0, 2.0]);
    // Interfaces keep one extra element
    assert_values(sub.coord_stag(0).unwrap(), &[0.5, 1.5, 2.5]);
    assert_values(sub.coord_stag(1).unwrap(), &[5.0, 15.0, 25.0]);
    assert!(sub.is_valid());
}

#[test]
fn test_index_drops_indexed_dimensions() {
    let slice = sample_slice();
    let row = slice.index(&[SliceArg::Index(-1), SliceArg::full()]).unwrap();

    assert_eq!(row.dimensions, dims(&["y"]));
    assert_values(row.data().unwrap(), &[4.0, 5.0]);
    assert_values(row.coord(0).unwrap(), &[10.0, 20.0]);

    // Negative range ends count from the back
    let tail = slice
        .index(&[SliceArg::from(-2..-1), SliceArg::from(..)])
        .unwrap();
    assert_values(tail.data().unwrap(), &[2.0, 3.0]);
}

#[test]
fn test_index_errors() {
    let slice = sample_slice();

    let stepped = SliceArg::Range {
        start: None,
        stop: None,
        step: 2,
    };
    let err = slice.index(&[stepped, SliceArg::full()]).unwrap_err();
    assert!(matches!(err, PlotVarError::UnsupportedSlice { .. }));

    let err = slice.index(&[SliceArg::Index(3), SliceArg::full()]).unwrap_err();
    assert!(matches!(err, PlotVarError::UnsupportedSlice { .. }));

    let err = slice.index(&[SliceArg::full()]).unwrap_err();
    assert!(matches!(err, PlotVarError::ShapeMismatch { .. }));
}

#[test]
fn test_index_carries_confidence_bounds() {
    let mut slice = sample_slice();
    let data = slice.data().unwrap().clone();
    slice.set_bounds(&data - 1.0, &data + 1.0).unwrap();

    let sub = slice.index(&[SliceArg::Index(0), SliceArg::full()]).unwrap();
    assert_values(sub.lbound.as_ref().unwrap(), &[-1.0, 0.0]);
    assert_values(sub.ubound.as_ref().unwrap(), &[1.0, 2.0]);

    let err = slice
        .set_bounds(array![1.0].into_dyn(), array![1.0].into_dyn())
        .unwrap_err();
    assert!(matches!(err, PlotVarError::ShapeMismatch { .. }));
}

/// Slice over t (a single time) and x.
fn single_time_slice() -> Slice {
    Slice::from_parts(
        dims(&["t", "x"]),
        vec![array![5.0].into_dyn(), array![0.0, 1.0, 2.0].into_dyn()],
        vec![
            array![4.5, 5.5].into_dyn(),
            array![-0.5, 0.5, 1.5, 2.5].into_dyn(),
        ],
        array![[1.0, 2.0, 3.0]].into_dyn(),
    )
    .unwrap()
}

#[test]
fn test_squeeze_records_fixed_coordinates() {
    let squeezed = single_time_slice().squeeze().unwrap();

    assert_eq!(squeezed.dimensions, dims(&["x"]));
    assert_eq!(squeezed.fixed_coords, vec![("t".to_string(), 5.0)]);
    assert_eq!(squeezed.data().unwrap().shape(), &[3]);
    assert_values(squeezed.coord_stag(0).unwrap(), &[-0.5, 0.5, 1.5, 2.5]);
    assert!(squeezed.is_valid());

    // No dimension of extent 1 remains
    assert!(squeezed.data().unwrap().shape().iter().all(|&n| n > 1));
    assert_eq!(squeezed.squeeze().unwrap(), squeezed);
}

#[test]
fn test_squeeze_averages_curvilinear_coordinates() {
    let slice = Slice::from_parts(
        dims(&["t", "x"]),
        vec![
            array![[5.0, 6.0, 7.0]].into_dyn(),
            array![[0.0, 1.0, 2.0]].into_dyn(),
        ],
        vec![
            array![[4.5, 5.5, 6.5], [5.5, 6.5, 7.5]].into_dyn(),
            array![[-0.5, 0.5, 1.5, 2.5]].into_dyn(),
        ],
        array![[1.0, 2.0, 3.0]].into_dyn(),
    )
    .unwrap();

    let squeezed = slice.squeeze().unwrap();
    assert_eq!(squeezed.fixed_coords, vec![("t".to_string(), 6.0)]);
    assert_eq!(squeezed.coord(0).unwrap().ndim(), 1);
    assert_values(squeezed.coord(0).unwrap(), &[0.0, 1.0, 2.0]);
    assert_values(squeezed.coord_stag(0).unwrap(), &[-0.5, 0.5, 1.5, 2.5]);
}

#[test]
fn test_remove_and_reduce_dimension() {
    let slice = sample_slice();

    let removed = slice.remove_dimension(0).unwrap();
    assert_eq!(removed.dimensions, dims(&["y"]));
    assert!(removed.data.is_none());
    assert_values(removed.coord(0).unwrap(), &[10.0, 20.0]);

    let mean = slice.reduce_dimension(0, StatOperation::Mean).unwrap();
    assert_values(mean.data().unwrap(), &[2.0, 3.0]);
    let max = slice.reduce_dimension(1, StatOperation::Max).unwrap();
    assert_eq!(max.dimensions, dims(&["x"]));
    assert_values(max.data().unwrap(), &[1.0, 3.0, 5.0]);

    assert!(slice.remove_dimension(2).is_err());
}

#[test]
fn test_set_data_keeps_slice_on_failure() {
    let mut slice = sample_slice();
    let before = slice.clone();

    let err = slice.set_data(ArrayD::zeros(vec![2, 2])).unwrap_err();
    assert!(matches!(err, PlotVarError::ShapeMismatch { .. }));
    assert_eq!(slice, before);

    slice.set_data(ArrayD::ones(vec![3, 2])).unwrap();
    assert_values(slice.data().unwrap(), &[1.0; 6]);
}

#[test]
fn test_generate_staggered_rejects_curvilinear() {
    let mut slice = Slice::from_parts(
        dims(&["x"]),
        vec![array![0.0, 1.0].into_dyn()],
        vec![array![-0.5, 0.5, 1.5].into_dyn()],
        array![1.0, 2.0].into_dyn(),
    )
    .unwrap();
    slice.generate_staggered().unwrap();

    let mut curvilinear = Slice::new(dims(&["x", "y"]));
    curvilinear.coords = vec![
        Some(ArrayD::zeros(vec![2, 2])),
        Some(array![0.0, 1.0].into_dyn()),
    ];
    let err = curvilinear.generate_staggered().unwrap_err();
    assert!(matches!(err, PlotVarError::UnsupportedGrid { .. }));
}

#[test]
fn test_generated_interfaces_separate_uneven_centers() {
    let centers = array![0.0, 1.0, 3.0, 7.0];
    let slice = Slice::with_centers(
        dims(&["depth"]),
        vec![centers.clone().into_dyn()],
        array![1.0, 2.0, 3.0, 4.0].into_dyn(),
    )
    .unwrap();

    let interfaces = slice.coord_stag(0).unwrap();
    assert_eq!(interfaces.len(), centers.len() + 1);
    for (i, pair) in centers.windows(2).into_iter().enumerate() {
        let interface = interfaces[IxDyn(&[i + 1])];
        assert!(pair[0] < interface && interface < pair[1]);
    }
    // Outer interfaces enclose the first and last centers
    assert!(interfaces[IxDyn(&[0])] < centers[0]);
    assert!(interfaces[IxDyn(&[centers.len()])] > centers[centers.len() - 1]);
}
