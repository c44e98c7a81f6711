//! Tests for stored, forwarding and function-defined variables

use approx::assert_abs_diff_eq;
use ndarray::{array, Array, ArrayD, Dimension};
use plotvar::config::CoreConfig;
use plotvar::errors::PlotVarError;
use plotvar::variable::{
    materialize, DataType, DerivedVariable, DimensionInfo, FunctionVariable, StoredVariable,
    Variable,
};
use std::sync::Arc;

fn assert_values<D: Dimension>(actual: &Array<f64, D>, expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "length of {actual:?}");
    for (a, e) in actual.iter().zip(expected) {
        if e.is_nan() {
            assert!(a.is_nan(), "expected NaN, got {a}");
        } else {
            assert_abs_diff_eq!(*a, *e, epsilon = 1e-12);
        }
    }
}

fn dims(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn profile() -> StoredVariable {
    StoredVariable::from_arrays(
        "temp",
        dims(&["x"]),
        vec![array![1.0, 2.0, 3.0, 4.0, 5.0].into_dyn()],
        array![10.0, 20.0, 30.0, 40.0, 50.0].into_dyn(),
    )
    .unwrap()
}

/// Template over the given dimensions; only its metadata matter.
fn template(names: &[&str]) -> Arc<dyn Variable> {
    let coords = names.iter().map(|_| array![0.0, 1.0].into_dyn()).collect();
    let data = ArrayD::zeros(vec![2; names.len()]);
    Arc::new(
        StoredVariable::from_arrays("f", dims(names), coords, data)
            .unwrap()
            .with_unit("m"),
    )
}

#[test]
fn test_stored_variable_metadata() {
    let variable = profile();
    assert_eq!(variable.name(), "temp");
    assert_eq!(variable.long_name(), "temp");
    assert_eq!(variable.unit(), "");
    assert_eq!(variable.shape(), Some(vec![5]));

    let info = DimensionInfo {
        label: "Distance".to_string(),
        unit: "km".to_string(),
        datatype: DataType::Float,
        ..DimensionInfo::default()
    };
    let variable = variable
        .with_long_name("Temperature")
        .with_unit("K")
        .with_dimension_info("x", info.clone());
    assert_eq!(variable.long_name(), "Temperature");
    assert_eq!(variable.unit(), "K");
    assert_eq!(variable.dimension_info("x"), info);
    assert_eq!(variable.dimension_info("y"), DimensionInfo::default());
}

#[test]
fn test_stored_variable_bounded_slice() {
    let variable = profile();

    // Whole variable
    let all = variable.get_slice(&[]).unwrap();
    assert_values(all.data().unwrap(), &[10.0, 20.0, 30.0, 40.0, 50.0]);

    // The range is relaxed by one sample on each side
    let sub = variable.get_slice(&[(Some(2.5), Some(3.5))]).unwrap();
    assert_values(sub.data().unwrap(), &[20.0, 30.0, 40.0]);
    assert_values(sub.coord(0).unwrap(), &[2.0, 3.0, 4.0]);
    assert_values(sub.coord_stag(0).unwrap(), &[1.5, 2.5, 3.5, 4.5]);

    let lower_only = variable.get_slice(&[(Some(4.5), None)]).unwrap();
    assert_values(lower_only.data().unwrap(), &[40.0, 50.0]);
}

#[test]
fn test_stored_variable_bounds_outside_data() {
    let variable = profile();
    let empty = variable.get_slice(&[(Some(10.0), Some(20.0))]).unwrap();
    assert_eq!(empty.data().unwrap().shape(), &[0]);
    assert!(empty.check().is_ok());
}

#[test]
fn test_stored_variable_rejects_wrong_bound_count() {
    let err = profile()
        .get_slice(&[(None, None), (None, None)])
        .unwrap_err();
    assert!(matches!(err, PlotVarError::ShapeMismatch { .. }));
}

#[test]
fn test_derived_variable_forwards() {
    let derived = DerivedVariable::new(Arc::new(profile().with_unit("K"))).with_forced_name("t2");
    assert_eq!(derived.name(), "t2");
    assert_eq!(derived.name_raw(), "temp");
    assert_eq!(derived.unit(), "K");
    assert_eq!(derived.dimensions(), dims(&["x"]));

    let slice = derived.get_slice(&[(Some(4.5), None)]).unwrap();
    assert_values(slice.data().unwrap(), &[40.0, 50.0]);
}

#[test]
fn test_function_variable_metadata_from_source() {
    let mut function = FunctionVariable::new(template(&["x"]));
    function.add_function("x", None).unwrap();
    assert_eq!(function.name(), "f");
    assert_eq!(function.unit(), "m");
    assert_eq!(function.dimensions(), dims(&["x"]));
    assert_eq!(function.shape(), None);
    assert_eq!(function.resolution(), 100);
    assert_eq!(function.function_count(), 1);
}

#[test]
fn test_function_variable_grid() {
    let mut function = FunctionVariable::new(template(&["x"]));
    function.set_resolution(5).unwrap();
    function.set_dimension_bounds("x", 0.0, 1.0);
    function.add_function("2 * x", None).unwrap();

    let slice = function.get_slice(&[]).unwrap();
    assert!(slice.is_valid());
    assert_values(slice.coord(0).unwrap(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
    assert_values(
        slice.coord_stag(0).unwrap(),
        &[-0.125, 0.125, 0.375, 0.625, 0.875, 1.125],
    );
    assert_values(slice.data().unwrap(), &[0.0, 0.5, 1.0, 1.5, 2.0]);
}

#[test]
fn test_function_variable_single_point_uses_bound_width() {
    let mut function = FunctionVariable::new(template(&["x"]));
    function.set_resolution(1).unwrap();
    function.set_dimension_bounds("x", 2.0, 4.0);
    function.add_function("x", None).unwrap();

    let slice = function.get_slice(&[]).unwrap();
    assert_values(slice.data().unwrap(), &[2.0]);
    assert_values(slice.coord_stag(0).unwrap(), &[1.0, 3.0]);
}

#[test]
fn test_function_variable_priority_and_gaps() {
    let mut function = FunctionVariable::new(template(&["x"]));
    function.set_resolution(5).unwrap();
    function.set_dimension_bounds("x", 0.0, 1.0);
    function.add_function("1", Some("x < 0.5")).unwrap();
    function.add_function("2", Some("x <= 0.75")).unwrap();

    for vectorized in [false, true] {
        function.set_vectorized(vectorized);
        let slice = function.get_slice(&[]).unwrap();
        // Earlier functions win; points no function covers are NaN
        assert_values(slice.data().unwrap(), &[1.0, 1.0, 2.0, 2.0, f64::NAN]);
    }
}

#[test]
fn test_function_variable_modes_agree() {
    let mut function = FunctionVariable::new(template(&["x", "y"]));
    function.set_resolution(7).unwrap();
    function.set_dimension_bounds("x", -1.0, 1.0);
    function.set_dimension_bounds("y", 0.0, 2.0);
    function
        .add_function("x * y", Some("x > 0 && y < 1.5"))
        .unwrap();
    function.add_function("sin(pi * x) + y ** 2", None).unwrap();

    function.set_vectorized(false);
    let pointwise = function.get_slice(&[]).unwrap();
    function.set_vectorized(true);
    let vectorized = function.get_slice(&[]).unwrap();

    assert_eq!(pointwise.data().unwrap().shape(), &[7, 7]);
    assert_eq!(pointwise.coord_stag(0).unwrap().shape(), &[8, 8]);
    for (a, b) in pointwise
        .data()
        .unwrap()
        .iter()
        .zip(vectorized.data().unwrap())
    {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
    }
}

#[test]
fn test_function_variable_dimension_transform() {
    let mut function = FunctionVariable::new(template(&["x"]));
    function.set_resolution(5).unwrap();
    function.set_dimension_bounds("x", 0.0, 4.0);
    function.add_dimension_transform("x", 2.0, 2.0).unwrap();
    function.add_function("x", None).unwrap();

    let slice = function.get_slice(&[]).unwrap();
    assert_values(slice.data().unwrap(), &[-1.0, -0.5, 0.0, 0.5, 1.0]);
    // Coordinates stay untransformed
    assert_values(slice.coord(0).unwrap(), &[0.0, 1.0, 2.0, 3.0, 4.0]);

    let err = function.add_dimension_transform("x", 0.0, 0.0).unwrap_err();
    assert!(matches!(err, PlotVarError::InvalidSetting { ref path, .. } if path == "scale/x"));
    let err = function
        .add_dimension_transform("x", 0.0, f64::INFINITY)
        .unwrap_err();
    assert!(matches!(err, PlotVarError::InvalidSetting { .. }));
}

#[test]
fn test_function_variable_errors() {
    let mut function = FunctionVariable::new(template(&["x", "y"]));

    let err = function.add_function("x + z", None).unwrap_err();
    assert!(matches!(err, PlotVarError::NameNotFound { .. }));
    let err = function.add_function("1", Some("a['x'] > 0")).unwrap_err();
    assert!(matches!(err, PlotVarError::NameNotFound { .. }));
    let err = function.add_function("x +", None).unwrap_err();
    assert!(matches!(err, PlotVarError::ExpressionSyntax { .. }));
    assert_eq!(function.function_count(), 0);

    function.add_function("x", None).unwrap();
    function.set_dimension_bounds("x", 0.0, 1.0);
    let err = function.get_slice(&[]).unwrap_err();
    assert!(matches!(err, PlotVarError::MissingBounds { ref dimension } if dimension == "y"));

    let err = function.set_resolution(0).unwrap_err();
    assert!(matches!(err, PlotVarError::InvalidSetting { ref path, .. } if path == "resolution"));
    function.clear_functions();
    assert_eq!(function.function_count(), 0);
}

#[test]
fn test_function_variable_uses_config() {
    let config = CoreConfig {
        resolution: 3,
        vectorized: true,
        ..CoreConfig::default()
    };
    let mut function = FunctionVariable::with_config(template(&["x"]), &config);
    assert_eq!(function.resolution(), 3);
    assert!(function.is_vectorized());

    function.set_dimension_bounds("x", 0.0, 1.0);
    function.add_function("x", None).unwrap();
    assert_values(function.get_slice(&[]).unwrap().data().unwrap(), &[0.0, 0.5, 1.0]);
}

#[test]
fn test_materialize_function_variable() {
    let mut function = FunctionVariable::new(template(&["x"]));
    function.set_resolution(3).unwrap();
    function.set_dimension_bounds("x", 0.0, 2.0);
    function.add_function("x ** 2", None).unwrap();

    let stored = materialize(&function).unwrap();
    assert_eq!(stored.name(), "f");
    assert_eq!(stored.unit(), "m");
    assert_eq!(stored.shape(), Some(vec![3]));
    assert_values(stored.slice().data().unwrap(), &[0.0, 1.0, 4.0]);
}
