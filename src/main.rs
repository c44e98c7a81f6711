//! Entry point for the plotvar application.
//! Builds a function variable from the command line, evaluates it on a grid and prints a summary.

use clap::Parser;
use ndarray::{Array1, ArrayD};
use plotvar::prelude::*;
use plotvar::statistics::{cumulative_weights, get_percentile, sort_along_axis};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{split_function, Args};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => CoreConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => CoreConfig::default(),
    };
    if let Some(resolution) = args.resolution {
        config.resolution = resolution;
    }
    config.vectorized |= args.vectorized;

    let variable = build_function_variable(&args, &config)?;
    let slice = variable.get_slice(&[])?;
    info!(shape = ?slice.data()?.shape(), "evaluated {}", variable.name());

    let slice = match &args.along {
        Some(dimension) => {
            let axis = slice
                .dimensions
                .iter()
                .position(|d| d == dimension)
                .ok_or_else(|| PlotVarError::name_not_found(dimension.as_str()))?;
            if let Some(value) = args.percentile {
                percentile_along(&slice, axis, value)?
            } else if let Some(operation) = args.reduce {
                slice.reduce_dimension(axis, operation)?
            } else {
                slice
            }
        }
        None => slice,
    };

    print_summary(&variable, &slice, &args)?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Function variable over a template with one two-point axis per `--dim`.
fn build_function_variable(args: &Args, config: &CoreConfig) -> Result<FunctionVariable> {
    let dimensions: Vec<String> = args.dims.iter().map(|d| d.name.clone()).collect();
    let coords: Vec<ArrayD<f64>> = args
        .dims
        .iter()
        .map(|d| Array1::linspace(d.min, d.max, 2).into_dyn())
        .collect();
    let shape = vec![2; dimensions.len()];
    let template = StoredVariable::from_arrays(
        args.name.as_str(),
        dimensions,
        coords,
        ArrayD::zeros(shape),
    )?
    .with_unit(args.unit.as_str());

    let mut variable = FunctionVariable::with_config(Arc::new(template), config);
    variable.set_resolution(config.resolution)?;
    for dim in &args.dims {
        variable.set_dimension_bounds(dim.name.as_str(), dim.min, dim.max);
    }

    let mut transforms: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for (name, offset) in &args.offsets {
        transforms.entry(name).or_insert((0.0, 1.0)).0 = *offset;
    }
    for (name, scale) in &args.scales {
        transforms.entry(name).or_insert((0.0, 1.0)).1 = *scale;
    }
    for (name, (offset, scale)) in transforms {
        variable.add_dimension_transform(name, offset, scale)?;
    }

    for text in &args.functions {
        let (function, condition) = split_function(text);
        debug!(function, ?condition, "adding function");
        variable.add_function(function, condition)?;
    }
    Ok(variable)
}

/// Equal-weight percentile of the sorted data along `axis`.
fn percentile_along(slice: &Slice, axis: usize, value: f64) -> Result<Slice> {
    let sorted = sort_along_axis(slice.data()?, axis)?;
    let weights = cumulative_weights(&ArrayD::ones(sorted.raw_dim()), axis)?;
    let mut out = slice.remove_dimension(axis)?;
    out.set_data(get_percentile(&sorted, &weights, value, axis)?)?;
    Ok(out)
}

fn print_summary(variable: &FunctionVariable, slice: &Slice, args: &Args) -> Result<()> {
    let data = slice.data()?;
    let unit = variable.unit();
    println!("Variable: {}", variable.name());
    if !unit.is_empty() {
        println!("  Unit: {unit}");
    }
    if let Some(along) = &args.along {
        if let Some(value) = args.percentile {
            println!("  Summary: percentile {value} along '{along}'");
        } else if let Some(operation) = args.reduce {
            println!("  Summary: {operation} along '{along}'");
        }
    }
    println!("  Dimensions:");
    for (i, name) in slice.dimensions.iter().enumerate() {
        let coord = slice.coord(i)?;
        let (lo, hi) = finite_range(coord.iter().copied());
        println!("    {name}: {} points, {lo} .. {hi}", data.shape()[i]);
    }
    for (name, value) in &slice.fixed_coords {
        println!("    {name} = {value} (fixed)");
    }

    let finite: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    println!("  Shape: {:?}", data.shape());
    println!("  Defined points: {} of {}", finite.len(), data.len());
    if !finite.is_empty() {
        let (min, max) = finite_range(finite.iter().copied());
        let mean = finite.iter().sum::<f64>() / finite.len() as f64;
        println!("  Min: {min}");
        println!("  Mean: {mean}");
        println!("  Max: {max}");
    }
    Ok(())
}

fn finite_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}
