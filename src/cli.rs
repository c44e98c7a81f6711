//! Defines command-line interface options using `clap` for the plotvar application.

use clap::Parser;
use plotvar::statistics::StatOperation;
use std::path::PathBuf;

/// Evaluate piecewise functions of dimensions on a regular grid
#[derive(Parser, Debug)]
#[command(
    name = "plotvar",
    version,
    about = "Evaluate piecewise functions of dimensions on a regular grid"
)]
pub struct Args {
    /// Dimension and its grid extent, formatted as <name>=<min>:<max>. Repeat in dimension order.
    #[arg(long = "dim", value_parser = parse_dim_arg, required = true)]
    pub dims: Vec<DimExtent>,

    /// Function of the dimensions, optionally guarded as '<expr> if <condition>'.
    /// Repeatable; earlier functions take priority.
    #[arg(short, long = "function", required = true)]
    pub functions: Vec<String>,

    /// Grid points per dimension. Overrides the configuration file.
    #[arg(short, long)]
    pub resolution: Option<usize>,

    /// Evaluate over whole arrays instead of point by point
    #[arg(long, default_value_t = false)]
    pub vectorized: bool,

    /// Offset subtracted from a dimension before evaluation, formatted as <name>=<value>
    #[arg(long = "offset", value_parser = parse_assignment)]
    pub offsets: Vec<(String, f64)>,

    /// Scale dividing a dimension before evaluation, formatted as <name>=<value>
    #[arg(long = "scale", value_parser = parse_assignment)]
    pub scales: Vec<(String, f64)>,

    /// Summarise the result by the percentile in [0, 1] along --along
    #[arg(long, requires = "along", conflicts_with = "reduce")]
    pub percentile: Option<f64>,

    /// Summarise the result by mean, sum, min or max along --along
    #[arg(long, requires = "along")]
    pub reduce: Option<StatOperation>,

    /// Dimension summarised by --percentile or --reduce
    #[arg(long)]
    pub along: Option<String>,

    /// Name of the evaluated variable
    #[arg(long, default_value = "f")]
    pub name: String,

    /// Unit of the evaluated variable
    #[arg(long, default_value = "")]
    pub unit: String,

    /// JSON file with core configuration (resolution, vectorized)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimExtent {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

/// Split '<expr> if <condition>' into its parts.
pub fn split_function(text: &str) -> (&str, Option<&str>) {
    match text.split_once(" if ") {
        Some((function, condition)) => (function.trim(), Some(condition.trim())),
        None => (text.trim(), None),
    }
}

fn parse_dim_arg(s: &str) -> Result<DimExtent, String> {
    let (name, range) = s
        .split_once('=')
        .ok_or_else(|| "Invalid format: Expected '<name>=<min>:<max>'.".to_string())?;
    let (min, max) = range
        .split_once(':')
        .ok_or_else(|| "Invalid format: Expected '<name>=<min>:<max>'.".to_string())?;
    let min = min
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid minimum for dimension '{name}'"))?;
    let max = max
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid maximum for dimension '{name}'"))?;
    if name.trim().is_empty() {
        return Err("Dimension name must not be empty".to_string());
    }
    Ok(DimExtent {
        name: name.trim().to_string(),
        min,
        max,
    })
}

fn parse_assignment(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| "Invalid format: Expected '<name>=<value>'.".to_string())?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid value for dimension '{name}'"))?;
    Ok((name.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dimension_extents() {
        let dim = parse_dim_arg("x=-1.5:2").unwrap();
        assert_eq!(dim.name, "x");
        assert_eq!(dim.min, -1.5);
        assert_eq!(dim.max, 2.0);
        assert!(parse_dim_arg("x=1").is_err());
        assert!(parse_dim_arg("=0:1").is_err());
    }

    #[test]
    fn splits_guarded_functions() {
        assert_eq!(split_function("x * 2 if x > 0"), ("x * 2", Some("x > 0")));
        assert_eq!(split_function(" sin(x) "), ("sin(x)", None));
    }

    #[test]
    fn parses_args() {
        let args = Args::try_parse_from([
            "plotvar", "--dim", "x=0:1", "-f", "x", "--reduce", "max", "--along", "x",
        ])
        .unwrap();
        assert_eq!(args.reduce, Some(StatOperation::Max));
        assert!(Args::try_parse_from(["plotvar", "--dim", "x=0:1", "-f", "x", "--reduce", "max"])
            .is_err());
    }
}
