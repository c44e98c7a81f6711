//! Variables defined by piecewise functions of their dimensions

use super::{Bounds, DimensionInfo, Variable};
use crate::config::CoreConfig;
use crate::errors::{PlotVarError, Result};
use crate::expression::{Expr, Symbol};
use crate::grid::{ndgrid, stagger, DefaultDelta};
use crate::slice::Slice;
use ndarray::{Array1, ArrayD, Dimension, IxDyn, Zip};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// One `(condition, function)` pair; no condition means "everywhere".
#[derive(Debug, Clone)]
struct Piece {
    condition: Option<Expr>,
    function: Expr,
}

/// Evaluates an ordered list of functions of the dimension coordinates on a
/// regular grid spanning configured bounds.
///
/// Name, units and dimensions come from a source variable; the data do not.
/// At every grid point the first function whose condition holds supplies
/// the value; points where no function applies are NaN. The result is the
/// same whether the functions are evaluated per point or over whole arrays
/// (vectorized mode).
#[derive(Debug, Clone)]
pub struct FunctionVariable {
    source: Arc<dyn Variable>,
    dim_bounds: HashMap<String, (f64, f64)>,
    dim_transforms: HashMap<String, (f64, f64)>,
    resolution: usize,
    vectorized: bool,
    functions: Vec<Piece>,
}

impl FunctionVariable {
    pub fn new(source: Arc<dyn Variable>) -> Self {
        Self::with_config(source, &CoreConfig::default())
    }

    /// Take the grid resolution and evaluation mode from `config`.
    pub fn with_config(source: Arc<dyn Variable>, config: &CoreConfig) -> Self {
        Self {
            source,
            dim_bounds: HashMap::new(),
            dim_transforms: HashMap::new(),
            resolution: config.resolution.max(1),
            vectorized: config.vectorized,
            functions: Vec::new(),
        }
    }

    /// Append a function, optionally guarded by a condition.
    ///
    /// Earlier functions take priority. Every name used must be one of the
    /// variable's dimensions.
    pub fn add_function(&mut self, function: &str, condition: Option<&str>) -> Result<()> {
        let function = self.parse_checked(function)?;
        let condition = condition.map(|c| self.parse_checked(c)).transpose()?;
        self.functions.push(Piece {
            condition,
            function,
        });
        Ok(())
    }

    pub fn clear_functions(&mut self) {
        self.functions.clear();
    }

    #[must_use]
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Grid extent for `dimension`; required for every dimension before
    /// [`Variable::get_slice`].
    pub fn set_dimension_bounds(&mut self, dimension: impl Into<String>, min: f64, max: f64) {
        self.dim_bounds.insert(dimension.into(), (min, max));
    }

    /// Functions see `(coordinate - offset) / scale` for `dimension`.
    pub fn add_dimension_transform(
        &mut self,
        dimension: impl Into<String>,
        offset: f64,
        scale: f64,
    ) -> Result<()> {
        let dimension = dimension.into();
        if scale == 0.0 || !scale.is_finite() {
            return Err(PlotVarError::invalid_setting(
                format!("scale/{dimension}"),
                format!("must be finite and non-zero, got {scale}"),
            ));
        }
        self.dim_transforms.insert(dimension, (offset, scale));
        Ok(())
    }

    /// Number of grid points per dimension.
    pub fn set_resolution(&mut self, resolution: usize) -> Result<()> {
        if resolution == 0 {
            return Err(PlotVarError::invalid_setting(
                "resolution",
                "must be at least 1",
            ));
        }
        self.resolution = resolution;
        Ok(())
    }

    #[must_use]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn set_vectorized(&mut self, vectorized: bool) {
        self.vectorized = vectorized;
    }

    #[must_use]
    pub fn is_vectorized(&self) -> bool {
        self.vectorized
    }

    fn parse_checked(&self, text: &str) -> Result<Expr> {
        let expr = Expr::parse(text)?;
        let dimensions = self.dimensions();
        for symbol in expr.symbols() {
            if symbol.scope.is_some() || !dimensions.contains(&symbol.name) {
                return Err(PlotVarError::name_not_found(symbol.to_string()));
            }
        }
        Ok(expr)
    }

    fn evaluate_vectorized(&self, data: &mut ArrayD<f64>, coords: &[(String, ArrayD<f64>)]) -> Result<()> {
        let lookup = |symbol: &Symbol| {
            coords
                .iter()
                .find(|(name, _)| symbol.scope.is_none() && *name == symbol.name)
                .map(|(_, c)| c)
        };
        let shape = data.shape().to_vec();

        // Lowest priority first, so earlier functions overwrite later ones.
        for piece in self.functions.iter().rev() {
            let values = piece.function.eval_array(&lookup)?.into_array(&shape)?;
            match &piece.condition {
                None => data.assign(&values),
                Some(condition) => {
                    let mask = condition.eval_array(&lookup)?.into_array(&shape)?;
                    Zip::from(&mut *data)
                        .and(&mask)
                        .and(&values)
                        .for_each(|d, &m, &v| {
                            if m != 0.0 {
                                *d = v;
                            }
                        });
                }
            }
        }
        Ok(())
    }

    fn evaluate_pointwise(&self, data: &mut ArrayD<f64>, coords: &[(String, ArrayD<f64>)]) -> Result<()> {
        for (idx, slot) in data.indexed_iter_mut() {
            let position = idx.slice();
            let lookup = |symbol: &Symbol| {
                coords
                    .iter()
                    .find(|(name, _)| symbol.scope.is_none() && *name == symbol.name)
                    .map(|(_, c)| c[position])
            };
            for piece in &self.functions {
                let applies = match &piece.condition {
                    None => true,
                    Some(condition) => condition.eval_scalar(&lookup)? != 0.0,
                };
                if applies {
                    *slot = piece.function.eval_scalar(&lookup)?;
                    break;
                }
            }
        }
        Ok(())
    }
}

impl Variable for FunctionVariable {
    fn name_raw(&self) -> String {
        self.source.name_raw()
    }

    fn name(&self) -> String {
        self.source.name()
    }

    fn long_name(&self) -> String {
        self.source.long_name()
    }

    fn unit(&self) -> String {
        self.source.unit()
    }

    fn dimensions_raw(&self) -> Vec<String> {
        self.source.dimensions_raw()
    }

    fn dimensions(&self) -> Vec<String> {
        self.source.dimensions()
    }

    fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        self.source.dimension_info(dimension)
    }

    /// The shape follows the configured resolution, not stored data.
    fn shape(&self) -> Option<Vec<usize>> {
        None
    }

    /// Bounds are ignored: the grid always spans the configured bounds.
    fn get_slice(&self, _bounds: &[Bounds]) -> Result<Slice> {
        let dimensions = self.dimensions();

        let mut extents = Vec::with_capacity(dimensions.len());
        for dimension in &dimensions {
            let &(min, max) = self.dim_bounds.get(dimension).ok_or_else(|| {
                PlotVarError::MissingBounds {
                    dimension: dimension.clone(),
                }
            })?;
            extents.push((min, max));
        }
        debug!(
            variable = %self.name(),
            resolution = self.resolution,
            vectorized = self.vectorized,
            "evaluating function variable"
        );

        let axes: Vec<Array1<f64>> = extents
            .iter()
            .map(|&(min, max)| Array1::linspace(min, max, self.resolution))
            .collect();
        let centers = ndgrid(&axes);

        let mut interfaces = Vec::with_capacity(centers.len());
        for (k, grid) in centers.iter().enumerate() {
            let (min, max) = extents[k];
            let width = if max == min { 1.0 } else { max - min };
            let own = dimensions[k].as_str();
            let spacing = move |name: &str, _: &ArrayD<f64>| if name == own { width } else { 0.0 };
            let default = DefaultDelta {
                dim_names: &dimensions,
                delta: &spacing,
            };
            interfaces.push(stagger(grid, None, Some(&default))?);
        }

        let transformed: Vec<(String, ArrayD<f64>)> = dimensions
            .iter()
            .zip(&centers)
            .map(|(name, grid)| {
                let values = match self.dim_transforms.get(name) {
                    Some(&(offset, scale)) => grid.mapv(|c| (c - offset) / scale),
                    None => grid.clone(),
                };
                (name.clone(), values)
            })
            .collect();

        let shape: Vec<usize> = axes.iter().map(|a| a.len()).collect();
        let mut data = ArrayD::from_elem(IxDyn(&shape), f64::NAN);
        if self.vectorized {
            self.evaluate_vectorized(&mut data, &transformed)?;
        } else {
            self.evaluate_pointwise(&mut data, &transformed)?;
        }

        Slice::from_parts(dimensions, centers, interfaces, data)
    }
}
