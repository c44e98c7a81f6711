//! Variables computed lazily from expression text

use super::{StoreEntry, VariableStore};
use crate::errors::{PlotVarError, Result};
use crate::expression::{BinaryOp, Expr, Symbol, UnaryOp, Value};
use crate::slice::Slice;
use crate::variable::{expand_bounds, Bounds, DerivedVariable, DimensionInfo, Variable};
use ndarray::ArrayD;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Expression over store variables, evaluated on every slice request.
///
/// Operands are resolved when the variable is built; their data are only
/// read by [`Variable::get_slice`]. Dimensions and coordinates come from the
/// operand of highest rank.
#[derive(Debug, Clone)]
pub struct ExpressionVariable {
    text: String,
    expr: Expr,
    operands: Vec<(Symbol, Arc<dyn Variable>)>,
}

impl ExpressionVariable {
    pub fn new(
        text: impl Into<String>,
        expr: Expr,
        operands: Vec<(Symbol, Arc<dyn Variable>)>,
    ) -> Self {
        Self {
            text: text.into(),
            expr,
            operands,
        }
    }

    pub fn expression(&self) -> &Expr {
        &self.expr
    }

    /// Expression text as supplied
    pub fn text(&self) -> &str {
        &self.text
    }

    fn operand(&self, symbol: &Symbol) -> Option<&Arc<dyn Variable>> {
        self.operands
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, v)| v)
    }

    /// Operand that dictates dimensions: the first one of highest rank.
    fn primary(&self) -> Option<&Arc<dyn Variable>> {
        let mut best: Option<&Arc<dyn Variable>> = None;
        for (_, variable) in &self.operands {
            let rank = variable.dimensions().len();
            if best.map_or(true, |b| rank > b.dimensions().len()) {
                best = Some(variable);
            }
        }
        best
    }

    /// Bare reference to one operand, which then lends its metadata.
    fn passthrough(&self) -> Option<&Arc<dyn Variable>> {
        self.expr.as_symbol().and_then(|s| self.operand(s))
    }

    /// Unit of `expr`; `None` for constants, which adopt the other operand's
    /// unit under `+` and `-`.
    fn unit_of(&self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Constant(_) => None,
            Expr::Symbol(symbol) => Some(
                self.operand(symbol)
                    .map(|v| v.unit())
                    .unwrap_or_default(),
            ),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
            } => self.unit_of(operand),
            Expr::Binary {
                op: BinaryOp::Add | BinaryOp::Sub,
                lhs,
                rhs,
            } => match (self.unit_of(lhs), self.unit_of(rhs)) {
                (Some(a), Some(b)) if a == b => Some(a),
                (Some(a), None) | (None, Some(a)) => Some(a),
                (None, None) => None,
                _ => Some(String::new()),
            },
            _ => Some(String::new()),
        }
    }
}

impl Variable for ExpressionVariable {
    fn name_raw(&self) -> String {
        match self.passthrough() {
            Some(variable) => variable.name(),
            None => self.text.trim().to_string(),
        }
    }

    fn long_name(&self) -> String {
        match self.passthrough() {
            Some(variable) => variable.long_name(),
            None => self.expr.to_string(),
        }
    }

    fn unit(&self) -> String {
        match self.passthrough() {
            Some(variable) => variable.unit(),
            None => self.unit_of(&self.expr).unwrap_or_default(),
        }
    }

    fn dimensions_raw(&self) -> Vec<String> {
        self.primary().map(|v| v.dimensions()).unwrap_or_default()
    }

    fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        self.primary()
            .map(|v| v.dimension_info(dimension))
            .unwrap_or_default()
    }

    fn has_reversed_dimensions(&self) -> bool {
        self.primary().map_or(false, |v| v.has_reversed_dimensions())
    }

    fn shape(&self) -> Option<Vec<usize>> {
        self.primary().and_then(|v| v.shape())
    }

    /// Bounds are matched to operand dimensions by name.
    fn get_slice(&self, bounds: &[Bounds]) -> Result<Slice> {
        let dimensions = self.dimensions();
        let bounds = expand_bounds(bounds, dimensions.len())?;
        let by_name: HashMap<&str, Bounds> = dimensions
            .iter()
            .map(String::as_str)
            .zip(bounds.iter().copied())
            .collect();
        debug!(expression = %self.expr, ?bounds, "evaluating expression variable");

        let mut slices: Vec<(Symbol, Slice)> = Vec::with_capacity(self.operands.len());
        let mut primary: Option<usize> = None;
        for (symbol, variable) in &self.operands {
            let operand_bounds: Vec<Bounds> = variable
                .dimensions()
                .iter()
                .map(|d| by_name.get(d.as_str()).copied().unwrap_or((None, None)))
                .collect();
            let slice = variable.get_slice(&operand_bounds)?;
            if primary.map_or(true, |p| slice.ndim() > slices[p].1.ndim()) {
                primary = Some(slices.len());
            }
            slices.push((symbol.clone(), slice));
        }

        let arrays: Vec<(&Symbol, &ArrayD<f64>)> = slices
            .iter()
            .map(|(symbol, slice)| Ok((symbol, slice.data()?)))
            .collect::<Result<_>>()?;
        let lookup = |symbol: &Symbol| {
            arrays
                .iter()
                .find(|(s, _)| *s == symbol)
                .map(|(_, a)| *a)
        };
        let value = self.expr.eval_array(&lookup)?;

        let Some(p) = primary else {
            // Constant expression
            let data = value.into_array(&[])?;
            return Slice::from_parts(Vec::new(), Vec::new(), Vec::new(), data);
        };
        let base = &slices[p].1;
        let shape = base.data()?.shape().to_vec();
        let data = match value {
            Value::Array(a) if a.shape() != shape.as_slice() => {
                return Err(PlotVarError::shape_mismatch(format!(
                    "expression '{}' produced shape {:?}, expected {shape:?}",
                    self.expr,
                    a.shape()
                )))
            }
            other => other.into_array(&shape)?,
        };

        let mut out = base.clone();
        out.lbound = None;
        out.ubound = None;
        out.dimensions = dimensions;
        out.set_data(data)?;
        Ok(out)
    }
}

impl VariableStore {
    /// Variable computing `text` over this store's variables.
    ///
    /// Bare names resolve first in the nested store `default_child` (if
    /// given), then in this store; `child['name']` addresses nested stores
    /// explicitly. Any failure is reported as `ExpressionResolution` carrying
    /// the literal text.
    pub fn get_expression(
        &self,
        text: &str,
        default_child: Option<&str>,
    ) -> Result<Arc<dyn Variable>> {
        self.resolve_expression(text, default_child)
            .map(|variable| Arc::new(variable) as Arc<dyn Variable>)
            .map_err(|err| PlotVarError::expression(text, err))
    }

    /// Canonical text of an expression whose names all resolve.
    pub fn normalize_expression(&self, text: &str, default_child: Option<&str>) -> Result<String> {
        self.resolve_expression(text, default_child)
            .map(|variable| variable.expression().to_string())
            .map_err(|err| PlotVarError::expression(text, err))
    }

    fn resolve_expression(
        &self,
        text: &str,
        default_child: Option<&str>,
    ) -> Result<ExpressionVariable> {
        let expr = Expr::parse(text)?;
        let default_store = match default_child {
            None => None,
            Some(name) => match self.children.get(name) {
                Some(StoreEntry::Nested(store)) => Some(store),
                _ => return Err(PlotVarError::name_not_found(name)),
            },
        };

        let mut operands = Vec::new();
        for symbol in expr.symbols() {
            let variable = self.resolve_symbol(&symbol, default_child.zip(default_store))?;
            operands.push((symbol, variable));
        }
        debug!(expression = %expr, operands = operands.len(), "resolved expression");
        Ok(ExpressionVariable::new(text, expr, operands))
    }

    fn resolve_symbol(
        &self,
        symbol: &Symbol,
        default_store: Option<(&str, &VariableStore)>,
    ) -> Result<Arc<dyn Variable>> {
        match &symbol.scope {
            Some(scope) => match self.children.get(scope) {
                Some(StoreEntry::Nested(store)) => {
                    let variable = store.get_variable(&symbol.name)?;
                    Ok(Arc::new(
                        DerivedVariable::new(variable).with_forced_name(symbol.to_string()),
                    ))
                }
                _ => Err(PlotVarError::name_not_found(symbol.to_string())),
            },
            None => {
                if let Some((child, store)) = default_store {
                    if store.contains(&symbol.name) {
                        let variable = store.get_variable(&symbol.name)?;
                        return Ok(Arc::new(
                            DerivedVariable::new(variable)
                                .with_forced_name(Symbol::scoped(child, &symbol.name).to_string()),
                        ));
                    }
                }
                self.get_variable(&symbol.name)
            }
        }
    }
}
