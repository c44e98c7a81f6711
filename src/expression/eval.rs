//! Scalar and array evaluation of [`Expr`] trees

use super::{Expr, Function, Symbol};
use crate::errors::{PlotVarError, Result};
use ndarray::{ArrayD, IxDyn, Zip};

/// Outcome of array evaluation: expressions without array operands stay
/// scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Array(ArrayD<f64>),
}

impl Value {
    /// Materialize with the given shape, broadcasting as needed.
    pub fn into_array(self, shape: &[usize]) -> Result<ArrayD<f64>> {
        match self {
            Value::Scalar(v) => Ok(ArrayD::from_elem(IxDyn(shape), v)),
            Value::Array(a) if a.shape() == shape => Ok(a),
            Value::Array(a) => a
                .broadcast(IxDyn(shape))
                .map(|view| view.to_owned())
                .ok_or_else(|| {
                    PlotVarError::shape_mismatch(format!(
                        "cannot broadcast {:?} to {shape:?}",
                        a.shape()
                    ))
                }),
        }
    }
}

/// Broadcast shape of two array shapes (trailing axes aligned).
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let mut shape = vec![0; ndim];
    for i in 0..ndim {
        let da = if i < ndim - a.len() { 1 } else { a[i - (ndim - a.len())] };
        let db = if i < ndim - b.len() { 1 } else { b[i - (ndim - b.len())] };
        shape[i] = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => {
                return Err(PlotVarError::shape_mismatch(format!(
                    "operands with shapes {a:?} and {b:?} cannot be combined"
                )))
            }
        };
    }
    Ok(shape)
}

impl Expr {
    /// Evaluate at a single point; `lookup` supplies symbol values.
    pub fn eval_scalar(&self, lookup: &dyn Fn(&Symbol) -> Option<f64>) -> Result<f64> {
        match self {
            Expr::Constant(v) => Ok(*v),
            Expr::Symbol(symbol) => {
                lookup(symbol).ok_or_else(|| PlotVarError::name_not_found(symbol.to_string()))
            }
            Expr::Unary { op, operand } => Ok(op.apply(operand.eval_scalar(lookup)?)),
            Expr::Binary { op, lhs, rhs } => {
                Ok(op.apply(lhs.eval_scalar(lookup)?, rhs.eval_scalar(lookup)?))
            }
            Expr::Call { function, args } => {
                check_arity(*function, args.len())?;
                let values = args
                    .iter()
                    .map(|a| a.eval_scalar(lookup))
                    .collect::<Result<Vec<_>>>()?;
                Ok(function.apply(&values))
            }
        }
    }

    /// Evaluate over whole arrays; `lookup` supplies symbol arrays.
    ///
    /// Operands are combined with trailing-axis broadcasting.
    pub fn eval_array<'a>(
        &self,
        lookup: &dyn Fn(&Symbol) -> Option<&'a ArrayD<f64>>,
    ) -> Result<Value> {
        match self {
            Expr::Constant(v) => Ok(Value::Scalar(*v)),
            Expr::Symbol(symbol) => lookup(symbol)
                .map(|a| Value::Array(a.clone()))
                .ok_or_else(|| PlotVarError::name_not_found(symbol.to_string())),
            Expr::Unary { op, operand } => {
                let op = *op;
                Ok(match operand.eval_array(lookup)? {
                    Value::Scalar(v) => Value::Scalar(op.apply(v)),
                    Value::Array(a) => Value::Array(a.mapv_into(|v| op.apply(v))),
                })
            }
            Expr::Binary { op, lhs, rhs } => {
                let op = *op;
                combine2(lhs.eval_array(lookup)?, rhs.eval_array(lookup)?, |a, b| {
                    op.apply(a, b)
                })
            }
            Expr::Call { function, args } => {
                let function = *function;
                check_arity(function, args.len())?;
                let mut values = args
                    .iter()
                    .map(|a| a.eval_array(lookup))
                    .collect::<Result<Vec<_>>>()?;
                match values.len() {
                    1 => Ok(match values.remove(0) {
                        Value::Scalar(v) => Value::Scalar(function.apply(&[v])),
                        Value::Array(a) => Value::Array(a.mapv_into(|v| function.apply(&[v]))),
                    }),
                    2 => {
                        let b = values.remove(1);
                        let a = values.remove(0);
                        combine2(a, b, |x, y| function.apply(&[x, y]))
                    }
                    _ => {
                        let c = values.remove(2);
                        let b = values.remove(1);
                        let a = values.remove(0);
                        combine3(a, b, c, |x, y, z| function.apply(&[x, y, z]))
                    }
                }
            }
        }
    }
}

fn check_arity(function: Function, count: usize) -> Result<()> {
    if count != function.arity() {
        return Err(PlotVarError::shape_mismatch(format!(
            "function '{}' takes {} argument(s), got {count}",
            function.name(),
            function.arity()
        )));
    }
    Ok(())
}

fn combine2(a: Value, b: Value, f: impl Fn(f64, f64) -> f64) -> Result<Value> {
    Ok(match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => Value::Scalar(f(x, y)),
        (Value::Array(x), Value::Scalar(y)) => Value::Array(x.mapv_into(|v| f(v, y))),
        (Value::Scalar(x), Value::Array(y)) => Value::Array(y.mapv_into(|v| f(x, v))),
        (Value::Array(x), Value::Array(y)) => {
            let shape = broadcast_shape(x.shape(), y.shape())?;
            let x = Value::Array(x).into_array(&shape)?;
            let y = Value::Array(y).into_array(&shape)?;
            Value::Array(Zip::from(&x).and(&y).map_collect(|&p, &q| f(p, q)))
        }
    })
}

fn combine3(a: Value, b: Value, c: Value, f: impl Fn(f64, f64, f64) -> f64) -> Result<Value> {
    if let (Value::Scalar(x), Value::Scalar(y), Value::Scalar(z)) = (&a, &b, &c) {
        return Ok(Value::Scalar(f(*x, *y, *z)));
    }
    let mut shape: Vec<usize> = Vec::new();
    for value in [&a, &b, &c] {
        if let Value::Array(arr) = value {
            shape = broadcast_shape(&shape, arr.shape())?;
        }
    }
    let x = a.into_array(&shape)?;
    let y = b.into_array(&shape)?;
    let z = c.into_array(&shape)?;
    Ok(Value::Array(
        Zip::from(&x)
            .and(&y)
            .and(&z)
            .map_collect(|&p, &q, &r| f(p, q, r)),
    ))
}
