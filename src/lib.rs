//! plotvar: dimension-aware variables for plotting scientific datasets
//!
//! A Rust library for describing gridded data as named variables with
//! dimensions, coordinates and cell interfaces, slicing them by coordinate
//! bounds, and deriving new variables from expressions or from piecewise
//! functions of the dimensions. Everything is evaluated lazily, on request,
//! and single-threaded.
//!
//! ## Key Features
//!
//! - **Slices**: data plus center and staggered (interface) coordinates, with
//!   indexing, squeezing and dimension reduction that keep them consistent
//! - **Variables**: stored, forwarding and function-defined variables behind
//!   one [`Variable`](variable::Variable) trait
//! - **Expressions**: a small parsed expression language over store variables,
//!   evaluated per point or over whole arrays with identical results
//! - **Grid utilities**: cell centers, interface staggering on rectilinear and
//!   curvilinear grids, bound searches and linear interpolation
//! - **Statistics**: weighted percentiles and axis reductions
//!
//! ## Module Organization
//!
//! - [`slice`]: the [`Slice`](slice::Slice) container
//! - [`variable`]: the variable trait and its implementations
//! - [`store`]: variable stores, labels, expression variables and schema trees
//! - [`expression`]: expression parsing and evaluation
//! - [`grid`]: centers, staggering and grid construction
//! - [`interp`]: index searches and 1-D interpolation
//! - [`statistics`]: percentiles and reductions
//! - [`config`]: core defaults and the settings store
//! - [`dates`]: datetime coordinates as day numbers
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust
//! use ndarray::array;
//! use plotvar::prelude::*;
//!
//! let temp = StoredVariable::from_arrays(
//!     "temp",
//!     vec!["x".to_string()],
//!     vec![array![0.0, 1.0, 2.0].into_dyn()],
//!     array![1.0, 2.0, 3.0].into_dyn(),
//! )
//! .unwrap()
//! .with_unit("K");
//!
//! let store = VariableStore::new(MemorySource::new().with_variable(temp));
//! let doubled = store.get_expression("temp * 2", None).unwrap();
//! let slice = doubled.get_slice(&[]).unwrap();
//! assert_eq!(slice.data().unwrap(), &array![2.0, 4.0, 6.0].into_dyn());
//! ```

pub mod config;
pub mod dates;
pub mod errors;
pub mod expression;
pub mod grid;
pub mod interp;
pub mod slice;
pub mod statistics;
pub mod store;
pub mod variable;

pub use errors::{PlotVarError, Result};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::config::{CoreConfig, Settings};
    pub use crate::errors::{PlotVarError, Result};
    pub use crate::expression::Expr;
    pub use crate::slice::{Slice, SliceArg};
    pub use crate::statistics::{StatOperation, StatisticalReduction};
    pub use crate::store::{DataSource, MemorySource, SchemaNode, StoreEntry, VariableStore};
    pub use crate::variable::{
        Bounds, DerivedVariable, DimensionInfo, FunctionVariable, StoredVariable, Variable,
    };
}
