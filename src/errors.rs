//! Centralized error handling for plotvar
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! [`PlotVarError`] covers slice geometry, grid synthesis, percentile
//! evaluation, expression resolution and name lookup.

use thiserror::Error;

/// Main error type for plotvar operations
#[derive(Debug, Error)]
pub enum PlotVarError {
    /// Rank or shape invariant violated while building or mutating a slice
    #[error("Shape mismatch: {message}")]
    ShapeMismatch { message: String },

    /// Slice argument that cannot be applied (e.g. a step other than 1)
    #[error("Unsupported slice for dimension '{dimension}': {message}")]
    UnsupportedSlice { dimension: String, message: String },

    /// Curvilinear coordinates where only 1-D coordinates are supported
    #[error("Unsupported grid: {message}")]
    UnsupportedGrid { message: String },

    /// Function variable dimension without configured bounds
    #[error("Dimension boundaries for '{dimension}' were not set")]
    MissingBounds { dimension: String },

    /// Percentile target outside [0, 1]
    #[error("Percentile value {value} must be between 0 and 1")]
    InvalidQuantile { value: f64 },

    /// Expression could not be turned into a variable
    #[error("Unable to resolve expression \"{expression}\" to a valid data object: {source}")]
    ExpressionResolution {
        expression: String,
        #[source]
        source: Box<PlotVarError>,
    },

    /// Expression text that does not parse
    #[error("line {line}, col {col}: {message}")]
    ExpressionSyntax {
        line: usize,
        col: usize,
        message: String,
    },

    /// Unknown variable, dimension or child store
    #[error("Name not found: {name}")]
    NameNotFound { name: String },

    /// Interpolation coordinates that are not strictly increasing
    #[error("Coordinates must be strictly increasing: {message}")]
    NonMonotonicInput { message: String },

    /// Option value that the settings store cannot hold
    #[error("Invalid setting '{path}': {message}")]
    InvalidSetting { path: String, message: String },

    /// Array shape or dimension error raised by ndarray
    #[error("Array error: {0}")]
    Array(#[from] ndarray::ShapeError),

    /// Malformed settings or schema JSON
    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

impl PlotVarError {
    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            message: message.into(),
        }
    }

    /// Create an UnsupportedGrid error.
    pub fn unsupported_grid(message: impl Into<String>) -> Self {
        Self::UnsupportedGrid {
            message: message.into(),
        }
    }

    /// Create a NameNotFound error.
    pub fn name_not_found(name: impl Into<String>) -> Self {
        Self::NameNotFound { name: name.into() }
    }

    /// Create an InvalidSetting error.
    pub fn invalid_setting(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap a failure together with the expression text that caused it.
    pub fn expression(expression: impl Into<String>, source: PlotVarError) -> Self {
        Self::ExpressionResolution {
            expression: expression.into(),
            source: Box::new(source),
        }
    }
}

/// Result type alias for plotvar operations
pub type Result<T> = std::result::Result<T, PlotVarError>;
