//! Configuration: core defaults and the scalar settings store
//!
//! [`CoreConfig`] holds the defaults the variable layer needs and is handed
//! in explicitly; nothing is read from process-wide state. [`Settings`] is a
//! small two-layer option store addressed by `/`-separated paths, used by
//! callers that persist user choices (figure sizes, selected variables).

use crate::errors::{PlotVarError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Name of the schema node that collects unplaced variables.
pub const DEFAULT_CATCH_ALL: &str = "other";

/// Defaults for the variable layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Grid points per dimension for function variables
    pub resolution: usize,
    /// Evaluate function variables over whole arrays instead of per point
    pub vectorized: bool,
    /// Schema node receiving variables not placed elsewhere
    pub catch_all_node: String,
    /// Root directory for data collaborators; unused by the core itself
    pub data_root: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            resolution: 100,
            vectorized: false,
            catch_all_node: DEFAULT_CATCH_ALL.to_string(),
            data_root: None,
        }
    }
}

impl CoreConfig {
    /// Parse from JSON; absent fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        if config.resolution == 0 {
            return Err(PlotVarError::invalid_setting("resolution", "must be at least 1"));
        }
        Ok(config)
    }
}

/// Scalar option values with a defaults layer and a variable selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: BTreeMap<String, Value>,
    defaults: BTreeMap<String, Value>,
    selection: Vec<String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults used for figure export.
    pub fn report_defaults() -> Self {
        let mut settings = Self::new();
        for (path, value) in [
            ("Figures/Width", 10),
            ("Figures/Height", 8),
            ("Figures/Resolution", 96),
            ("Figures/FontScaling", 100),
        ] {
            settings.defaults.insert(path.to_string(), Value::from(value));
        }
        settings
    }

    /// Load explicit values from a JSON object; nested objects become
    /// `/`-separated paths and a top-level `"selection"` array of strings
    /// becomes the variable selection.
    pub fn from_json(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text)?;
        let Value::Object(map) = root else {
            return Err(PlotVarError::invalid_setting("", "settings must be a JSON object"));
        };

        let mut settings = Self::new();
        for (key, value) in map {
            if key == "selection" {
                settings.selection = serde_json::from_value(value)?;
            } else {
                settings.load(key, value)?;
            }
        }
        Ok(settings)
    }

    fn load(&mut self, path: String, value: Value) -> Result<()> {
        match value {
            Value::Object(children) => {
                for (key, child) in children {
                    self.load(format!("{path}/{key}"), child)?;
                }
                Ok(())
            }
            other => self.set(path, other),
        }
    }

    /// Replace the defaults layer with the values of `defaults`.
    #[must_use]
    pub fn with_defaults(mut self, defaults: &Settings) -> Self {
        self.defaults = defaults.values.clone();
        self.defaults
            .extend(defaults.defaults.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Store a scalar; `null` removes the explicit value.
    pub fn set(&mut self, path: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let path = path.into();
        let value = check_scalar(&path, value.into())?;
        if value.is_null() {
            self.values.remove(&path);
        } else {
            self.values.insert(path, value);
        }
        Ok(())
    }

    pub fn set_default(&mut self, path: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let path = path.into();
        let value = check_scalar(&path, value.into())?;
        self.defaults.insert(path, value);
        Ok(())
    }

    /// Explicit value only.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.values.get(path)
    }

    /// Explicit value, falling back to the default.
    pub fn get_or_default(&self, path: &str) -> Option<&Value> {
        self.values.get(path).or_else(|| self.defaults.get(path))
    }

    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get_or_default(path).and_then(Value::as_f64)
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Vec<String>) {
        self.selection = selection;
    }

    /// Add a variable path to the selection unless already present.
    pub fn select(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.selection.contains(&path) {
            self.selection.push(path);
        }
    }
}

fn check_scalar(path: &str, value: Value) -> Result<Value> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(PlotVarError::invalid_setting(
            path,
            "only numbers, strings and booleans can be stored",
        )),
        scalar => Ok(scalar),
    }
}
