//! Named collections of variables
//!
//! A [`VariableStore`] fronts a [`DataSource`] (the dataset reader) and can
//! hold additional variables and nested stores as children. It resolves
//! names, optionally through sanitized labels, and builds lazily evaluated
//! variables from expression text.
//!
//! # Organization
//!
//! - [`labels`]: sanitized, expression-safe variable labels
//! - [`expression`]: the lazily evaluated [`ExpressionVariable`]
//! - [`tree`]: grouping variables into a display hierarchy

pub mod expression;
pub mod labels;
pub mod tree;

pub use expression::ExpressionVariable;
pub use labels::{sanitize_name, LabelTable};
pub use tree::SchemaNode;

use crate::config::{CoreConfig, DEFAULT_CATCH_ALL};
use crate::errors::{PlotVarError, Result};
use crate::variable::{DerivedVariable, DimensionInfo, Variable};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Capability set of a dataset reader.
pub trait DataSource: fmt::Debug + Send + Sync {
    /// Names of all variables, as stored
    fn variable_names_raw(&self) -> Vec<String>;

    /// Variable by stored name
    fn variable_raw(&self, name: &str) -> Option<Arc<dyn Variable>>;

    /// Names of variables that can be plotted
    fn plottable_variable_names_raw(&self) -> Vec<String> {
        self.variable_names_raw()
    }

    /// Long name per stored variable name
    fn variable_long_names_raw(&self) -> BTreeMap<String, String> {
        self.variable_names_raw()
            .into_iter()
            .filter_map(|name| {
                let long_name = self.variable_raw(&name)?.long_name();
                Some((name, long_name))
            })
            .collect()
    }

    fn dimension_info_raw(&self, _dimension: &str) -> DimensionInfo {
        DimensionInfo::default()
    }
}

/// In-memory [`DataSource`].
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    variables: BTreeMap<String, Arc<dyn Variable>>,
    dimensions: BTreeMap<String, DimensionInfo>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable under its raw name, replacing any previous one.
    pub fn insert(&mut self, variable: Arc<dyn Variable>) {
        self.variables.insert(variable.name_raw(), variable);
    }

    #[must_use]
    pub fn with_variable(mut self, variable: impl Variable + 'static) -> Self {
        self.insert(Arc::new(variable));
        self
    }

    pub fn set_dimension_info(&mut self, dimension: impl Into<String>, info: DimensionInfo) {
        self.dimensions.insert(dimension.into(), info);
    }
}

impl DataSource for MemorySource {
    fn variable_names_raw(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    fn variable_raw(&self, name: &str) -> Option<Arc<dyn Variable>> {
        self.variables.get(name).cloned()
    }

    /// Registered metadata, else whatever the first variable using the
    /// dimension reports.
    fn dimension_info_raw(&self, dimension: &str) -> DimensionInfo {
        if let Some(info) = self.dimensions.get(dimension) {
            return info.clone();
        }
        self.variables
            .values()
            .find(|v| v.dimensions_raw().iter().any(|d| d == dimension))
            .map(|v| v.dimension_info(dimension))
            .unwrap_or_default()
    }
}

/// Child of a [`VariableStore`].
#[derive(Debug, Clone)]
pub enum StoreEntry {
    Leaf(Arc<dyn Variable>),
    Nested(VariableStore),
}

/// Variables from a data source plus named children.
///
/// Leaf children shadow source variables of the same name. Nested stores are
/// addressed as `child['name']` in expressions and all-level name listings.
#[derive(Debug, Clone)]
pub struct VariableStore {
    source: Arc<dyn DataSource>,
    children: BTreeMap<String, StoreEntry>,
    labels: Option<Arc<LabelTable>>,
    catch_all: String,
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new(MemorySource::new())
    }
}

impl VariableStore {
    pub fn new(source: impl DataSource + 'static) -> Self {
        Self::from_source(Arc::new(source))
    }

    pub fn from_source(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            children: BTreeMap::new(),
            labels: None,
            catch_all: DEFAULT_CATCH_ALL.to_string(),
        }
    }

    /// Apply the store-related parts of `config`.
    #[must_use]
    pub fn with_config(mut self, config: &CoreConfig) -> Self {
        self.catch_all = config.catch_all_node.clone();
        self
    }

    /// Schema node that [`variable_tree`](Self::variable_tree) collects
    /// unplaced variables under.
    pub fn catch_all_node(&self) -> &str {
        &self.catch_all
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    /// Add a leaf child under the variable's raw name.
    pub fn add_variable(&mut self, variable: Arc<dyn Variable>) {
        self.children
            .insert(variable.name_raw(), StoreEntry::Leaf(variable));
    }

    pub fn add_child(&mut self, name: impl Into<String>, entry: StoreEntry) {
        self.children.insert(name.into(), entry);
    }

    pub fn remove_child(&mut self, name: &str) -> Result<StoreEntry> {
        self.children
            .remove(name)
            .ok_or_else(|| PlotVarError::name_not_found(name))
    }

    pub fn remove_all_children(&mut self) {
        self.children.clear();
    }

    pub fn child(&self, name: &str) -> Option<&StoreEntry> {
        self.children.get(name)
    }

    /// Address source variables by sanitized labels from now on.
    pub fn relabel_variables(&mut self) {
        let table = LabelTable::build(self.source.variable_names_raw());
        debug!(labels = table.len(), "relabelled variables");
        self.labels = Some(Arc::new(table));
    }

    pub fn labels(&self) -> Option<&LabelTable> {
        self.labels.as_deref()
    }

    /// Whether `name` resolves to a variable.
    pub fn contains(&self, name: &str) -> bool {
        if matches!(self.children.get(name), Some(StoreEntry::Leaf(_))) {
            return true;
        }
        match &self.labels {
            Some(labels) => labels.contains_label(name),
            None => self.source.variable_raw(name).is_some(),
        }
    }

    /// Names of this level's variables.
    pub fn keys(&self) -> Vec<String> {
        self.variable_names(false)
    }

    /// Variable by (sanitized) name; leaf children take precedence.
    ///
    /// Source variables are returned wrapped so that their name reads as the
    /// requested one.
    pub fn get_variable(&self, name: &str) -> Result<Arc<dyn Variable>> {
        if let Some(StoreEntry::Leaf(variable)) = self.children.get(name) {
            return Ok(Arc::clone(variable));
        }

        let raw = match &self.labels {
            Some(labels) => labels
                .raw(name)
                .ok_or_else(|| PlotVarError::name_not_found(name))?,
            None => name,
        };
        let variable = self
            .source
            .variable_raw(raw)
            .ok_or_else(|| PlotVarError::name_not_found(name))?;
        debug!(name, raw, "resolved variable");

        Ok(Arc::new(
            DerivedVariable::new(variable)
                .with_forced_name(name)
                .with_labels(self.labels.clone())
                .with_catalog(Arc::clone(&self.source)),
        ))
    }

    /// Names of all variables; with `all_levels`, nested stores contribute
    /// `child['name']` entries.
    pub fn variable_names(&self, all_levels: bool) -> Vec<String> {
        let mut names = match &self.labels {
            Some(labels) => labels.labels(),
            None => self.source.variable_names_raw(),
        };
        for (child_name, entry) in &self.children {
            match entry {
                StoreEntry::Leaf(_) => {
                    if !names.contains(child_name) {
                        names.push(child_name.clone());
                    }
                }
                StoreEntry::Nested(store) if all_levels => names.extend(
                    store
                        .variable_names(true)
                        .into_iter()
                        .map(|name| format!("{child_name}['{name}']")),
                ),
                StoreEntry::Nested(_) => {}
            }
        }
        names
    }

    /// Names of the plottable variables of this level.
    pub fn plottable_variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .source
            .plottable_variable_names_raw()
            .into_iter()
            .filter_map(|raw| self.label_of(raw))
            .collect();
        for (child_name, entry) in &self.children {
            if matches!(entry, StoreEntry::Leaf(_)) && !names.contains(child_name) {
                names.push(child_name.clone());
            }
        }
        names
    }

    /// Long name per variable name.
    pub fn variable_long_names(&self, all_levels: bool) -> BTreeMap<String, String> {
        let mut long_names: BTreeMap<String, String> = self
            .source
            .variable_long_names_raw()
            .into_iter()
            .filter_map(|(raw, long_name)| Some((self.label_of(raw)?, long_name)))
            .collect();
        for (child_name, entry) in &self.children {
            match entry {
                StoreEntry::Leaf(variable) => {
                    long_names.insert(child_name.clone(), variable.long_name());
                }
                StoreEntry::Nested(store) if all_levels => {
                    for (name, long_name) in store.variable_long_names(true) {
                        long_names.insert(format!("{child_name}['{name}']"), long_name);
                    }
                }
                StoreEntry::Nested(_) => {}
            }
        }
        long_names
    }

    /// Metadata of a (sanitized) dimension name.
    pub fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        let raw = self
            .labels
            .as_ref()
            .and_then(|labels| labels.raw(dimension))
            .unwrap_or(dimension);
        self.source.dimension_info_raw(raw)
    }

    fn label_of(&self, raw: String) -> Option<String> {
        match &self.labels {
            Some(labels) => labels.sanitized(&raw).map(str::to_string),
            None => Some(raw),
        }
    }
}
