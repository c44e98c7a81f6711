//! Variables that forward to another variable

use super::{Bounds, DimensionInfo, Variable};
use crate::errors::Result;
use crate::slice::Slice;
use crate::store::{DataSource, LabelTable};
use std::sync::Arc;

/// Forwards every request to a source variable.
///
/// Optionally presents the source under a different name, renames dimensions
/// through a sanitized-label table, and looks dimension metadata up in the
/// data source the variable came from.
#[derive(Debug, Clone)]
pub struct DerivedVariable {
    source: Arc<dyn Variable>,
    forced_name: Option<String>,
    labels: Option<Arc<LabelTable>>,
    catalog: Option<Arc<dyn DataSource>>,
}

impl DerivedVariable {
    pub fn new(source: Arc<dyn Variable>) -> Self {
        Self {
            source,
            forced_name: None,
            labels: None,
            catalog: None,
        }
    }

    #[must_use]
    pub fn with_forced_name(mut self, name: impl Into<String>) -> Self {
        self.forced_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_labels(mut self, labels: Option<Arc<LabelTable>>) -> Self {
        self.labels = labels;
        self
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<dyn DataSource>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// The wrapped variable
    #[must_use]
    pub fn source(&self) -> &Arc<dyn Variable> {
        &self.source
    }

    fn raw_dimension<'a>(&'a self, dimension: &'a str) -> &'a str {
        self.labels
            .as_ref()
            .and_then(|labels| labels.raw(dimension))
            .unwrap_or(dimension)
    }
}

impl Variable for DerivedVariable {
    fn name_raw(&self) -> String {
        self.source.name_raw()
    }

    fn name(&self) -> String {
        self.forced_name
            .clone()
            .unwrap_or_else(|| self.source.name())
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
        let raw = self.source.dimensions();
        match &self.labels {
            Some(labels) => raw
                .into_iter()
                .map(|d| labels.sanitized(&d).map(str::to_string).unwrap_or(d))
                .collect(),
            None => raw,
        }
    }

    fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        let raw = self.raw_dimension(dimension);
        match &self.catalog {
            Some(catalog) => catalog.dimension_info_raw(raw),
            None => self.source.dimension_info(raw),
        }
    }

    fn has_reversed_dimensions(&self) -> bool {
        self.source.has_reversed_dimensions()
    }

    fn item_count(&self) -> usize {
        self.source.item_count()
    }

    fn shape(&self) -> Option<Vec<usize>> {
        self.source.shape()
    }

    fn get_slice(&self, bounds: &[Bounds]) -> Result<Slice> {
        let mut slice = self.source.get_slice(bounds)?;
        if slice.ndim() == self.source.dimensions().len() {
            slice.dimensions = self.dimensions();
        }
        Ok(slice)
    }
}
