//! Sanitized variable labels usable as expression identifiers

use crate::expression::named_constant;
use std::collections::BTreeMap;
use tracing::warn;

/// Turn an arbitrary variable name into an identifier.
///
/// Every character other than an ASCII letter, digit or underscore becomes
/// `_`, and names that would start with a digit (or are empty) get a leading
/// underscore.
pub fn sanitize_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Bijective mapping between raw names and sanitized labels.
///
/// Names that are already valid identifiers keep their name. Other raw
/// names that sanitize to a taken label are told apart with a numeric suffix
/// (`a_b`, `a_b_2`, ...), in the order they are supplied. Reserved constant
/// names such as `pi` are never handed out as labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    raw_by_label: BTreeMap<String, String>,
    label_by_raw: BTreeMap<String, String>,
}

impl LabelTable {
    pub fn build<I, S>(raw_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (clean, unclean): (Vec<String>, Vec<String>) = raw_names
            .into_iter()
            .map(|raw| raw.as_ref().to_string())
            .partition(|raw| sanitize_name(raw) == *raw);

        let mut table = Self::default();
        for raw in clean.iter().chain(&unclean) {
            let raw = raw.as_str();
            if table.label_by_raw.contains_key(raw) {
                continue;
            }
            let base = sanitize_name(raw);
            let mut label = base.clone();
            let mut suffix = 2;
            while table.raw_by_label.contains_key(&label) || named_constant(&label).is_some() {
                label = format!("{base}_{suffix}");
                suffix += 1;
            }
            if label != base {
                warn!(raw, label = %label, "sanitized variable name is taken or reserved, using suffixed label");
            }
            table.raw_by_label.insert(label.clone(), raw.to_string());
            table.label_by_raw.insert(raw.to_string(), label);
        }
        table
    }

    /// Raw name behind a sanitized label
    pub fn raw(&self, label: &str) -> Option<&str> {
        self.raw_by_label.get(label).map(String::as_str)
    }

    /// Sanitized label of a raw name
    pub fn sanitized(&self, raw: &str) -> Option<&str> {
        self.label_by_raw.get(raw).map(String::as_str)
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.raw_by_label.contains_key(label)
    }

    /// Sanitized labels in sorted order
    pub fn labels(&self) -> Vec<String> {
        self.raw_by_label.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.raw_by_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_by_label.is_empty()
    }
}
