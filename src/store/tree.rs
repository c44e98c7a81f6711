//! Pruning a name schema down to the variables a store holds

use super::VariableStore;
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Node of a hierarchical variable schema.
///
/// Leaves are usually variable names; inner nodes are groups. After
/// [`VariableStore::variable_tree`], `selectable` marks nodes that name a
/// variable of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub selectable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SchemaNode>,
}

impl SchemaNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<SchemaNode>) -> Self {
        self.children = children;
        self
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Depth-first search for a node by name, including `self`.
    pub fn find(&self, name: &str) -> Option<&SchemaNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SchemaNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(name))
    }

    /// Remove every descendant called `name`.
    fn remove(&mut self, name: &str) {
        self.children.retain(|child| child.name != name);
        for child in &mut self.children {
            child.remove(name);
        }
    }
}

impl VariableStore {
    /// [`variable_tree_with_catch_all`](Self::variable_tree_with_catch_all)
    /// with the store's catch-all node name.
    pub fn variable_tree(&self, schema: &SchemaNode, plottable_only: bool) -> SchemaNode {
        self.variable_tree_with_catch_all(schema, plottable_only, self.catch_all_node())
    }

    /// Prune `schema` to the variables of this store.
    ///
    /// A node survives if it names a variable or if a descendant survives;
    /// the root always survives. Variables the schema does not mention are
    /// appended to the node called `catch_all` (created under the root if
    /// absent), sorted case-insensitively by long name. The catch-all node is
    /// dropped when nothing is left for it.
    pub fn variable_tree_with_catch_all(
        &self,
        schema: &SchemaNode,
        plottable_only: bool,
        catch_all: &str,
    ) -> SchemaNode {
        let names = if plottable_only {
            self.plottable_variable_names()
        } else {
            self.variable_names(false)
        };
        let long_names = self.variable_long_names(false);
        let available: BTreeSet<&str> = names.iter().map(String::as_str).collect();

        let mut placed = BTreeSet::new();
        let mut tree = schema.clone();
        fill(&mut tree, &available, &long_names, &mut placed);
        tree.children
            .retain_mut(|child| prune(child, &available, &long_names, &mut placed, catch_all));

        let mut remaining: Vec<&String> = names
            .iter()
            .filter(|name| !placed.contains(name.as_str()))
            .collect();
        remaining.sort_by_cached_key(|name| {
            let long_name = long_names.get(*name).map_or("", String::as_str);
            (long_name.to_lowercase(), (*name).clone())
        });
        debug!(
            placed = placed.len(),
            unplaced = remaining.len(),
            "built variable tree"
        );

        if remaining.is_empty() {
            tree.remove(catch_all);
            return tree;
        }
        let leaves = remaining.into_iter().map(|name| SchemaNode {
            name: name.clone(),
            label: long_names.get(name).cloned(),
            selectable: true,
            children: Vec::new(),
        });
        match tree.find_mut(catch_all) {
            Some(node) => node.children.extend(leaves),
            None => tree
                .children
                .push(SchemaNode::new(catch_all).with_children(leaves.collect())),
        }
        tree
    }
}

/// Mark `node` if it names an available variable.
fn fill(
    node: &mut SchemaNode,
    available: &BTreeSet<&str>,
    long_names: &BTreeMap<String, String>,
    placed: &mut BTreeSet<String>,
) -> bool {
    if !available.contains(node.name.as_str()) {
        return false;
    }
    if node.label.is_none() {
        node.label = long_names.get(&node.name).cloned();
    }
    node.selectable = true;
    placed.insert(node.name.clone());
    true
}

/// Whether `node` survives; prunes its subtree in place.
fn prune(
    node: &mut SchemaNode,
    available: &BTreeSet<&str>,
    long_names: &BTreeMap<String, String>,
    placed: &mut BTreeSet<String>,
    catch_all: &str,
) -> bool {
    let matched = fill(node, available, long_names, placed);
    node.children
        .retain_mut(|child| prune(child, available, long_names, placed, catch_all));
    matched || !node.children.is_empty() || node.name == catch_all
}
