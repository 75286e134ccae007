//! Parent → children adjacency derived from the registry.
//!
//! Each child id is attached to at most one parent; re-attaching moves it.
//! Read-time filtering lives in [`ChildFilter`], there is no second stored
//! structure per filter.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;

use crate::component::{Component, ComponentId, ComponentKind};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChildFilter {
    /// Every attached child, visible or not.
    #[default]
    All,
    /// Children whose `visible` flag is not false.
    Visible,
    /// Children of one kind only.
    Kind(ComponentKind),
    /// Like `All`, but also yields children currently in the removed partition.
    IncludeRemoved,
}

impl ChildFilter {
    pub fn accepts(&self, component: &Component) -> bool {
        match self {
            ChildFilter::All | ChildFilter::IncludeRemoved => true,
            ChildFilter::Visible => component.is_visible(),
            ChildFilter::Kind(kind) => component.kind == *kind,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChildIndex {
    children: HashMap<ComponentId, IndexSet<ComponentId>>,
    parents: HashMap<ComponentId, ComponentId>,
}

impl ChildIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `child` under `parent`, returning the parent it left (if any).
    pub fn attach(&mut self, child: &str, parent: &str) -> Option<ComponentId> {
        if self.parents.get(child).map(String::as_str) == Some(parent) {
            return None;
        }
        let previous = self.detach(child);
        self.children
            .entry(parent.to_string())
            .or_default()
            .insert(child.to_string());
        self.parents.insert(child.to_string(), parent.to_string());
        previous
    }

    /// Removes `child` from its parent's set, returning that parent.
    pub fn detach(&mut self, child: &str) -> Option<ComponentId> {
        let parent = self.parents.remove(child)?;
        if let Some(set) = self.children.get_mut(&parent) {
            set.shift_remove(child);
            if set.is_empty() {
                self.children.remove(&parent);
            }
        }
        Some(parent)
    }

    /// Forgets the forward edges of `parent`; its children keep no parent.
    pub fn drop_children(&mut self, parent: &str) -> Vec<ComponentId> {
        let Some(set) = self.children.remove(parent) else {
            return Vec::new();
        };
        for child in &set {
            self.parents.remove(child);
        }
        set.into_iter().collect()
    }

    pub fn parent_of(&self, child: &str) -> Option<&ComponentId> {
        self.parents.get(child)
    }

    /// Child ids of `parent` in attach order.
    pub fn child_ids(&self, parent: &str) -> impl Iterator<Item = &ComponentId> {
        self.children.get(parent).into_iter().flatten()
    }

    pub fn child_count(&self, parent: &str) -> usize {
        self.children.get(parent).map_or(0, IndexSet::len)
    }

    /// Every id below `root`, depth first, root excluded. Each id is
    /// visited once, so a parent cycle ends the walk instead of looping.
    pub fn descendants(&self, root: &str) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut seen: HashSet<&str> = HashSet::from([root]);
        let mut stack: Vec<&ComponentId> = self.child_ids(root).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            if !seen.insert(id.as_str()) {
                continue;
            }
            out.push(id.clone());
            let mut below: Vec<&ComponentId> = self.child_ids(id).collect();
            below.reverse();
            stack.extend(below);
        }
        out
    }

    pub fn clear(&mut self) {
        self.children.clear();
        self.parents.clear();
    }
}
