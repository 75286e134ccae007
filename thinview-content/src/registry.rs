//! Authoritative component store.
//!
//! Components live in exactly one of four partitions (active, removed,
//! replaced, desktop) or in none once destroyed. [`ComponentRegistry::apply_deltas`]
//! merges a server batch in array order and then runs two finalization
//! passes: one child-set notification per distinct parent, then one property
//! notification per surviving component.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace, warn};

use crate::bus::{EventBus, Notification};
use crate::children::{ChildFilter, ChildIndex};
use crate::component::{Component, ComponentDelta, ComponentId, ComponentKind};
use crate::synthesis::{self, LayoutRedirect};

/// How many destroyed ids the registry remembers for lifecycle queries.
pub const DESTROYED_MEMORY: usize = 4096;

/// Where a batch of deltas is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    Screen,
    Desktop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Active,
    Removed,
    Replaced,
    Desktop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Absent,
    Active,
    Removed,
    ReplacedActive,
    ReplacedRemoved,
    Destroyed,
}

/// A component detached by its parent, kept for re-attachment.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Detached {
    pub(crate) component: Component,
    pub(crate) scope: Scope,
}

/// Skeletal record of a component a custom replacement renders.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Replacement {
    pub(crate) component: Component,
    pub(crate) removed: bool,
}

/// Side effects of one batch the store reacts to after the registry is done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Every id a delta in the batch addressed, in first-seen order.
    pub touched: Vec<ComponentId>,
    /// (navigation name, component id) pairs seen on screen panels.
    pub navigation: Vec<(String, ComponentId)>,
    /// Components whose data book switched identity.
    pub rebound_data_books: Vec<ComponentId>,
    pub skipped: usize,
}

/// Scratch state for one apply batch.
#[derive(Debug, Default)]
pub(crate) struct Batch {
    pub(crate) parents: IndexSet<ComponentId>,
    pub(crate) touched: IndexSet<ComponentId>,
    pub(crate) navigation: Vec<(String, ComponentId)>,
    pub(crate) rebound: Vec<ComponentId>,
}

#[derive(Debug)]
pub struct ComponentRegistry {
    pub(crate) active: IndexMap<ComponentId, Component>,
    pub(crate) removed: IndexMap<ComponentId, Detached>,
    pub(crate) replaced: IndexMap<ComponentId, Replacement>,
    pub(crate) desktop: IndexMap<ComponentId, Component>,
    pub(crate) index: ChildIndex,
    /// Recently destroyed ids, oldest first, capped at [`DESTROYED_MEMORY`].
    /// Only diagnostics read it; an id that ages out reads as absent.
    destroyed: IndexSet<ComponentId>,
    replacements: HashSet<String>,
    bus: Arc<EventBus>,
}

impl ComponentRegistry {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            active: IndexMap::new(),
            removed: IndexMap::new(),
            replaced: IndexMap::new(),
            desktop: IndexMap::new(),
            index: ChildIndex::new(),
            destroyed: IndexSet::new(),
            replacements: HashSet::new(),
            bus,
        }
    }

    /// Marks components with this name as rendered by a custom replacement.
    pub fn register_replacement(&mut self, name: impl Into<String>) {
        self.replacements.insert(name.into());
    }

    pub fn unregister_replacement(&mut self, name: &str) -> bool {
        self.replacements.remove(name)
    }

    pub fn is_replacement(&self, name: &str) -> bool {
        self.replacements.contains(name)
    }

    // ── Lookups ─────────────────────────────────────────────────────

    pub fn partition_of(&self, id: &str) -> Option<Partition> {
        if self.active.contains_key(id) {
            Some(Partition::Active)
        } else if self.removed.contains_key(id) {
            Some(Partition::Removed)
        } else if self.replaced.contains_key(id) {
            Some(Partition::Replaced)
        } else if self.desktop.contains_key(id) {
            Some(Partition::Desktop)
        } else {
            None
        }
    }

    pub fn lifecycle(&self, id: &str) -> LifecycleState {
        match self.partition_of(id) {
            Some(Partition::Active) | Some(Partition::Desktop) => LifecycleState::Active,
            Some(Partition::Removed) => LifecycleState::Removed,
            Some(Partition::Replaced) => {
                if self.replaced.get(id).is_some_and(|r| r.removed) {
                    LifecycleState::ReplacedRemoved
                } else {
                    LifecycleState::ReplacedActive
                }
            }
            None if self.destroyed.contains(id) => LifecycleState::Destroyed,
            None => LifecycleState::Absent,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.partition_of(id).is_some()
    }

    /// Looks `id` up across every partition.
    pub fn get(&self, id: &str) -> Option<&Component> {
        self.active
            .get(id)
            .or_else(|| self.removed.get(id).map(|d| &d.component))
            .or_else(|| self.replaced.get(id).map(|r| &r.component))
            .or_else(|| self.desktop.get(id))
    }

    /// Looks `id` up among renderable components only.
    pub fn get_visible_tree(&self, id: &str) -> Option<&Component> {
        self.active
            .get(id)
            .or_else(|| self.desktop.get(id))
            .or_else(|| {
                self.replaced
                    .get(id)
                    .filter(|r| !r.removed)
                    .map(|r| &r.component)
            })
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Component> {
        if let Some(component) = self.active.get_mut(id) {
            return Some(component);
        }
        if let Some(detached) = self.removed.get_mut(id) {
            return Some(&mut detached.component);
        }
        if let Some(replacement) = self.replaced.get_mut(id) {
            return Some(&mut replacement.component);
        }
        self.desktop.get_mut(id)
    }

    /// First active component carrying `name`.
    pub fn get_by_name(&self, name: &str) -> Option<&Component> {
        self.active
            .values()
            .chain(self.desktop.values())
            .find(|c| c.name.as_deref() == Some(name))
    }

    pub fn has_active_name(&self, name: &str) -> bool {
        self.active.values().any(|c| c.name.as_deref() == Some(name))
    }

    /// Children of `parent` as stored in the child index, projected by `filter`.
    pub fn children_of(&self, parent: &str, filter: &ChildFilter) -> Vec<&Component> {
        self.index
            .child_ids(parent)
            .filter_map(|id| match filter {
                ChildFilter::IncludeRemoved => self.get(id),
                _ => self.get_visible_tree(id),
            })
            .filter(|c| filter.accepts(c))
            .collect()
    }

    /// Parent the child index currently files `id` under.
    pub fn indexed_parent(&self, id: &str) -> Option<&ComponentId> {
        self.index.parent_of(id)
    }

    /// Name of the root component above `id`, i.e. the screen it belongs to.
    pub fn screen_name_of(&self, id: &str) -> Option<String> {
        let mut seen = HashSet::new();
        let mut current = self.get(id)?;
        while let Some(parent) = current.parent.as_deref() {
            if !seen.insert(current.id.clone()) {
                break;
            }
            match self.get(parent) {
                Some(next) => current = next,
                None => break,
            }
        }
        current.name.clone()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn replaced_count(&self) -> usize {
        self.replaced.len()
    }

    pub fn desktop_count(&self) -> usize {
        self.desktop.len()
    }

    pub fn active_ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.active.keys()
    }

    pub fn all_ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.active
            .keys()
            .chain(self.removed.keys())
            .chain(self.replaced.keys())
            .chain(self.desktop.keys())
    }

    // ── Batch application ───────────────────────────────────────────

    /// Applies a server batch in array order. Never fails; deltas without an
    /// id are skipped and the rest of the batch continues.
    pub fn apply_deltas(&mut self, deltas: Vec<ComponentDelta>, scope: Scope) -> BatchOutcome {
        let mut batch = Batch::default();
        let mut skipped = 0;
        let total = deltas.len();

        for delta in deltas {
            if delta.id.is_empty() {
                warn!("skipping component delta without id");
                skipped += 1;
                continue;
            }
            self.apply_delta(delta, scope, &mut batch);
        }

        for parent in &batch.parents {
            self.bus.notify(Notification::ChildrenChanged {
                parent: parent.clone(),
            });
        }

        let mut refreshed: IndexSet<ComponentId> = IndexSet::new();
        for id in &batch.touched {
            if !self.contains(id) {
                continue;
            }
            refreshed.insert(id.clone());
            for helper in synthesis::synthetic_ids(self, id) {
                refreshed.insert(helper);
            }
        }
        for id in refreshed {
            self.bus.notify(Notification::PropertiesChanged { id });
        }

        debug!(
            deltas = total,
            skipped,
            parents = batch.parents.len(),
            touched = batch.touched.len(),
            ?scope,
            "applied component batch"
        );

        BatchOutcome {
            touched: batch.touched.into_iter().collect(),
            navigation: batch.navigation,
            rebound_data_books: batch.rebound,
            skipped,
        }
    }

    fn apply_delta(&mut self, mut delta: ComponentDelta, scope: Scope, batch: &mut Batch) {
        let id = delta.id.clone();
        batch.touched.insert(id.clone());

        let Some(partition) = self.partition_of(&id) else {
            if delta.is_destroy() {
                trace!(id = %id, "destroy for unknown component ignored");
                return;
            }
            if self.destroyed.shift_remove(&id) {
                warn!(id = %id, "component id reused after destroy, treating it as new");
            }
            self.insert_new(delta, scope, batch);
            return;
        };

        if partition == Partition::Replaced {
            self.update_replaced(&delta, batch);
            return;
        }

        // Toolbar panels hand layout updates to their center helper.
        let becomes_toolbar = match &delta.class_name {
            Some(kind) => kind.is_toolbar_panel(),
            None => self.get(&id).is_some_and(|c| c.kind.is_toolbar_panel()),
        };
        let redirect = if becomes_toolbar && synthesis::has_toolbar_helpers(self, &id) {
            LayoutRedirect {
                layout: delta.layout.take(),
                layout_data: delta.layout_data.take(),
            }
        } else {
            LayoutRedirect::default()
        };

        let Some(component) = self.get_mut(&id) else {
            return;
        };
        let outcome = component.merge(&delta);
        if outcome.data_book_rebound {
            batch.rebound.push(id.clone());
        }
        if let Some(navigation) = &delta.screen_navigation_name {
            batch.navigation.push((navigation.clone(), id.clone()));
        }

        synthesis::synthesize(self, &id, redirect, batch);
        self.reindex(&id, batch);

        if delta.is_destroy() {
            self.destroy(&id, batch);
            return;
        }
        match partition {
            Partition::Active | Partition::Desktop if delta.is_removal() => {
                self.detach(&id, batch);
            }
            Partition::Removed if !delta.is_removal() => {
                self.reattach(&id, batch);
            }
            _ => {}
        }
    }

    fn insert_new(&mut self, delta: ComponentDelta, scope: Scope, batch: &mut Batch) {
        let id = delta.id.clone();
        let replaced = delta
            .name
            .as_deref()
            .is_some_and(|name| self.replacements.contains(name));

        if replaced {
            let component = Component::skeleton_from(&delta);
            self.replaced.insert(
                id.clone(),
                Replacement {
                    component,
                    removed: delta.is_removal(),
                },
            );
            self.reindex(&id, batch);
            return;
        }

        let component = Component::from_delta(&delta);
        if let Some(navigation) = &component.screen.navigation_name {
            batch.navigation.push((navigation.clone(), id.clone()));
        }
        if delta.is_removal() {
            self.removed
                .insert(id.clone(), Detached { component, scope });
        } else {
            match scope {
                Scope::Screen => self.active.insert(id.clone(), component),
                Scope::Desktop => self.desktop.insert(id.clone(), component),
            };
        }

        synthesis::synthesize(self, &id, LayoutRedirect::default(), batch);
        self.reindex(&id, batch);
    }

    fn update_replaced(&mut self, delta: &ComponentDelta, batch: &mut Batch) {
        let id = delta.id.clone();
        if delta.is_destroy() {
            self.destroy(&id, batch);
            return;
        }
        let Some(replacement) = self.replaced.get_mut(&id) else {
            return;
        };
        replacement.component.merge_skeleton(delta);
        let removed = delta.is_removal();
        let toggled = replacement.removed != removed;
        replacement.removed = removed;
        self.reindex(&id, batch);
        if toggled {
            if let Some(parent) = self.index.parent_of(&id) {
                batch.parents.insert(parent.clone());
            }
        }
    }

    /// Files `id` under the parent the index should hold for it right now.
    pub(crate) fn reindex(&mut self, id: &str, batch: &mut Batch) {
        let desired = synthesis::index_parent_for(self, id);
        let current = self.index.parent_of(id).cloned();
        if desired == current {
            return;
        }
        if let Some(old) = self.index.detach(id) {
            batch.parents.insert(old);
        }
        if let Some(new) = desired {
            self.index.attach(id, &new);
            batch.parents.insert(new);
        }
    }

    /// Moves `id` and its synthetic helpers to the removed partition.
    fn detach(&mut self, id: &str, batch: &mut Batch) {
        let mut ids = vec![id.to_string()];
        ids.extend(synthesis::synthetic_ids(self, id));
        for member in ids {
            let scope = if self.desktop.contains_key(&member) {
                Scope::Desktop
            } else {
                Scope::Screen
            };
            let component = match scope {
                Scope::Screen => self.active.shift_remove(&member),
                Scope::Desktop => self.desktop.shift_remove(&member),
            };
            if let Some(component) = component {
                self.removed
                    .insert(member.clone(), Detached { component, scope });
            }
        }
        if let Some(parent) = self.index.parent_of(id) {
            batch.parents.insert(parent.clone());
        }
    }

    /// Moves `id` and its helpers back to the partition they were removed from.
    fn reattach(&mut self, id: &str, batch: &mut Batch) {
        let mut ids = vec![id.to_string()];
        ids.extend(synthesis::synthetic_ids(self, id));
        for member in ids {
            if let Some(detached) = self.removed.shift_remove(&member) {
                match detached.scope {
                    Scope::Screen => self.active.insert(member, detached.component),
                    Scope::Desktop => self.desktop.insert(member, detached.component),
                };
            }
        }
        if let Some(parent) = self.index.parent_of(id) {
            batch.parents.insert(parent.clone());
        }
    }

    /// Drops `id` and its helpers from every partition for good.
    fn destroy(&mut self, id: &str, batch: &mut Batch) {
        let mut ids = vec![id.to_string()];
        ids.extend(synthesis::synthetic_ids(self, id));
        for member in ids {
            self.take(&member);
            if let Some(parent) = self.index.detach(&member) {
                batch.parents.insert(parent);
            }
            self.remember_destroyed(member);
        }
    }

    fn remember_destroyed(&mut self, id: ComponentId) {
        self.destroyed.shift_remove(&id);
        self.destroyed.insert(id);
        if self.destroyed.len() > DESTROYED_MEMORY {
            self.destroyed.shift_remove_index(0);
        }
    }

    fn take(&mut self, id: &str) -> Option<Component> {
        self.active
            .shift_remove(id)
            .or_else(|| self.removed.shift_remove(id).map(|d| d.component))
            .or_else(|| self.replaced.shift_remove(id).map(|r| r.component))
            .or_else(|| self.desktop.shift_remove(id))
    }

    /// Client-side cleanup of a closed screen: drops `root`, everything below
    /// it and its synthetic wrappers. Ids stay reusable.
    pub fn delete_subtree(&mut self, root: &str) -> Vec<ComponentId> {
        let mut batch = Batch::default();
        let mut ids = vec![root.to_string()];
        ids.extend(synthesis::synthetic_ids(self, root));
        let mut below = Vec::new();
        for id in &ids {
            below.extend(self.index.descendants(id));
        }
        ids.extend(below);

        let mut deleted = Vec::new();
        let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        for id in &ids {
            if self.take(id).is_some() {
                deleted.push(id.clone());
            }
            if let Some(parent) = self.index.detach(id) {
                if !doomed.contains(parent.as_str()) {
                    batch.parents.insert(parent);
                }
            }
        }
        for id in &ids {
            self.index.drop_children(id);
        }

        for parent in &batch.parents {
            self.bus.notify(Notification::ChildrenChanged {
                parent: parent.clone(),
            });
        }
        debug!(root, deleted = deleted.len(), "deleted component subtree");
        deleted
    }

    /// Clears every partition at once (logout, session expiry).
    pub fn reset(&mut self) {
        self.active.clear();
        self.removed.clear();
        self.replaced.clear();
        self.desktop.clear();
        self.index.clear();
        self.destroyed.clear();
    }

    pub(crate) fn insert_synthetic(&mut self, component: Component, like: &str) {
        let id = component.id.clone();
        match self.partition_of(like) {
            Some(Partition::Desktop) => {
                self.desktop.insert(id, component);
            }
            Some(Partition::Removed) => {
                let scope = self
                    .removed
                    .get(like)
                    .map(|d| d.scope)
                    .unwrap_or_default();
                self.removed.insert(id, Detached { component, scope });
            }
            _ => {
                self.active.insert(id, component);
            }
        }
    }

    pub(crate) fn kind_of(&self, id: &str) -> Option<&ComponentKind> {
        self.get(id).map(|c| &c.kind)
    }
}
