//! Client-side expansion of toolbar panels and modal panels.
//!
//! A toolbar panel gets two helpers: `<id>-tbMain` holds the toolbars, docked
//! to the edge its `toolBarArea` names, and `<id>-tbCenter` takes over the
//! panel's own layout and content. A modal panel gets one `<id>-popup`
//! wrapper that sits where the panel would have been. Helpers always share
//! the partition of their panel.

use serde_json::json;

use crate::component::{Component, ComponentId, ComponentKind, TOOLBAR_PANEL_LAYOUT};
use crate::registry::{Batch, ComponentRegistry};

pub const TOOLBAR_MAIN_SUFFIX: &str = "-tbMain";
pub const TOOLBAR_CENTER_SUFFIX: &str = "-tbCenter";
pub const POPUP_WRAPPER_SUFFIX: &str = "-popup";

/// Layout fields taken off a toolbar panel delta, destined for its center helper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LayoutRedirect {
    pub(crate) layout: Option<String>,
    pub(crate) layout_data: Option<String>,
}

impl LayoutRedirect {
    fn is_empty(&self) -> bool {
        self.layout.is_none() && self.layout_data.is_none()
    }
}

/// (main, center) helper ids for a toolbar panel.
pub fn toolbar_helper_ids(panel: &str) -> (ComponentId, ComponentId) {
    (
        format!("{panel}{TOOLBAR_MAIN_SUFFIX}"),
        format!("{panel}{TOOLBAR_CENTER_SUFFIX}"),
    )
}

pub fn popup_wrapper_id(panel: &str) -> ComponentId {
    format!("{panel}{POPUP_WRAPPER_SUFFIX}")
}

pub(crate) fn has_toolbar_helpers(registry: &ComponentRegistry, panel: &str) -> bool {
    let (main, _) = toolbar_helper_ids(panel);
    registry.contains(&main)
}

/// Synthetic components currently owned by `id`.
pub(crate) fn synthetic_ids(registry: &ComponentRegistry, id: &str) -> Vec<ComponentId> {
    if registry.kind_of(id).is_some_and(ComponentKind::is_synthetic) {
        return Vec::new();
    }
    let (main, center) = toolbar_helper_ids(id);
    [main, center, popup_wrapper_id(id)]
        .into_iter()
        .filter(|candidate| {
            registry
                .kind_of(candidate)
                .is_some_and(ComponentKind::is_synthetic)
        })
        .collect()
}

/// Parent the child index should file `id` under, after synthesis redirects.
pub(crate) fn index_parent_for(registry: &ComponentRegistry, id: &str) -> Option<ComponentId> {
    let component = registry.get(id)?;
    if component.kind.is_synthetic() {
        return component.parent.clone();
    }
    if component.screen.is_modal() {
        let wrapper = popup_wrapper_id(id);
        if registry.contains(&wrapper) {
            return Some(wrapper);
        }
    }
    let parent = component.parent.as_deref()?;
    let parent_is_toolbar = registry
        .kind_of(parent)
        .is_some_and(ComponentKind::is_toolbar_panel);
    if parent_is_toolbar && has_toolbar_helpers(registry, parent) {
        let (main, center) = toolbar_helper_ids(parent);
        return Some(if component.kind == ComponentKind::ToolBar {
            main
        } else {
            center
        });
    }
    Some(parent.to_string())
}

/// Creates or updates the synthetic children of `id` after a merge.
pub(crate) fn synthesize(
    registry: &mut ComponentRegistry,
    id: &str,
    redirect: LayoutRedirect,
    batch: &mut Batch,
) {
    let Some(component) = registry.get(id) else {
        return;
    };
    if component.kind.is_synthetic() {
        return;
    }
    let is_toolbar = component.kind.is_toolbar_panel();
    let is_modal = component.screen.is_modal();

    if is_toolbar {
        if has_toolbar_helpers(registry, id) {
            update_toolbar(registry, id, redirect, batch);
        } else {
            create_toolbar_helpers(registry, id, batch);
        }
    }
    if is_modal {
        sync_popup_wrapper(registry, id, batch);
    }
}

fn create_toolbar_helpers(registry: &mut ComponentRegistry, id: &str, batch: &mut Batch) {
    let Some(panel) = registry.get(id) else {
        return;
    };
    let area = panel.tool_bar_area.unwrap_or_default();
    let name = panel.name.clone();
    let layout = panel.layout.clone();
    let layout_data = panel.layout_data.clone();
    let (main_id, center_id) = toolbar_helper_ids(id);

    let mut main = Component::new(main_id.clone(), ComponentKind::ToolBarHelperMain);
    main.parent = Some(id.to_string());
    main.name = name.as_ref().map(|n| format!("{n}{TOOLBAR_MAIN_SUFFIX}"));
    main.constraints = Some(area.constraint().to_string());
    main.properties
        .insert("orientation".to_string(), json!(orientation(area.is_vertical())));

    let mut center = Component::new(center_id.clone(), ComponentKind::ToolBarHelperCenter);
    center.parent = Some(id.to_string());
    center.name = name.as_ref().map(|n| format!("{n}{TOOLBAR_CENTER_SUFFIX}"));
    center.constraints = Some("Center".to_string());
    center.layout = layout;
    center.layout_data = layout_data;

    if let Some(panel) = registry.get_mut(id) {
        panel.layout = Some(TOOLBAR_PANEL_LAYOUT.to_string());
        panel.layout_data = None;
    }

    registry.insert_synthetic(main, id);
    registry.insert_synthetic(center, id);
    registry.reindex(&main_id, batch);
    registry.reindex(&center_id, batch);

    // Content that arrived before its toolbar panel moves under the helpers.
    let waiting: Vec<ComponentId> = registry
        .index
        .child_ids(id)
        .filter(|child| **child != main_id && **child != center_id)
        .cloned()
        .collect();
    for child in waiting {
        registry.reindex(&child, batch);
    }

    batch.touched.insert(main_id);
    batch.touched.insert(center_id);
}

fn update_toolbar(
    registry: &mut ComponentRegistry,
    id: &str,
    redirect: LayoutRedirect,
    batch: &mut Batch,
) {
    let (main_id, center_id) = toolbar_helper_ids(id);
    let area = registry
        .get(id)
        .and_then(|panel| panel.tool_bar_area)
        .unwrap_or_default();

    if !redirect.is_empty() {
        if let Some(center) = registry.get_mut(&center_id) {
            if let Some(layout) = redirect.layout {
                center.layout = Some(layout);
            }
            if let Some(layout_data) = redirect.layout_data {
                center.layout_data = Some(layout_data);
            }
            batch.touched.insert(center_id);
        }
    }

    if let Some(main) = registry.get_mut(&main_id) {
        if main.constraints.as_deref() != Some(area.constraint()) {
            main.constraints = Some(area.constraint().to_string());
            main.properties
                .insert("orientation".to_string(), json!(orientation(area.is_vertical())));
            batch.touched.insert(main_id);
        }
    }
}

fn sync_popup_wrapper(registry: &mut ComponentRegistry, id: &str, batch: &mut Batch) {
    let Some(panel) = registry.get(id) else {
        return;
    };
    let parent = panel.parent.clone();
    let name = panel.name.clone();
    let title = panel.screen.title.clone();
    let wrapper_id = popup_wrapper_id(id);

    match registry.get_mut(&wrapper_id) {
        Some(wrapper) => {
            let mut changed = false;
            if wrapper.parent != parent {
                wrapper.parent = parent;
                changed = true;
            }
            if title.is_some() && wrapper.screen.title != title {
                wrapper.screen.title = title;
                changed = true;
            }
            if changed {
                registry.reindex(&wrapper_id, batch);
                batch.touched.insert(wrapper_id);
            }
        }
        None => {
            let mut wrapper = Component::new(wrapper_id.clone(), ComponentKind::PopupWrapper);
            wrapper.parent = parent;
            wrapper.name = name.map(|n| format!("{n}{POPUP_WRAPPER_SUFFIX}"));
            wrapper.constraints = Some("Center".to_string());
            wrapper.screen.title = title;
            registry.insert_synthetic(wrapper, id);
            registry.reindex(&wrapper_id, batch);
            batch.touched.insert(wrapper_id);
        }
    }
}

fn orientation(vertical: bool) -> u8 {
    if vertical { 1 } else { 0 }
}
