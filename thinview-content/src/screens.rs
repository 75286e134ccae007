//! Active screen stack, navigation names and screen history.
//!
//! The stack is ordered bottom to top: index 0 is the base screen, every entry
//! above it is a popup. Each mutation ends with exactly one
//! `ActiveScreensChanged` notification.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bus::{EventBus, Notification};
use crate::component::ComponentId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveScreen {
    pub name: String,
    pub id: ComponentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub popup: bool,
}

impl ActiveScreen {
    pub fn new(name: impl Into<String>, id: impl Into<ComponentId>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            class_name: None,
            popup: false,
        }
    }
}

#[derive(Debug)]
pub struct ScreenState {
    active: Vec<ActiveScreen>,
    history: Vec<ActiveScreen>,
    by_navigation: HashMap<String, ComponentId>,
    navigation_of: HashMap<ComponentId, String>,
    bus: Arc<EventBus>,
}

impl ScreenState {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            active: Vec::new(),
            history: Vec::new(),
            by_navigation: HashMap::new(),
            navigation_of: HashMap::new(),
            bus,
        }
    }

    /// Active screens, base first.
    pub fn active_screens(&self) -> &[ActiveScreen] {
        &self.active
    }

    /// Topmost active screen.
    pub fn head(&self) -> Option<&ActiveScreen> {
        self.active.last()
    }

    pub fn base(&self) -> Option<&ActiveScreen> {
        self.active.first().filter(|s| !s.popup)
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.iter().any(|s| s.name == name)
    }

    /// Screens displaced from the stack, oldest first.
    pub fn screen_history(&self) -> &[ActiveScreen] {
        &self.history
    }

    /// Makes `screen` active. `None` clears the stack.
    ///
    /// A popup is pushed on top. A base screen opened while popups are up
    /// swaps in beneath them; otherwise it replaces the whole stack and the
    /// previous base goes to history.
    pub fn set_active_screen(&mut self, screen: Option<ActiveScreen>, popup: bool) {
        let Some(mut screen) = screen else {
            self.active.clear();
            self.notify();
            return;
        };
        screen.popup = popup;
        self.active.retain(|s| s.name != screen.name);
        self.history.retain(|s| s.name != screen.name);

        if popup {
            self.active.push(screen);
        } else if self.head().is_some_and(|head| head.popup) {
            if self.active.first().is_some_and(|s| !s.popup) {
                let previous = std::mem::replace(&mut self.active[0], screen);
                self.history.push(previous);
            } else {
                self.active.insert(0, screen);
            }
        } else {
            let displaced = std::mem::take(&mut self.active);
            self.history.extend(displaced);
            self.active.push(screen);
        }
        debug!(active = self.active.len(), history = self.history.len(), "active screens changed");
        self.notify();
    }

    /// Removes the entry named `name`. When the stack empties, the most
    /// recently displaced screen comes back.
    pub fn close_screen(&mut self, name: &str) -> Option<ActiveScreen> {
        let closed = match self.active.iter().position(|s| s.name == name) {
            Some(at) => {
                self.history.retain(|s| s.name != name);
                Some(self.active.remove(at))
            }
            None => {
                let at = self.history.iter().position(|s| s.name == name)?;
                Some(self.history.remove(at))
            }
        };
        if self.active.is_empty() {
            if let Some(mut previous) = self.history.pop() {
                previous.popup = false;
                self.active.push(previous);
            }
        }
        self.notify();
        closed
    }

    /// Records the navigation name a screen panel is reachable under.
    pub fn register_navigation(&mut self, navigation_name: impl Into<String>, id: impl Into<ComponentId>) {
        let navigation_name = navigation_name.into();
        let id = id.into();
        if let Some(old_id) = self.by_navigation.insert(navigation_name.clone(), id.clone()) {
            if old_id != id {
                self.navigation_of.remove(&old_id);
            }
        }
        if let Some(old_name) = self.navigation_of.insert(id, navigation_name.clone()) {
            if old_name != navigation_name {
                self.by_navigation.remove(&old_name);
            }
        }
    }

    pub fn screen_id_for(&self, navigation_name: &str) -> Option<&ComponentId> {
        self.by_navigation.get(navigation_name)
    }

    pub fn navigation_name_of(&self, id: &str) -> Option<&String> {
        self.navigation_of.get(id)
    }

    pub fn forget_navigation(&mut self, id: &str) {
        if let Some(name) = self.navigation_of.remove(id) {
            self.by_navigation.remove(&name);
        }
    }

    pub fn reset(&mut self) {
        self.active.clear();
        self.history.clear();
        self.by_navigation.clear();
        self.navigation_of.clear();
        self.notify();
    }

    fn notify(&self) {
        self.bus.notify(Notification::ActiveScreensChanged);
    }
}
