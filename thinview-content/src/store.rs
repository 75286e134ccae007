//! The single owner of client-side content state.
//!
//! One `ContentStore` is built per session and handed to whoever needs it.
//! Every mutation runs to completion synchronously; the bus is the only way
//! state changes leave the store.

use std::sync::Arc;

use tracing::{debug, info};

use crate::app::AppState;
use crate::bus::{ErrorReport, EventBus, Notification};
use crate::children::ChildFilter;
use crate::component::{Component, ComponentDelta};
use crate::data::{DataStore, FetchRequest};
use crate::registry::{BatchOutcome, ComponentRegistry, Scope};
use crate::screens::{ActiveScreen, ScreenState};

#[derive(Debug)]
pub struct ContentStore {
    bus: Arc<EventBus>,
    registry: ComponentRegistry,
    data: DataStore,
    screens: ScreenState,
    app: AppState,
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore {
    pub fn new() -> Self {
        Self::with_bus(Arc::new(EventBus::new()))
    }

    /// Builds a store publishing on an existing bus.
    pub fn with_bus(bus: Arc<EventBus>) -> Self {
        Self {
            registry: ComponentRegistry::new(bus.clone()),
            data: DataStore::new(bus.clone()),
            screens: ScreenState::new(bus.clone()),
            app: AppState::new(bus.clone()),
            bus,
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataStore {
        &mut self.data
    }

    pub fn screens(&self) -> &ScreenState {
        &self.screens
    }

    pub fn app(&self) -> &AppState {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut AppState {
        &mut self.app
    }

    // ── Components ──────────────────────────────────────────────────

    /// Applies a component batch and reacts to what it changed: navigation
    /// names are recorded and rebound data books are queued for fetching.
    pub fn apply_deltas(&mut self, deltas: Vec<ComponentDelta>, scope: Scope) -> BatchOutcome {
        let outcome = self.registry.apply_deltas(deltas, scope);

        for (navigation_name, id) in &outcome.navigation {
            self.screens.register_navigation(navigation_name.clone(), id.clone());
        }

        for id in &outcome.rebound_data_books {
            let Some(data_book) = self.registry.get(id).and_then(|c| c.data_book.clone()) else {
                continue;
            };
            let Some(screen) = self.registry.screen_name_of(id) else {
                continue;
            };
            debug!(id = %id, screen = %screen, data_book = %data_book, "data book rebound");
            self.data.request_fetch(FetchRequest::new(screen, data_book));
        }

        outcome
    }

    pub fn get_component(&self, id: &str) -> Option<&Component> {
        self.registry.get(id)
    }

    pub fn get_component_by_name(&self, name: &str) -> Option<&Component> {
        self.registry.get_by_name(name)
    }

    pub fn children_of(&self, parent: &str, filter: &ChildFilter) -> Vec<&Component> {
        self.registry.children_of(parent, filter)
    }

    // ── Screens ─────────────────────────────────────────────────────

    /// Activates a screen. A popup is bound to the screen beneath it so that
    /// shared data providers keep their selection in sync.
    pub fn set_active_screen(&mut self, screen: Option<ActiveScreen>, popup: bool) {
        if let Some(screen) = &screen {
            if popup {
                if let Some(master) = self.screens.head() {
                    if master.name != screen.name {
                        self.data.link_screens(screen.name.clone(), master.name.clone());
                    }
                }
            }
        }
        self.screens.set_active_screen(screen, popup);
    }

    /// Closes the screen named `name`.
    ///
    /// Unless `preserve_content` is set, its component subtree is deleted and
    /// its data books are purged, the latter only when no remaining active
    /// component still carries the screen's name.
    pub fn close_screen(&mut self, name: &str, preserve_content: bool) -> Option<ActiveScreen> {
        let closed = self.screens.close_screen(name)?;
        if preserve_content {
            return Some(closed);
        }
        let deleted = self.registry.delete_subtree(&closed.id);
        self.screens.forget_navigation(&closed.id);
        if !self.registry.has_active_name(name) {
            self.data.clear_screen(name);
        }
        info!(screen = name, components = deleted.len(), "closed screen");
        Some(closed)
    }

    // ── Session lifecycle ───────────────────────────────────────────

    /// Returns to a clean slate: every partition, data book and screen goes.
    pub fn reset(&mut self) {
        self.registry.reset();
        self.data.reset();
        self.app.clear_session();
        self.screens.reset();
    }

    /// Resets first so listeners reacting to the expiry see an empty store.
    pub fn session_expired(&mut self, message: Option<String>) {
        self.reset();
        self.bus.notify(Notification::SessionExpired { message });
    }

    pub fn restart_required(&self, message: Option<String>) {
        self.bus.notify(Notification::RestartRequired { message });
    }

    pub fn server_error(&self, report: ErrorReport) {
        self.bus.notify(Notification::ServerError(report));
    }

    pub fn login_requested(&mut self, mode: Option<String>) {
        self.set_active_screen(None, false);
        self.bus.notify(Notification::LoginRequested { mode });
    }

    /// Drains the "please fetch" signals raised since the last call.
    pub fn take_fetch_requests(&mut self) -> Vec<FetchRequest> {
        self.data.take_fetch_requests()
    }
}
