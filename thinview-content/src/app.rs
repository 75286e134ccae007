//! Application-level state pushed by the server outside any screen: menu,
//! toolbar items, settings, translations, user and application metadata.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::bus::{EventBus, Notification};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub component_id: String,
    #[serde(default)]
    pub group: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleButtons {
    #[serde(default = "default_true")]
    pub reload: bool,
    #[serde(default = "default_true")]
    pub rollback: bool,
    #[serde(default = "default_true")]
    pub save: bool,
    #[serde(default = "default_true")]
    pub home: bool,
}

impl Default for VisibleButtons {
    fn default() -> Self {
        Self {
            reload: true,
            rollback: true,
            save: true,
            home: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub visible_buttons: VisibleButtons,
    #[serde(default)]
    pub change_password_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop_color: Option<String>,
    #[serde(default)]
    pub desktop_navigation: bool,
    /// Settings the core has no use for, kept for the presentation layer.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppMetaData {
    pub client_id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub lang_code: String,
    #[serde(default)]
    pub lazy_load_start: bool,
}

#[derive(Debug)]
pub struct AppState {
    menu: IndexMap<String, Vec<MenuItem>>,
    toolbar: Vec<MenuItem>,
    settings: AppSettings,
    translations: HashMap<String, String>,
    user: Option<UserData>,
    meta: Option<AppMetaData>,
    bus: Arc<EventBus>,
}

impl AppState {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            menu: IndexMap::new(),
            toolbar: Vec::new(),
            settings: AppSettings::default(),
            translations: HashMap::new(),
            user: None,
            meta: None,
            bus,
        }
    }

    /// Menu items grouped by their `group`, groups in first-seen order.
    pub fn menu(&self) -> &IndexMap<String, Vec<MenuItem>> {
        &self.menu
    }

    pub fn set_menu(&mut self, items: Vec<MenuItem>) {
        self.menu.clear();
        for item in items {
            self.menu.entry(item.group.clone()).or_default().push(item);
        }
        self.bus.notify(Notification::MenuChanged);
    }

    pub fn toolbar_items(&self) -> &[MenuItem] {
        &self.toolbar
    }

    pub fn set_toolbar_items(&mut self, items: Vec<MenuItem>) {
        self.toolbar = items;
        self.bus.notify(Notification::ToolbarChanged);
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: AppSettings) {
        self.settings = settings;
        self.bus.notify(Notification::AppSettingsChanged);
    }

    /// Looks up a translation, falling back to the text itself.
    pub fn translate<'a>(&'a self, text: &'a str) -> &'a str {
        self.translations.get(text).map_or(text, String::as_str)
    }

    pub fn set_translations(&mut self, translations: HashMap<String, String>) {
        self.translations.extend(translations);
        self.bus.notify(Notification::TranslationReady);
    }

    pub fn user_data(&self) -> Option<&UserData> {
        self.user.as_ref()
    }

    pub fn set_user_data(&mut self, user: UserData) {
        self.user = Some(user);
        self.bus.notify(Notification::UserDataChanged);
    }

    pub fn app_meta_data(&self) -> Option<&AppMetaData> {
        self.meta.as_ref()
    }

    pub fn set_app_meta_data(&mut self, meta: AppMetaData) {
        self.meta = Some(meta);
        self.bus.notify(Notification::AppMetaDataChanged);
    }

    /// Drops everything tied to the logged-in user. Settings, translations
    /// and application metadata outlive the session.
    pub fn clear_session(&mut self) {
        self.menu.clear();
        self.toolbar.clear();
        self.user = None;
    }
}
