//! Component descriptors and the partial deltas the server sends for them.
//!
//! A [`ComponentDelta`] is validated once at the deserialization boundary and
//! then merged field-by-field onto a stored [`Component`]. Keys the model does
//! not know land in an opaque property bag instead of being merged blindly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ContentError, ContentResult};

pub type ComponentId = String;

/// Layout assigned to a toolbar panel once its helpers take over its content.
pub const TOOLBAR_PANEL_LAYOUT: &str = "BorderLayout,0,0,0,0,0,0,";

/// Closed tag identifying the kind of a component.
///
/// The core only looks at the kind to pick synthesis and lifecycle rules.
/// Unknown class names are kept verbatim in [`ComponentKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentKind {
    Panel,
    ToolBarPanel,
    ToolBar,
    DesktopPanel,
    InternalFrame,
    PopupWrapper,
    ToolBarHelperMain,
    ToolBarHelperCenter,
    SplitPanel,
    TabsetPanel,
    GroupPanel,
    ScrollPanel,
    Button,
    ToggleButton,
    MenuButton,
    Label,
    TextField,
    TextArea,
    PasswordField,
    CheckBox,
    RadioButton,
    Icon,
    Table,
    Tree,
    Editor,
    Chart,
    Map,
    Gauge,
    MenuItem,
    Menu,
    MenuBar,
    Browser,
    Custom,
    Other(String),
}

const KNOWN_KINDS: &[(&str, ComponentKind)] = &[
    ("Panel", ComponentKind::Panel),
    ("ToolBarPanel", ComponentKind::ToolBarPanel),
    ("ToolBar", ComponentKind::ToolBar),
    ("DesktopPanel", ComponentKind::DesktopPanel),
    ("InternalFrame", ComponentKind::InternalFrame),
    ("PopupWrapper", ComponentKind::PopupWrapper),
    ("ToolBarHelperMain", ComponentKind::ToolBarHelperMain),
    ("ToolBarHelperCenter", ComponentKind::ToolBarHelperCenter),
    ("SplitPanel", ComponentKind::SplitPanel),
    ("TabsetPanel", ComponentKind::TabsetPanel),
    ("GroupPanel", ComponentKind::GroupPanel),
    ("ScrollPanel", ComponentKind::ScrollPanel),
    ("Button", ComponentKind::Button),
    ("ToggleButton", ComponentKind::ToggleButton),
    ("PopupMenuButton", ComponentKind::MenuButton),
    ("Label", ComponentKind::Label),
    ("TextField", ComponentKind::TextField),
    ("TextArea", ComponentKind::TextArea),
    ("PasswordField", ComponentKind::PasswordField),
    ("CheckBox", ComponentKind::CheckBox),
    ("RadioButton", ComponentKind::RadioButton),
    ("Icon", ComponentKind::Icon),
    ("Table", ComponentKind::Table),
    ("Tree", ComponentKind::Tree),
    ("Editor", ComponentKind::Editor),
    ("Chart", ComponentKind::Chart),
    ("Map", ComponentKind::Map),
    ("Gauge", ComponentKind::Gauge),
    ("MenuItem", ComponentKind::MenuItem),
    ("Menu", ComponentKind::Menu),
    ("MenuBar", ComponentKind::MenuBar),
    ("Browser", ComponentKind::Browser),
    ("CustomComponentWrapper", ComponentKind::Custom),
];

impl ComponentKind {
    pub fn from_class_name(class_name: &str) -> Self {
        KNOWN_KINDS
            .iter()
            .find(|(name, _)| *name == class_name)
            .map(|(_, kind)| kind.clone())
            .unwrap_or_else(|| ComponentKind::Other(class_name.to_string()))
    }

    pub fn class_name(&self) -> &str {
        if let ComponentKind::Other(name) = self {
            return name;
        }
        KNOWN_KINDS
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(name, _)| *name)
            .unwrap_or_default()
    }

    pub fn is_toolbar_panel(&self) -> bool {
        matches!(self, ComponentKind::ToolBarPanel)
    }

    /// Kinds the client creates on its own; they never appear on the wire.
    pub fn is_synthetic(&self) -> bool {
        matches!(
            self,
            ComponentKind::ToolBarHelperMain
                | ComponentKind::ToolBarHelperCenter
                | ComponentKind::PopupWrapper
        )
    }
}

impl From<String> for ComponentKind {
    fn from(class_name: String) -> Self {
        ComponentKind::from_class_name(&class_name)
    }
}

impl From<ComponentKind> for String {
    fn from(kind: ComponentKind) -> Self {
        kind.class_name().to_string()
    }
}

/// Edge a toolbar docks to inside its toolbar panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ToolBarArea {
    #[default]
    North,
    West,
    South,
    East,
}

impl ToolBarArea {
    /// Border layout constraint for the main toolbar helper.
    pub fn constraint(self) -> &'static str {
        match self {
            ToolBarArea::North => "North",
            ToolBarArea::West => "West",
            ToolBarArea::South => "South",
            ToolBarArea::East => "East",
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, ToolBarArea::West | ToolBarArea::East)
    }
}

impl TryFrom<i64> for ToolBarArea {
    type Error = ContentError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ToolBarArea::North),
            1 => Ok(ToolBarArea::West),
            2 => Ok(ToolBarArea::South),
            3 => Ok(ToolBarArea::East),
            other => Err(ContentError::InvalidToolBarArea { value: other }),
        }
    }
}

impl From<ToolBarArea> for i64 {
    fn from(area: ToolBarArea) -> Self {
        match area {
            ToolBarArea::North => 0,
            ToolBarArea::West => 1,
            ToolBarArea::South => 2,
            ToolBarArea::East => 3,
        }
    }
}

/// Screen-level markers a top-level panel carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenMarkers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modal: Option<bool>,
}

impl ScreenMarkers {
    pub fn is_modal(&self) -> bool {
        self.modal == Some(true)
    }
}

/// Partial update for one component, exactly as the server sent it.
///
/// Every field except `id` is optional; an absent field leaves the stored
/// value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDelta {
    pub id: ComponentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<ComponentKind>,
    /// An empty string detaches the component to the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_bar_area: Option<ToolBarArea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_book: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    #[serde(
        default,
        rename = "screen_navigationName_",
        skip_serializing_if = "Option::is_none"
    )]
    pub screen_navigation_name: Option<String>,
    #[serde(default, rename = "screen_title_", skip_serializing_if = "Option::is_none")]
    pub screen_title: Option<String>,
    #[serde(
        default,
        rename = "screen_className_",
        skip_serializing_if = "Option::is_none"
    )]
    pub screen_class_name: Option<String>,
    #[serde(default, rename = "screen_modal_", skip_serializing_if = "Option::is_none")]
    pub screen_modal: Option<bool>,
    #[serde(default, rename = "~remove", skip_serializing_if = "Option::is_none")]
    pub remove: Option<bool>,
    #[serde(default, rename = "~destroy", skip_serializing_if = "Option::is_none")]
    pub destroy: Option<bool>,
    /// Extension keys; `null` deletes the key from the stored bag.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ComponentDelta {
    pub fn new(id: impl Into<ComponentId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Validates and converts one raw wire object.
    ///
    /// Numeric ids are accepted and stringified; a missing or empty id is a
    /// precondition violation for this delta only.
    pub fn from_value(value: Value) -> ContentResult<Self> {
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(ContentError::NotAnObject {
                    found: json_type_name(&other).to_string(),
                })
            }
        };
        match object.get("id") {
            Some(Value::String(id)) if !id.is_empty() => {}
            Some(Value::Number(n)) => {
                let id = n.to_string();
                object.insert("id".to_string(), Value::String(id));
            }
            _ => return Err(ContentError::MissingId),
        }
        let id = object
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        serde_json::from_value(Value::Object(object)).map_err(|e| ContentError::InvalidProperty {
            id,
            property: "delta".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn is_removal(&self) -> bool {
        self.remove == Some(true)
    }

    pub fn is_destroy(&self) -> bool {
        self.destroy == Some(true)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// What a merge actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub changed: bool,
    pub parent_changed: bool,
    /// The component switched from one data book to another.
    pub data_book_rebound: bool,
}

/// A live component in the registry. Mutated in place, never replaced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: ComponentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "className")]
    pub kind: ComponentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ComponentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_bar_area: Option<ToolBarArea>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_book: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    pub screen: ScreenMarkers,
    pub properties: Map<String, Value>,
}

impl Component {
    pub fn new(id: impl Into<ComponentId>, kind: ComponentKind) -> Self {
        Self {
            id: id.into(),
            name: None,
            kind,
            parent: None,
            constraints: None,
            layout: None,
            layout_data: None,
            visible: None,
            enabled: None,
            text: None,
            tool_bar_area: None,
            preferred_size: None,
            minimum_size: None,
            maximum_size: None,
            data_book: None,
            column_name: None,
            screen: ScreenMarkers::default(),
            properties: Map::new(),
        }
    }

    pub fn from_delta(delta: &ComponentDelta) -> Self {
        let kind = delta
            .class_name
            .clone()
            .unwrap_or_else(|| ComponentKind::Other(String::new()));
        let mut component = Component::new(delta.id.clone(), kind);
        component.merge(delta);
        component
    }

    /// Layout-only record kept for components a custom replacement renders.
    pub fn skeleton_from(delta: &ComponentDelta) -> Self {
        let kind = delta
            .class_name
            .clone()
            .unwrap_or_else(|| ComponentKind::Other(String::new()));
        let mut component = Component::new(delta.id.clone(), kind);
        component.merge_skeleton(delta);
        component
    }

    /// Copies every present delta field onto this component.
    pub fn merge(&mut self, delta: &ComponentDelta) -> MergeOutcome {
        let mut outcome = self.merge_skeleton(delta);
        let mut changed = outcome.changed;

        if let Some(kind) = &delta.class_name {
            if *kind != self.kind {
                self.kind = kind.clone();
                changed = true;
            }
        }
        changed |= patch(&mut self.layout, &delta.layout);
        changed |= patch(&mut self.layout_data, &delta.layout_data);
        changed |= patch(&mut self.visible, &delta.visible);
        changed |= patch(&mut self.enabled, &delta.enabled);
        changed |= patch(&mut self.text, &delta.text);
        changed |= patch(&mut self.tool_bar_area, &delta.tool_bar_area);
        changed |= patch(&mut self.column_name, &delta.column_name);

        if let Some(data_book) = &delta.data_book {
            if self.data_book.as_ref() != Some(data_book) {
                outcome.data_book_rebound = self.data_book.is_some();
                self.data_book = Some(data_book.clone());
                changed = true;
            }
        }

        changed |= patch(&mut self.screen.navigation_name, &delta.screen_navigation_name);
        changed |= patch(&mut self.screen.title, &delta.screen_title);
        changed |= patch(&mut self.screen.class_name, &delta.screen_class_name);
        changed |= patch(&mut self.screen.modal, &delta.screen_modal);

        for (key, value) in &delta.extra {
            if value.is_null() {
                changed |= self.properties.remove(key).is_some();
            } else if self.properties.get(key) != Some(value) {
                self.properties.insert(key.clone(), value.clone());
                changed = true;
            }
        }

        outcome.changed = changed;
        outcome
    }

    /// Merges only the fields a replaced component keeps.
    pub fn merge_skeleton(&mut self, delta: &ComponentDelta) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        let mut changed = patch(&mut self.name, &delta.name);
        if let Some(parent) = &delta.parent {
            let parent = normalize_parent(parent);
            if parent != self.parent {
                self.parent = parent;
                outcome.parent_changed = true;
                changed = true;
            }
        }
        changed |= patch(&mut self.constraints, &delta.constraints);
        changed |= patch(&mut self.preferred_size, &delta.preferred_size);
        changed |= patch(&mut self.minimum_size, &delta.minimum_size);
        changed |= patch(&mut self.maximum_size, &delta.maximum_size);
        outcome.changed = changed;
        outcome
    }

    pub fn is_visible(&self) -> bool {
        self.visible != Some(false)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

fn normalize_parent(parent: &str) -> Option<ComponentId> {
    if parent.is_empty() {
        None
    } else {
        Some(parent.to_string())
    }
}

fn patch<T: Clone + PartialEq>(slot: &mut Option<T>, value: &Option<T>) -> bool {
    match value {
        Some(value) if slot.as_ref() != Some(value) => {
            *slot = Some(value.clone());
            true
        }
        _ => false,
    }
}
