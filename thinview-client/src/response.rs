//! Server response envelopes.
//!
//! A server reply is a JSON array of objects tagged by `name`. Names this
//! client does not handle decode to [`Response::Unknown`] and are skipped.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use thinview_content::{AppMetaData, AppSettings, MenuItem, MetaData, SortDefinition, UserData};
use thinview_content::data::ColumnPatch;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name")]
pub enum Response {
    #[serde(rename = "screen.generic")]
    GenericScreen(GenericScreen),
    #[serde(rename = "closeScreen")]
    CloseScreen(CloseScreen),
    #[serde(rename = "dal.fetch")]
    Fetch(FetchResponse),
    #[serde(rename = "dal.metaData")]
    MetaData(MetaData),
    #[serde(rename = "dal.dataProviderChanged")]
    DataProviderChanged(DataProviderChanged),
    #[serde(rename = "menu")]
    Menu(MenuResponse),
    #[serde(rename = "applicationSettings")]
    ApplicationSettings(ApplicationSettings),
    #[serde(rename = "translation")]
    Translation(Translation),
    #[serde(rename = "applicationMetaData")]
    ApplicationMetaData(AppMetaData),
    #[serde(rename = "userData")]
    UserData(UserData),
    #[serde(rename = "login")]
    Login(Login),
    #[serde(rename = "error")]
    Error(ServerError),
    #[serde(rename = "session.expired")]
    SessionExpired(Message),
    #[serde(rename = "restart")]
    Restart(Message),
    #[serde(other)]
    Unknown,
}

impl Response {
    /// Decodes a reply body (a JSON array of envelopes).
    pub fn parse_all(body: Value) -> ClientResult<Vec<Response>> {
        let Value::Array(items) = body else {
            return Err(ClientError::MalformedEnvelope {
                name: String::new(),
                reason: "response body must be a JSON array".to_string(),
            });
        };
        items.into_iter().map(Response::parse).collect()
    }

    pub fn parse(envelope: Value) -> ClientResult<Response> {
        let name = envelope
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let response: Response =
            serde_json::from_value(envelope).map_err(|e| ClientError::MalformedEnvelope {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        if response == Response::Unknown {
            debug!(name = %name, "ignoring unknown response kind");
        }
        Ok(response)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericScreen {
    /// Name of the screen the update belongs to.
    pub component_id: String,
    #[serde(default)]
    pub changed_components: Vec<Value>,
    /// In-place update of an already open screen.
    #[serde(default)]
    pub update: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseScreen {
    pub component_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    pub data_provider: String,
    #[serde(default)]
    pub column_names: Vec<String>,
    #[serde(default)]
    pub records: Vec<Vec<Value>>,
    #[serde(default)]
    pub from: usize,
    #[serde(default)]
    pub to: i64,
    #[serde(default)]
    pub is_all_fetched: bool,
    #[serde(default = "no_row")]
    pub selected_row: i64,
    #[serde(default)]
    pub selected_column: Option<String>,
    #[serde(default)]
    pub tree_path: Option<Vec<usize>>,
    #[serde(default)]
    pub master_row: Option<Vec<Value>>,
    #[serde(default)]
    pub clear: bool,
    #[serde(default)]
    pub sort_definition: Option<Vec<SortDefinition>>,
}

fn no_row() -> i64 {
    -1
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProviderChanged {
    pub data_provider: String,
    #[serde(default)]
    pub reload: Option<i64>,
    #[serde(default)]
    pub selected_row: Option<i64>,
    #[serde(default)]
    pub selected_column: Option<String>,
    #[serde(default)]
    pub deleted_row: Option<usize>,
    #[serde(default)]
    pub changed_column_names: Option<Vec<String>>,
    #[serde(default)]
    pub changed_values: Option<Vec<Value>>,
    #[serde(default)]
    pub insert_enabled: Option<bool>,
    #[serde(default)]
    pub update_enabled: Option<bool>,
    #[serde(default)]
    pub delete_enabled: Option<bool>,
    #[serde(default)]
    pub read_only: Option<bool>,
    #[serde(default)]
    pub changed_columns: Vec<ColumnPatch>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuResponse {
    #[serde(default)]
    pub entries: Vec<MenuItem>,
    #[serde(default)]
    pub tool_bar_entries: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApplicationSettings {
    #[serde(default)]
    pub desktop: Option<DesktopContent>,
    #[serde(flatten)]
    pub settings: AppSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DesktopContent {
    #[serde(default)]
    pub components: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Translation {
    #[serde(default)]
    pub texts: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Login {
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerError {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Data provider paths look like `app/screen/provider`; the middle segment
/// names the screen whose data book holds them.
pub fn screen_of(data_provider: &str) -> &str {
    let mut parts = data_provider.split('/');
    match (parts.next(), parts.next()) {
        (Some(_), Some(screen)) if !screen.is_empty() => screen,
        _ => data_provider,
    }
}
