//! Per-screen, per-data-provider row caches.
//!
//! Rows are cached in pages keyed by a reference key: `"current"` for plain
//! providers, or the encoded master-row values for detail providers. All
//! lookups are soft; a missing book reads as "not loaded yet".

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::bus::{DataKey, EventBus, Notification};
use crate::error::{ContentError, ContentResult};

pub type Row = Map<String, Value>;

/// Page key for providers without a master reference.
pub const CURRENT_PAGE: &str = "current";
/// Page key for detail providers whose master has no selected row.
pub const NO_MASTER_ROW: &str = "noMasterRow";
/// Column carrying the record status flag ("I" for inserted rows).
pub const RECORD_STATUS: &str = "__recordStatus";
pub const STATUS_INSERTED: &str = "I";

pub fn is_inserted(row: &Row) -> bool {
    row.get(RECORD_STATUS).and_then(Value::as_str) == Some(STATUS_INSERTED)
}

/// Zips positional wire records with their column names into keyed rows.
pub fn rows_from_records(columns: &[String], records: Vec<Vec<Value>>) -> ContentResult<Vec<Row>> {
    records
        .into_iter()
        .map(|record| {
            if record.len() > columns.len() + 1 {
                return Err(ContentError::RowWidthMismatch {
                    expected: columns.len(),
                    found: record.len(),
                });
            }
            let mut row = Row::new();
            let mut values = record.into_iter();
            for column in columns {
                row.insert(column.clone(), values.next().unwrap_or(Value::Null));
            }
            // A trailing extra cell is the record status.
            if let Some(status) = values.next() {
                if !status.is_null() {
                    row.insert(RECORD_STATUS.to_string(), status);
                }
            }
            Ok(row)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedRow {
    pub row: Row,
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_path: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_column: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortMode {
    Ascending,
    Descending,
    None,
}

impl std::str::FromStr for SortMode {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ascending" => Ok(SortMode::Ascending),
            "Descending" => Ok(SortMode::Descending),
            "None" => Ok(SortMode::None),
            other => Err(ContentError::InvalidSortMode {
                mode: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortDefinition {
    pub column_name: String,
    pub mode: SortMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceDefinition {
    pub referenced_data_book: String,
    pub column_names: Vec<String>,
    pub referenced_column_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Editor definition, interpreted by the presentation layer only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_editor: Option<Value>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub data_provider: String,
    #[serde(default)]
    pub columns: Vec<ColumnDescription>,
    #[serde(default)]
    pub primary_key_columns: Vec<String>,
    #[serde(default = "default_true")]
    pub insert_enabled: bool,
    #[serde(default = "default_true")]
    pub update_enabled: bool,
    #[serde(default = "default_true")]
    pub delete_enabled: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_reference: Option<ReferenceDefinition>,
}

impl MetaData {
    pub fn new(data_provider: impl Into<String>) -> Self {
        Self {
            data_provider: data_provider.into(),
            columns: Vec::new(),
            primary_key_columns: Vec::new(),
            insert_enabled: true,
            update_enabled: true,
            delete_enabled: true,
            read_only: false,
            master_reference: None,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescription> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnPatch {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readonly: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

/// Partial metadata update; absent fields stay as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDataPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default)]
    pub columns: Vec<ColumnPatch>,
}

impl MetaDataPatch {
    fn apply(&self, meta: &mut MetaData) -> bool {
        let mut changed = false;
        changed |= set_flag(&mut meta.insert_enabled, self.insert_enabled);
        changed |= set_flag(&mut meta.update_enabled, self.update_enabled);
        changed |= set_flag(&mut meta.delete_enabled, self.delete_enabled);
        changed |= set_flag(&mut meta.read_only, self.read_only);
        for patch in &self.columns {
            let Some(column) = meta.columns.iter_mut().find(|c| c.name == patch.name) else {
                continue;
            };
            if let Some(label) = &patch.label {
                if column.label.as_ref() != Some(label) {
                    column.label = Some(label.clone());
                    changed = true;
                }
            }
            changed |= set_flag(&mut column.readonly, patch.readonly);
            changed |= set_flag(&mut column.nullable, patch.nullable);
        }
        changed
    }
}

fn set_flag(slot: &mut bool, value: Option<bool>) -> bool {
    match value {
        Some(value) if *slot != value => {
            *slot = value;
            true
        }
        _ => false,
    }
}

/// "Please fetch this provider" signal for the fetch orchestration layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub screen: String,
    pub data_provider: String,
    pub from_row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_key: Option<String>,
}

impl FetchRequest {
    pub fn new(screen: impl Into<String>, data_provider: impl Into<String>) -> Self {
        Self {
            screen: screen.into(),
            data_provider: data_provider.into(),
            from_row: 0,
            reference_key: None,
        }
    }
}

/// Cached state for one (screen, data provider) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataBook {
    pub pages: IndexMap<String, Vec<Row>>,
    pub meta_data: Option<MetaData>,
    pub selected_row: Option<SelectedRow>,
    pub sorted_columns: Vec<SortDefinition>,
    /// Reference keys whose page holds every row the server has.
    pub all_fetched: HashSet<String>,
}

#[derive(Debug)]
pub struct DataStore {
    books: HashMap<String, IndexMap<String, DataBook>>,
    /// popup screen → master screen it was opened above.
    links: HashMap<String, String>,
    fetches: IndexSet<FetchRequest>,
    bus: Arc<EventBus>,
}

impl DataStore {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            books: HashMap::new(),
            links: HashMap::new(),
            fetches: IndexSet::new(),
            bus,
        }
    }

    pub fn book(&self, screen: &str, data_provider: &str) -> Option<&DataBook> {
        self.books.get(screen)?.get(data_provider)
    }

    fn book_mut(&mut self, screen: &str, data_provider: &str) -> &mut DataBook {
        self.books
            .entry(screen.to_string())
            .or_default()
            .entry(data_provider.to_string())
            .or_default()
    }

    pub fn data_providers(&self, screen: &str) -> Vec<&String> {
        self.books
            .get(screen)
            .map(|books| books.keys().collect())
            .unwrap_or_default()
    }

    pub fn has_screen(&self, screen: &str) -> bool {
        self.books.contains_key(screen)
    }

    // ── Rows ────────────────────────────────────────────────────────

    /// Page key that applies to `data_provider` right now.
    pub fn reference_key(&self, screen: &str, data_provider: &str) -> String {
        let Some(reference) = self
            .book(screen, data_provider)
            .and_then(|book| book.meta_data.as_ref())
            .and_then(|meta| meta.master_reference.as_ref())
        else {
            return CURRENT_PAGE.to_string();
        };
        match self
            .book(screen, &reference.referenced_data_book)
            .and_then(|master| master.selected_row.as_ref())
        {
            Some(selected) => reference_key_for(&selected.row, &reference.referenced_column_names),
            None => NO_MASTER_ROW.to_string(),
        }
    }

    /// Rows under the currently relevant reference key, `None` if not loaded.
    pub fn get_data(&self, screen: &str, data_provider: &str) -> Option<&[Row]> {
        let key = self.reference_key(screen, data_provider);
        self.get_data_for_key(screen, data_provider, &key)
    }

    pub fn get_data_for_key(&self, screen: &str, data_provider: &str, key: &str) -> Option<&[Row]> {
        self.book(screen, data_provider)?
            .pages
            .get(key)
            .map(Vec::as_slice)
    }

    pub fn is_all_fetched(&self, screen: &str, data_provider: &str) -> bool {
        let key = self.reference_key(screen, data_provider);
        self.book(screen, data_provider)
            .is_some_and(|book| book.all_fetched.contains(&key))
    }

    /// Installs or merges a fetched row window.
    ///
    /// Without an existing page the rows are installed verbatim. Otherwise
    /// rows past the end are appended and rows inside it overwrite the
    /// `[from, to]` window in place.
    #[allow(clippy::too_many_arguments)]
    pub fn set_data(
        &mut self,
        screen: &str,
        data_provider: &str,
        rows: Vec<Row>,
        from: usize,
        to: usize,
        reference_key: Option<&str>,
        clear: bool,
    ) {
        let key = reference_key.unwrap_or(CURRENT_PAGE).to_string();
        let book = self.book_mut(screen, data_provider);
        if clear {
            book.pages.shift_remove(CURRENT_PAGE);
            book.all_fetched.remove(CURRENT_PAGE);
        }
        let selected = book.selected_row.as_ref().map(|s| s.index);
        match book.pages.get_mut(&key) {
            None => {
                book.pages.insert(key.clone(), rows);
            }
            Some(page) => merge_window(page, rows, from, to, selected),
        }
        debug!(screen, data_provider, key = %key, from, to, "set data");
        self.bus
            .notify(Notification::DataChanged(DataKey::new(screen, data_provider)));
        self.enforce_selection_bound(screen, data_provider);
    }

    pub fn set_all_fetched(
        &mut self,
        screen: &str,
        data_provider: &str,
        reference_key: Option<&str>,
        all_fetched: bool,
    ) {
        let key = reference_key.unwrap_or(CURRENT_PAGE).to_string();
        let book = self.book_mut(screen, data_provider);
        if all_fetched {
            book.all_fetched.insert(key);
        } else {
            book.all_fetched.remove(&key);
        }
    }

    /// Drops every cached page of one provider (server asked for a full reload).
    pub fn clear_data_provider(&mut self, screen: &str, data_provider: &str) {
        let Some(book) = self
            .books
            .get_mut(screen)
            .and_then(|books| books.get_mut(data_provider))
        else {
            return;
        };
        book.pages.clear();
        book.all_fetched.clear();
        self.bus
            .notify(Notification::DataChanged(DataKey::new(screen, data_provider)));
    }

    /// Client-side optimistic insert after the selected row (or at the top).
    pub fn insert_data_provider_data(&mut self, screen: &str, data_provider: &str) -> usize {
        let key = self.reference_key(screen, data_provider);
        let book = self.book_mut(screen, data_provider);
        let at = book.selected_row.as_ref().map_or(0, |s| s.index + 1);
        let page = book.pages.entry(key).or_default();
        let at = at.min(page.len());
        let mut row = Row::new();
        row.insert(RECORD_STATUS.to_string(), Value::from(STATUS_INSERTED));
        page.insert(at, row);
        self.bus
            .notify(Notification::DataChanged(DataKey::new(screen, data_provider)));
        at
    }

    /// Client-side optimistic delete of the selected row.
    ///
    /// The selection is cleared afterwards; the server re-selects on confirm.
    pub fn delete_data_provider_data(&mut self, screen: &str, data_provider: &str) -> Option<Row> {
        let key = self.reference_key(screen, data_provider);
        let book = self
            .books
            .get_mut(screen)
            .and_then(|books| books.get_mut(data_provider))?;
        let index = book.selected_row.as_ref()?.index;
        let page = book.pages.get_mut(&key)?;
        if index >= page.len() {
            return None;
        }
        let deleted = page.remove(index);
        self.bus
            .notify(Notification::DataChanged(DataKey::new(screen, data_provider)));
        self.clear_selected_row(screen, data_provider);
        Some(deleted)
    }

    /// Removes one row by index (server reported it deleted).
    pub fn delete_row(&mut self, screen: &str, data_provider: &str, index: usize) -> Option<Row> {
        let key = self.reference_key(screen, data_provider);
        let page = self
            .books
            .get_mut(screen)
            .and_then(|books| books.get_mut(data_provider))
            .and_then(|book| book.pages.get_mut(&key))?;
        if index >= page.len() {
            return None;
        }
        let deleted = page.remove(index);
        self.bus
            .notify(Notification::DataChanged(DataKey::new(screen, data_provider)));
        self.enforce_selection_bound(screen, data_provider);
        Some(deleted)
    }

    /// Patches columns of the selected row, in the snapshot and in the page.
    pub fn update_selected_values(
        &mut self,
        screen: &str,
        data_provider: &str,
        columns: &[String],
        values: &[Value],
    ) -> bool {
        let key = self.reference_key(screen, data_provider);
        let Some(book) = self
            .books
            .get_mut(screen)
            .and_then(|books| books.get_mut(data_provider))
        else {
            return false;
        };
        let Some(selected) = book.selected_row.as_mut() else {
            return false;
        };
        for (column, value) in columns.iter().zip(values) {
            selected.row.insert(column.clone(), value.clone());
        }
        if let Some(row) = book
            .pages
            .get_mut(&key)
            .and_then(|page| page.get_mut(selected.index))
        {
            for (column, value) in columns.iter().zip(values) {
                row.insert(column.clone(), value.clone());
            }
        }
        let data_key = DataKey::new(screen, data_provider);
        self.bus.notify(Notification::DataChanged(data_key.clone()));
        self.bus.notify(Notification::SelectedRowChanged(data_key));
        true
    }

    // ── Selection ───────────────────────────────────────────────────

    pub fn get_selected_row(&self, screen: &str, data_provider: &str) -> Option<&SelectedRow> {
        self.book(screen, data_provider)?.selected_row.as_ref()
    }

    /// Stores the selection snapshot and tells every party that mirrors it.
    pub fn set_selected_row(&mut self, screen: &str, data_provider: &str, selected: SelectedRow) {
        let loaded_len = self.get_data(screen, data_provider).map(<[Row]>::len);
        if let Some(len) = loaded_len {
            if selected.index >= len {
                warn!(
                    screen,
                    data_provider,
                    index = selected.index,
                    len,
                    "selected row outside loaded rows"
                );
                if !self.is_all_fetched(screen, data_provider) {
                    let mut request = FetchRequest::new(screen, data_provider);
                    request.from_row = len;
                    self.request_fetch(request);
                }
                self.clear_selected_row(screen, data_provider);
                return;
            }
        }
        let before = self.detail_keys(screen, data_provider);
        self.book_mut(screen, data_provider).selected_row = Some(selected.clone());
        self.after_selection_change(screen, data_provider, Some(selected), before);
    }

    pub fn clear_selected_row(&mut self, screen: &str, data_provider: &str) {
        let before = self.detail_keys(screen, data_provider);
        self.book_mut(screen, data_provider).selected_row = None;
        self.after_selection_change(screen, data_provider, None, before);
    }

    fn after_selection_change(
        &mut self,
        screen: &str,
        data_provider: &str,
        selected: Option<SelectedRow>,
        before: Vec<(String, String)>,
    ) {
        self.bus
            .notify(Notification::SelectedRowChanged(DataKey::new(screen, data_provider)));

        if let Some(master) = self.links.get(screen).cloned() {
            self.mirror_selection(&master, data_provider, selected);
        }

        self.refresh_details(screen, before);
    }

    /// A popup bound to a master screen keeps the master's copy in sync,
    /// as long as the index is valid for the master's own rows.
    fn mirror_selection(&mut self, master: &str, data_provider: &str, selected: Option<SelectedRow>) {
        let Some(book) = self.book(master, data_provider) else {
            return;
        };
        let len = self.get_data(master, data_provider).map_or(0, <[Row]>::len);
        let selected = selected.filter(|s| s.index < len);
        if book.selected_row == selected {
            return;
        }
        debug!(master, data_provider, len, mirrored = selected.is_some(), "mirroring popup selection");
        let before = self.detail_keys(master, data_provider);
        self.book_mut(master, data_provider).selected_row = selected;
        self.bus
            .notify(Notification::SelectedRowChanged(DataKey::new(master, data_provider)));
        self.refresh_details(master, before);
    }

    /// Detail providers of `master` paired with the page key they read now.
    fn detail_keys(&self, screen: &str, master: &str) -> Vec<(String, String)> {
        let Some(books) = self.books.get(screen) else {
            return Vec::new();
        };
        books
            .iter()
            .filter(|(_, book)| {
                book.meta_data
                    .as_ref()
                    .and_then(|m| m.master_reference.as_ref())
                    .is_some_and(|r| r.referenced_data_book == master)
            })
            .map(|(name, _)| (name.clone(), self.reference_key(screen, name)))
            .collect()
    }

    /// Detail providers whose page key moved follow their master to the new
    /// page; the others keep their rows and selection.
    fn refresh_details(&mut self, screen: &str, before: Vec<(String, String)>) {
        for (detail, previous) in before {
            let key = self.reference_key(screen, &detail);
            if key == previous {
                continue;
            }
            if key != NO_MASTER_ROW && self.get_data_for_key(screen, &detail, &key).is_none() {
                let mut request = FetchRequest::new(screen, detail.clone());
                request.reference_key = Some(key);
                self.request_fetch(request);
            }
            self.bus
                .notify(Notification::DataChanged(DataKey::new(screen, detail.clone())));
            self.clear_detail_selection(screen, &detail);
        }
    }

    fn clear_detail_selection(&mut self, screen: &str, detail: &str) {
        let had_selection = self
            .book(screen, detail)
            .is_some_and(|book| book.selected_row.is_some());
        if had_selection {
            self.clear_selected_row(screen, detail);
        }
    }

    fn enforce_selection_bound(&mut self, screen: &str, data_provider: &str) {
        let len = self.get_data(screen, data_provider).map_or(0, <[Row]>::len);
        let out_of_range = self
            .get_selected_row(screen, data_provider)
            .is_some_and(|s| s.index >= len);
        if out_of_range {
            debug!(screen, data_provider, len, "clearing dangling selection");
            self.clear_selected_row(screen, data_provider);
        }
    }

    // ── Metadata and sorting ────────────────────────────────────────

    pub fn get_meta_data(&self, screen: &str, data_provider: &str) -> Option<&MetaData> {
        self.book(screen, data_provider)?.meta_data.as_ref()
    }

    /// Replaces metadata; notifies only when it differs from what is stored.
    pub fn set_meta_data(&mut self, screen: &str, meta_data: MetaData) -> bool {
        let data_provider = meta_data.data_provider.clone();
        let book = self.book_mut(screen, &data_provider);
        if book.meta_data.as_ref() == Some(&meta_data) {
            return false;
        }
        book.meta_data = Some(meta_data);
        self.bus
            .notify(Notification::MetaDataChanged(DataKey::new(screen, data_provider)));
        true
    }

    /// Applies a partial metadata update; notifies only on an actual change.
    pub fn update_meta_data(&mut self, screen: &str, data_provider: &str, patch: &MetaDataPatch) -> bool {
        let book = self.book_mut(screen, data_provider);
        let meta = book
            .meta_data
            .get_or_insert_with(|| MetaData::new(data_provider));
        if !patch.apply(meta) {
            return false;
        }
        self.bus
            .notify(Notification::MetaDataChanged(DataKey::new(screen, data_provider)));
        true
    }

    pub fn get_sort_definition(&self, screen: &str, data_provider: &str) -> &[SortDefinition] {
        self.book(screen, data_provider)
            .map(|book| book.sorted_columns.as_slice())
            .unwrap_or_default()
    }

    pub fn set_sort_definition(
        &mut self,
        screen: &str,
        data_provider: &str,
        sorted_columns: Vec<SortDefinition>,
    ) -> bool {
        let book = self.book_mut(screen, data_provider);
        if book.sorted_columns == sorted_columns {
            return false;
        }
        book.sorted_columns = sorted_columns;
        self.bus
            .notify(Notification::SortDefinitionChanged(DataKey::new(screen, data_provider)));
        true
    }

    // ── Screen scope ────────────────────────────────────────────────

    /// Binds a popup screen to the master screen it was opened above.
    pub fn link_screens(&mut self, popup: impl Into<String>, master: impl Into<String>) {
        self.links.insert(popup.into(), master.into());
    }

    pub fn master_of(&self, popup: &str) -> Option<&String> {
        self.links.get(popup)
    }

    /// Drops every data book of a closed screen.
    pub fn clear_screen(&mut self, screen: &str) {
        self.links.remove(screen);
        self.fetches.retain(|f| f.screen != screen);
        let Some(books) = self.books.remove(screen) else {
            return;
        };
        for data_provider in books.keys() {
            self.bus
                .notify(Notification::DataChanged(DataKey::new(screen, data_provider.clone())));
        }
    }

    // ── Fetch signals ───────────────────────────────────────────────

    pub fn request_fetch(&mut self, request: FetchRequest) {
        self.fetches.insert(request);
    }

    pub fn pending_fetches(&self) -> impl Iterator<Item = &FetchRequest> {
        self.fetches.iter()
    }

    pub fn take_fetch_requests(&mut self) -> Vec<FetchRequest> {
        self.fetches.drain(..).collect()
    }

    pub fn reset(&mut self) {
        self.books.clear();
        self.links.clear();
        self.fetches.clear();
    }
}

/// Encodes the master row values a detail page is cached under.
pub fn reference_key_for(master_row: &Row, referenced_columns: &[String]) -> String {
    let values: Vec<&Value> = referenced_columns
        .iter()
        .map(|column| master_row.get(column).unwrap_or(&Value::Null))
        .collect();
    serde_json::to_string(&values).unwrap_or_else(|_| NO_MASTER_ROW.to_string())
}

/// Overwrites `[from, to]` of `page` with `rows`, appending past the end.
///
/// A single incoming inserted row landing on a slot that is not itself an
/// insert first gets a blank placeholder spliced in after the selected row
/// (or at the top), so client-side and server-side inserts stay aligned.
pub(crate) fn merge_window(
    page: &mut Vec<Row>,
    rows: Vec<Row>,
    from: usize,
    to: usize,
    selected: Option<usize>,
) {
    if page.len() < from {
        page.extend(rows);
        return;
    }
    let window = if to >= from {
        (to - from + 1).min(rows.len())
    } else {
        rows.len()
    };
    let single_insert = rows.len() == 1 && is_inserted(&rows[0]);
    for (offset, row) in rows.into_iter().take(window).enumerate() {
        let at = from + offset;
        if single_insert && page.get(at).is_some_and(|slot| !is_inserted(slot)) {
            let placeholder_at = selected.map_or(0, |s| s + 1).min(page.len());
            page.insert(placeholder_at, Row::new());
        }
        if at < page.len() {
            page[at] = row;
        } else {
            page.push(row);
        }
    }
}
