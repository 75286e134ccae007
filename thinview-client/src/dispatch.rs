//! Routes decoded response envelopes into a [`ContentStore`].

use serde_json::Value;
use thinview_content::data::{rows_from_records, MetaDataPatch, CURRENT_PAGE};
use thinview_content::{
    parse_deltas, ActiveScreen, ContentStore, ErrorReport, FetchRequest, Scope, SelectedRow,
};
use tracing::{debug, warn};

use crate::error::ClientResult;
use crate::response::{screen_of, DataProviderChanged, FetchResponse, GenericScreen, Response};

/// What happened to one reply's envelopes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub applied: usize,
    pub ignored: usize,
    pub failed: usize,
}

/// Applies every envelope in order. A failing envelope is logged and
/// counted; the ones after it still apply.
pub fn dispatch(store: &mut ContentStore, responses: Vec<Response>) -> DispatchReport {
    let mut report = DispatchReport::default();
    for response in responses {
        match apply(store, response) {
            Ok(true) => report.applied += 1,
            Ok(false) => report.ignored += 1,
            Err(err) => {
                warn!(error = %err, "failed to apply response");
                report.failed += 1;
            }
        }
    }
    report
}

fn apply(store: &mut ContentStore, response: Response) -> ClientResult<bool> {
    match response {
        Response::GenericScreen(screen) => apply_screen(store, screen)?,
        Response::CloseScreen(close) => {
            store.close_screen(&close.component_id, false);
        }
        Response::Fetch(fetch) => apply_fetch(store, fetch)?,
        Response::MetaData(meta) => {
            let screen = screen_of(&meta.data_provider).to_string();
            store.data_mut().set_meta_data(&screen, meta);
        }
        Response::DataProviderChanged(changed) => apply_provider_changed(store, changed),
        Response::Menu(menu) => {
            store.app_mut().set_menu(menu.entries);
            store.app_mut().set_toolbar_items(menu.tool_bar_entries);
        }
        Response::ApplicationSettings(settings) => {
            if let Some(desktop) = settings.desktop {
                apply_components(store, desktop.components, Scope::Desktop)?;
            }
            store.app_mut().set_settings(settings.settings);
        }
        Response::Translation(translation) => store.app_mut().set_translations(translation.texts),
        Response::ApplicationMetaData(meta) => store.app_mut().set_app_meta_data(meta),
        Response::UserData(user) => store.app_mut().set_user_data(user),
        Response::Login(login) => store.login_requested(login.mode),
        Response::Error(error) => store.server_error(ErrorReport {
            title: error.title,
            message: error.message,
            details: error.details,
        }),
        Response::SessionExpired(message) => store.session_expired(message.message),
        Response::Restart(message) => store.restart_required(message.message),
        Response::Unknown => return Ok(false),
    }
    Ok(true)
}

fn apply_components(store: &mut ContentStore, components: Vec<Value>, scope: Scope) -> ClientResult<()> {
    let (deltas, skipped) = parse_deltas(Value::Array(components))?;
    let outcome = store.apply_deltas(deltas, scope);
    if skipped + outcome.skipped > 0 {
        debug!(skipped = skipped + outcome.skipped, "skipped malformed deltas");
    }
    Ok(())
}

fn apply_screen(store: &mut ContentStore, screen: GenericScreen) -> ClientResult<()> {
    apply_components(store, screen.changed_components, Scope::Screen)?;
    if screen.update {
        return Ok(());
    }
    let root = store
        .get_component_by_name(&screen.component_id)
        .or_else(|| store.get_component(&screen.component_id));
    let Some(root) = root else {
        warn!(screen = %screen.component_id, "opened screen has no root component");
        return Ok(());
    };
    let popup = root.screen.is_modal();
    let active = ActiveScreen {
        name: root.name.clone().unwrap_or_else(|| screen.component_id.clone()),
        id: root.id.clone(),
        class_name: root.screen.class_name.clone(),
        popup,
    };
    store.set_active_screen(Some(active), popup);
    Ok(())
}

fn apply_fetch(store: &mut ContentStore, fetch: FetchResponse) -> ClientResult<()> {
    let screen = screen_of(&fetch.data_provider).to_string();
    let provider = fetch.data_provider;
    let rows = rows_from_records(&fetch.column_names, fetch.records)?;
    let reference_key = fetch
        .master_row
        .as_ref()
        .map(|master| serde_json::to_string(master))
        .transpose()?;

    let to = usize::try_from(fetch.to).unwrap_or(fetch.from);
    let data = store.data_mut();
    data.set_data(
        &screen,
        &provider,
        rows,
        fetch.from,
        to,
        reference_key.as_deref(),
        fetch.clear,
    );
    data.set_all_fetched(&screen, &provider, reference_key.as_deref(), fetch.is_all_fetched);

    if let Some(sort) = fetch.sort_definition {
        data.set_sort_definition(&screen, &provider, sort);
    }

    match usize::try_from(fetch.selected_row) {
        Ok(index) => {
            let row = data
                .get_data(&screen, &provider)
                .and_then(|rows| rows.get(index))
                .cloned()
                .unwrap_or_default();
            data.set_selected_row(
                &screen,
                &provider,
                SelectedRow {
                    row,
                    index,
                    tree_path: fetch.tree_path,
                    selected_column: fetch.selected_column,
                },
            );
        }
        Err(_) => {
            if data.get_selected_row(&screen, &provider).is_some() {
                data.clear_selected_row(&screen, &provider);
            }
        }
    }
    Ok(())
}

fn apply_provider_changed(store: &mut ContentStore, changed: DataProviderChanged) {
    let screen = screen_of(&changed.data_provider).to_string();
    let provider = changed.data_provider;
    let data = store.data_mut();

    match changed.reload {
        Some(-1) => {
            data.clear_data_provider(&screen, &provider);
            data.request_fetch(FetchRequest::new(screen.clone(), provider.clone()));
        }
        Some(from) if from >= 0 => {
            let mut request = FetchRequest::new(screen.clone(), provider.clone());
            request.from_row = usize::try_from(from).unwrap_or_default();
            let key = data.reference_key(&screen, &provider);
            if key != CURRENT_PAGE {
                request.reference_key = Some(key);
            }
            data.request_fetch(request);
        }
        _ => {}
    }

    if let Some(index) = changed.deleted_row {
        data.delete_row(&screen, &provider, index);
    }

    if let (Some(columns), Some(values)) = (&changed.changed_column_names, &changed.changed_values) {
        data.update_selected_values(&screen, &provider, columns, values);
    }

    let patch = MetaDataPatch {
        insert_enabled: changed.insert_enabled,
        update_enabled: changed.update_enabled,
        delete_enabled: changed.delete_enabled,
        read_only: changed.read_only,
        columns: changed.changed_columns,
    };
    if patch != MetaDataPatch::default() {
        data.update_meta_data(&screen, &provider, &patch);
    }

    match changed.selected_row {
        Some(-1) => data.clear_selected_row(&screen, &provider),
        Some(index) if index >= 0 => {
            let index = usize::try_from(index).unwrap_or_default();
            let row = data
                .get_data(&screen, &provider)
                .and_then(|rows| rows.get(index))
                .cloned()
                .unwrap_or_default();
            data.set_selected_row(
                &screen,
                &provider,
                SelectedRow {
                    row,
                    index,
                    tree_path: None,
                    selected_column: changed.selected_column,
                },
            );
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(store: &mut ContentStore, body: Value) -> DispatchReport {
        dispatch(store, Response::parse_all(body).unwrap())
    }

    #[test]
    fn test_generic_screen_opens_screen() {
        let mut store = ContentStore::new();
        let report = run(
            &mut store,
            json!([{
                "name": "screen.generic",
                "componentId": "Orders",
                "changedComponents": [
                    {"id": "1", "name": "Orders", "className": "Panel", "screen_className_": "app.Orders"},
                    {"id": "2", "parent": "1", "className": "Button", "text": "Save"}
                ]
            }]),
        );
        assert_eq!(report, DispatchReport { applied: 1, ignored: 0, failed: 0 });
        let head = store.screens().head().unwrap();
        assert_eq!(head.id, "1");
        assert_eq!(head.class_name.as_deref(), Some("app.Orders"));
    }

    #[test]
    fn test_update_does_not_change_active_screens() {
        let mut store = ContentStore::new();
        run(
            &mut store,
            json!([{"name": "screen.generic", "componentId": "A", "update": true,
                    "changedComponents": [{"id": "1", "name": "A"}]}]),
        );
        assert!(store.screens().active_screens().is_empty());
        assert!(store.get_component("1").is_some());
    }

    #[test]
    fn test_fetch_zips_records_and_selects() {
        let mut store = ContentStore::new();
        run(
            &mut store,
            json!([{
                "name": "dal.fetch",
                "dataProvider": "app/Orders/orders",
                "columnNames": ["ID", "NAME"],
                "records": [[1, "a"], [2, "b"]],
                "from": 0, "to": 1,
                "selectedRow": 1,
                "isAllFetched": true
            }]),
        );
        let data = store.data();
        assert_eq!(data.get_data("Orders", "app/Orders/orders").unwrap().len(), 2);
        let selected = data.get_selected_row("Orders", "app/Orders/orders").unwrap();
        assert_eq!(selected.row.get("NAME"), Some(&json!("b")));
        assert!(data.is_all_fetched("Orders", "app/Orders/orders"));
    }

    #[test]
    fn test_provider_changed_reload_requests_fetch() {
        let mut store = ContentStore::new();
        run(
            &mut store,
            json!([
                {"name": "dal.fetch", "dataProvider": "app/S/dp", "columnNames": ["A"], "records": [[1]], "to": 0},
                {"name": "dal.dataProviderChanged", "dataProvider": "app/S/dp", "reload": -1, "deleteEnabled": false}
            ]),
        );
        assert!(store.data().get_data("S", "app/S/dp").is_none());
        assert_eq!(store.take_fetch_requests(), vec![FetchRequest::new("S", "app/S/dp")]);
        assert!(!store.data().get_meta_data("S", "app/S/dp").unwrap().delete_enabled);
    }

    #[test]
    fn test_failed_envelope_does_not_stop_the_rest() {
        let mut store = ContentStore::new();
        let report = run(
            &mut store,
            json!([
                {"name": "dal.fetch", "dataProvider": "app/S/dp", "columnNames": ["A"], "records": [[1, 2, 3]]},
                {"name": "userData", "userName": "admin"},
                {"name": "whatever"}
            ]),
        );
        assert_eq!(report, DispatchReport { applied: 1, ignored: 1, failed: 1 });
        assert_eq!(store.app().user_data().unwrap().user_name, "admin");
    }
}
