use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use thinview_content::synthesis::{popup_wrapper_id, toolbar_helper_ids};
use thinview_content::{
    parse_deltas, ActiveScreen, ChildFilter, ComponentDelta, ContentStore, DataKey, LifecycleState,
    Notification, Partition, Row, Scope, SelectedRow, Topic,
};

fn deltas(value: Value) -> Vec<ComponentDelta> {
    let (deltas, skipped) = parse_deltas(value).unwrap();
    assert_eq!(skipped, 0, "fixture deltas should all parse");
    deltas
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => panic!("row fixture must be an object"),
    }
}

fn record(store: &ContentStore, topic: Topic) -> Arc<Mutex<Vec<Notification>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    store.bus().subscribe(topic, move |n| s.lock().unwrap().push(n.clone()));
    seen
}

// Component lifecycle
#[test]
fn test_remove_keeps_component_for_reattach() {
    let mut store = ContentStore::new();
    store.apply_deltas(deltas(json!([{"id": "1", "name": "root", "className": "Panel"}])), Scope::Screen);
    assert_eq!(store.get_component("1").unwrap().name.as_deref(), Some("root"));

    store.apply_deltas(deltas(json!([{"id": "1", "~remove": true}])), Scope::Screen);
    let registry = store.registry();
    assert_eq!(registry.partition_of("1"), Some(Partition::Removed));
    assert_eq!(registry.active_count(), 0);
    assert_eq!(registry.get("1").unwrap().name.as_deref(), Some("root"));

    store.apply_deltas(deltas(json!([{"id": "1", "text": "back"}])), Scope::Screen);
    assert_eq!(store.registry().lifecycle("1"), LifecycleState::Active);
    assert_eq!(store.get_component("1").unwrap().name.as_deref(), Some("root"));
}

#[test]
fn test_destroy_dominates_remove() {
    let mut store = ContentStore::new();
    store.apply_deltas(deltas(json!([{"id": "1", "className": "Panel"}])), Scope::Screen);
    store.apply_deltas(
        deltas(json!([{"id": "1", "~remove": true, "~destroy": true}])),
        Scope::Screen,
    );
    assert_eq!(store.registry().lifecycle("1"), LifecycleState::Destroyed);
    assert!(store.get_component("1").is_none());
}

#[test]
fn test_destroyed_id_reuse_starts_fresh() {
    let mut store = ContentStore::new();
    store.apply_deltas(deltas(json!([{"id": "1", "name": "old", "text": "keep?"}])), Scope::Screen);
    store.apply_deltas(deltas(json!([{"id": "1", "~destroy": true}])), Scope::Screen);
    store.apply_deltas(deltas(json!([{"id": "1", "name": "new"}])), Scope::Screen);

    let component = store.get_component("1").unwrap();
    assert_eq!(component.name.as_deref(), Some("new"));
    assert_eq!(component.text, None);
}

#[test]
fn test_partial_merge_leaves_other_fields() {
    let mut store = ContentStore::new();
    store.apply_deltas(
        deltas(json!([{
            "id": "7", "name": "btn", "className": "Button", "parent": "P",
            "constraints": "North", "visible": false, "style": "primary"
        }])),
        Scope::Screen,
    );
    let before = store.get_component("7").unwrap().clone();

    store.apply_deltas(deltas(json!([{"id": "7", "text": "Save"}])), Scope::Screen);
    let after = store.get_component("7").unwrap();

    assert_eq!(after.text.as_deref(), Some("Save"));
    let mut expected = before;
    expected.text = Some("Save".to_string());
    assert_eq!(*after, expected);
}

#[test]
fn test_child_before_parent_in_same_batch() {
    let mut store = ContentStore::new();
    store.apply_deltas(
        deltas(json!([
            {"id": "c", "parent": "p", "className": "Label"},
            {"id": "p", "className": "Panel"}
        ])),
        Scope::Screen,
    );
    let children: Vec<&str> = store
        .children_of("p", &ChildFilter::All)
        .into_iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(children, vec!["c"]);
}

#[test]
fn test_children_filtered_at_read_time() {
    let mut store = ContentStore::new();
    store.apply_deltas(
        deltas(json!([
            {"id": "p", "className": "Panel"},
            {"id": "a", "parent": "p", "className": "Button"},
            {"id": "b", "parent": "p", "className": "Label", "visible": false},
            {"id": "c", "parent": "p", "className": "Button", "~remove": true}
        ])),
        Scope::Screen,
    );
    let ids = |filter: ChildFilter| -> Vec<String> {
        store
            .children_of("p", &filter)
            .into_iter()
            .map(|c| c.id.clone())
            .collect()
    };
    assert_eq!(ids(ChildFilter::All), vec!["a", "b"]);
    assert_eq!(ids(ChildFilter::Visible), vec!["a"]);
    assert_eq!(ids(ChildFilter::IncludeRemoved), vec!["a", "b", "c"]);
}

#[test]
fn test_replacement_keeps_skeleton_only() {
    let mut store = ContentStore::new();
    store.registry_mut().register_replacement("chart");
    store.apply_deltas(
        deltas(json!([{"id": "9", "name": "chart", "parent": "p", "constraints": "Center", "text": "ignored"}])),
        Scope::Screen,
    );
    assert_eq!(store.registry().partition_of("9"), Some(Partition::Replaced));
    let skeleton = store.get_component("9").unwrap();
    assert_eq!(skeleton.constraints.as_deref(), Some("Center"));
    assert_eq!(skeleton.text, None);

    store.apply_deltas(deltas(json!([{"id": "9", "~remove": true}])), Scope::Screen);
    assert_eq!(store.registry().lifecycle("9"), LifecycleState::ReplacedRemoved);
}

#[test]
fn test_desktop_scope_has_its_own_partition() {
    let mut store = ContentStore::new();
    store.apply_deltas(deltas(json!([{"id": "d1", "className": "DesktopPanel"}])), Scope::Desktop);
    assert_eq!(store.registry().partition_of("d1"), Some(Partition::Desktop));
    assert_eq!(store.registry().active_count(), 0);
}

// Notifications
#[test]
fn test_shared_parent_notified_once_per_batch() {
    let mut store = ContentStore::new();
    let seen = record(&store, Topic::Children("P".to_string()));
    store.apply_deltas(
        deltas(json!([
            {"id": "a", "parent": "P"},
            {"id": "b", "parent": "P"},
            {"id": "c", "parent": "P"},
            {"id": "a", "text": "again"}
        ])),
        Scope::Screen,
    );
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_reparent_within_batch_notifies_each_parent_once() {
    let mut store = ContentStore::new();
    let a = record(&store, Topic::Children("A".to_string()));
    let b = record(&store, Topic::Children("B".to_string()));

    store.apply_deltas(
        deltas(json!([{"id": "5", "parent": "A"}, {"id": "5", "parent": "B"}])),
        Scope::Screen,
    );

    assert_eq!(a.lock().unwrap().len(), 1);
    assert_eq!(b.lock().unwrap().len(), 1);
    assert_eq!(store.registry().indexed_parent("5").map(String::as_str), Some("B"));
    assert_eq!(store.children_of("A", &ChildFilter::All).len(), 0);
}

#[test]
fn test_properties_fire_once_per_touched_component() {
    let mut store = ContentStore::new();
    let seen = record(&store, Topic::Properties("x".to_string()));
    store.apply_deltas(
        deltas(json!([{"id": "x", "text": "1"}, {"id": "x", "text": "2"}])),
        Scope::Screen,
    );
    assert_eq!(*seen.lock().unwrap(), vec![Notification::PropertiesChanged { id: "x".to_string() }]);
}

// Synthesis
#[test]
fn test_toolbar_panel_expands_to_helpers() {
    let mut store = ContentStore::new();
    store.apply_deltas(
        deltas(json!([{"id": "TB1", "className": "ToolBarPanel", "toolBarArea": 0, "layout": "FlowLayout"}])),
        Scope::Screen,
    );
    let (main, center) = toolbar_helper_ids("TB1");
    assert_eq!(main, "TB1-tbMain");
    assert_eq!(store.get_component(&main).unwrap().constraints.as_deref(), Some("North"));
    assert_eq!(store.get_component(&center).unwrap().layout.as_deref(), Some("FlowLayout"));
    assert_eq!(
        store.get_component("TB1").unwrap().layout.as_deref(),
        Some("BorderLayout,0,0,0,0,0,0,")
    );
}

#[test]
fn test_toolbar_helpers_follow_panel_lifecycle() {
    let mut store = ContentStore::new();
    store.apply_deltas(
        deltas(json!([{"id": "TB1", "className": "ToolBarPanel", "toolBarArea": 3}])),
        Scope::Screen,
    );
    let (main, center) = toolbar_helper_ids("TB1");

    store.apply_deltas(deltas(json!([{"id": "TB1", "~remove": true}])), Scope::Screen);
    assert_eq!(store.registry().partition_of(&main), Some(Partition::Removed));
    assert_eq!(store.registry().partition_of(&center), Some(Partition::Removed));

    store.apply_deltas(deltas(json!([{"id": "TB1", "~destroy": true}])), Scope::Screen);
    assert!(!store.registry().contains(&main));
    assert!(!store.registry().contains(&center));
}

#[test]
fn test_modal_panel_gets_popup_wrapper() {
    let mut store = ContentStore::new();
    store.apply_deltas(
        deltas(json!([{"id": "M", "name": "Dlg", "className": "Panel", "screen_modal_": true, "screen_title_": "Pick"}])),
        Scope::Screen,
    );
    let wrapper = popup_wrapper_id("M");
    assert!(store.registry().contains(&wrapper));
    assert_eq!(store.registry().indexed_parent("M"), Some(&wrapper));
}

// Data books
#[test]
fn test_windowed_merge_overwrites_in_place() {
    let mut store = ContentStore::new();
    let data = store.data_mut();
    data.set_data("scr", "dp", vec![row(json!({"a": 1})), row(json!({"a": 2}))], 0, 1, None, false);
    data.set_data("scr", "dp", vec![row(json!({"a": 99}))], 0, 0, None, false);
    assert_eq!(
        store.data().get_data("scr", "dp").unwrap(),
        &[row(json!({"a": 99})), row(json!({"a": 2}))]
    );
}

#[test]
fn test_delete_selected_row_clears_selection() {
    let mut store = ContentStore::new();
    let seen = record(&store, Topic::SelectedRow(DataKey::new("scr", "dp")));
    let data = store.data_mut();
    data.set_data("scr", "dp", vec![row(json!({"a": 1})), row(json!({"a": 2}))], 0, 1, None, false);
    data.set_selected_row(
        "scr",
        "dp",
        SelectedRow {
            row: row(json!({"a": 2})),
            index: 1,
            tree_path: None,
            selected_column: None,
        },
    );
    data.delete_data_provider_data("scr", "dp");

    assert!(store.data().get_selected_row("scr", "dp").is_none());
    assert_eq!(seen.lock().unwrap().len(), 2);
}

// Screens
#[test]
fn test_closing_top_screen_returns_to_previous() {
    let mut store = ContentStore::new();
    store.set_active_screen(Some(ActiveScreen::new("S1", "1")), false);
    store.set_active_screen(Some(ActiveScreen::new("S2", "2")), false);
    store.close_screen("S2", false);
    assert_eq!(store.screens().head().unwrap().name, "S1");
}

#[test]
fn test_data_kept_while_another_component_shares_screen_name() {
    let mut store = ContentStore::new();
    store.apply_deltas(
        deltas(json!([
            {"id": "1", "name": "Orders", "className": "Panel"},
            {"id": "2", "name": "Orders", "className": "Panel"}
        ])),
        Scope::Screen,
    );
    store.set_active_screen(Some(ActiveScreen::new("Orders", "1")), false);
    store
        .data_mut()
        .set_data("Orders", "dp", vec![row(json!({"a": 1}))], 0, 0, None, false);

    store.close_screen("Orders", false);
    assert!(store.get_component("1").is_none());
    assert!(store.data().has_screen("Orders"));
}

#[test]
fn test_malformed_delta_only_costs_itself() {
    let (parsed, skipped) = parse_deltas(json!([{"name": "no id"}, {"id": "ok"}, 42])).unwrap();
    assert_eq!(skipped, 2);
    assert_eq!(parsed.len(), 1);
    assert!(parse_deltas(json!({"id": "1"})).is_err());
}
