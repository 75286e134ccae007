//! Property-based invariant tests for the content store.
//!
//! 1. An id lives in at most one registry partition after any batch.
//! 2. Toolbar helpers exist exactly when their panel is active or removed.
//! 3. Deleting the selected row never leaves a dangling selection.
//! 4. A single inserted row merged over a non-inserted slot grows the page by
//!    one and keeps the selection inside it.

use std::collections::HashMap;

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use thinview_content::data::{is_inserted, RECORD_STATUS};
use thinview_content::synthesis::toolbar_helper_ids;
use thinview_content::{ComponentDelta, ContentStore, Partition, Row, Scope, SelectedRow};

// ── Helpers ─────────────────────────────────────────────────────────────

const PANELS: [&str; 3] = ["TB0", "TB1", "TB2"];
const CHILDREN: [&str; 4] = ["c0", "c1", "c2", "c3"];

#[derive(Debug, Clone)]
enum Op {
    Upsert { id: usize, toolbar: bool, area: i64, layout: bool },
    Child { id: usize, parent: usize, toolbar_kind: bool, named_custom: bool },
    Remove { id: usize, panel: bool },
    Destroy { id: usize, panel: bool },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, any::<bool>(), 0i64..4, any::<bool>())
            .prop_map(|(id, toolbar, area, layout)| Op::Upsert { id, toolbar, area, layout }),
        (0usize..4, 0usize..3, any::<bool>(), any::<bool>()).prop_map(
            |(id, parent, toolbar_kind, named_custom)| Op::Child {
                id,
                parent,
                toolbar_kind,
                named_custom
            }
        ),
        (0usize..4, any::<bool>()).prop_map(|(id, panel)| Op::Remove { id, panel }),
        (0usize..4, any::<bool>()).prop_map(|(id, panel)| Op::Destroy { id, panel }),
    ]
}

fn to_delta(op: &Op) -> ComponentDelta {
    let value = match op {
        Op::Upsert { id, toolbar, area, layout } => {
            let mut v = json!({"id": PANELS[*id], "toolBarArea": area});
            if *toolbar {
                v["className"] = json!("ToolBarPanel");
            }
            if *layout {
                v["layout"] = json!("GridLayout,1,1");
            }
            v
        }
        Op::Child { id, parent, toolbar_kind, named_custom } => {
            let mut v = json!({
                "id": CHILDREN[*id],
                "parent": PANELS[*parent],
                "className": if *toolbar_kind { "ToolBar" } else { "Button" },
            });
            if *named_custom {
                v["name"] = json!("custom");
            }
            v
        }
        Op::Remove { id, panel } => {
            let id = if *panel { PANELS[id % 3] } else { CHILDREN[*id] };
            json!({"id": id, "~remove": true})
        }
        Op::Destroy { id, panel } => {
            let id = if *panel { PANELS[id % 3] } else { CHILDREN[*id] };
            json!({"id": id, "~destroy": true})
        }
    };
    ComponentDelta::from_value(value).unwrap()
}

fn batches_strategy() -> impl Strategy<Value = Vec<(Vec<Op>, bool)>> {
    prop::collection::vec((prop::collection::vec(op_strategy(), 1..6), any::<bool>()), 1..8)
}

fn rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            let mut row = Map::new();
            row.insert("n".to_string(), Value::from(i));
            row
        })
        .collect()
}

fn select(index: usize) -> SelectedRow {
    let mut row = Map::new();
    row.insert("n".to_string(), Value::from(index));
    SelectedRow {
        row,
        index,
        tree_path: None,
        selected_column: None,
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Partition exclusivity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn ids_occupy_at_most_one_partition(batches in batches_strategy()) {
        let mut store = ContentStore::new();
        store.registry_mut().register_replacement("custom");
        for (ops, desktop) in &batches {
            let scope = if *desktop { Scope::Desktop } else { Scope::Screen };
            store.apply_deltas(ops.iter().map(to_delta).collect(), scope);

            let mut seen: HashMap<&String, usize> = HashMap::new();
            for id in store.registry().all_ids() {
                *seen.entry(id).or_default() += 1;
            }
            for (id, count) in seen {
                prop_assert_eq!(count, 1, "id {} found in {} partitions", id, count);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Toolbar helper atomicity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn toolbar_helpers_track_their_panel(
        batches in prop::collection::vec(prop::collection::vec(op_strategy(), 1..6), 1..8)
    ) {
        let mut store = ContentStore::new();
        for ops in &batches {
            store.apply_deltas(ops.iter().map(to_delta).collect(), Scope::Screen);

            let registry = store.registry();
            for panel in PANELS {
                let is_toolbar = registry.get(panel).is_some_and(|c| c.kind.is_toolbar_panel());
                let (main, center) = toolbar_helper_ids(panel);
                let panel_partition = registry.partition_of(panel);
                prop_assert_eq!(registry.contains(&main), registry.contains(&center));
                if is_toolbar {
                    prop_assert!(matches!(
                        panel_partition,
                        Some(Partition::Active) | Some(Partition::Removed)
                    ));
                    prop_assert!(registry.contains(&main), "{} lost its helpers", panel);
                    prop_assert_eq!(registry.partition_of(&main), panel_partition);
                    prop_assert_eq!(registry.partition_of(&center), panel_partition);
                } else if panel_partition.is_none() {
                    prop_assert!(!registry.contains(&main), "helpers outlived {}", panel);
                }
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Selection index bound after delete
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn delete_never_leaves_dangling_selection(len in 1usize..20, pick in 0usize..20) {
        let index = pick % len;
        let mut store = ContentStore::new();
        let data = store.data_mut();
        data.set_data("scr", "dp", rows(len), 0, len - 1, None, false);
        data.set_selected_row("scr", "dp", select(index));
        data.delete_data_provider_data("scr", "dp");

        let remaining = data.get_data("scr", "dp").map_or(0, <[Row]>::len);
        prop_assert_eq!(remaining, len - 1);
        if let Some(selected) = data.get_selected_row("scr", "dp") {
            prop_assert!(selected.index < remaining);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Placeholder row on single inserted row
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn single_insert_grows_page_by_one(len in 1usize..15, sel in 0usize..15, at in 0usize..15) {
        let selected = sel % len;
        let from = at % len;
        let mut store = ContentStore::new();
        let data = store.data_mut();
        data.set_data("scr", "dp", rows(len), 0, len - 1, None, false);
        data.set_selected_row("scr", "dp", select(selected));

        let mut inserted = Map::new();
        inserted.insert("n".to_string(), json!("new"));
        inserted.insert(RECORD_STATUS.to_string(), json!("I"));
        data.set_data("scr", "dp", vec![inserted.clone()], from, from, None, false);

        let page = data.get_data("scr", "dp").unwrap();
        prop_assert_eq!(page.len(), len + 1);
        prop_assert_eq!(&page[from], &inserted);
        prop_assert_eq!(page.iter().filter(|r| is_inserted(r)).count(), 1);
        let selection = data.get_selected_row("scr", "dp").unwrap();
        prop_assert!(selection.index < page.len());
    }
}
