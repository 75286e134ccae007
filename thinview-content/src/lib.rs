//! # Thinview content store
//!
//! Client-side mirror of a server-driven component tree. The server describes
//! screens as components and streams partial updates; this crate reconciles
//! them into a consistent local state and tells observers what changed.
//!
//! ## Features
//! - Component registry with active, removed, replaced and desktop partitions
//! - Parent/child index with read-time filtering
//! - Synthetic toolbar helpers and popup wrappers
//! - Per-screen data books with windowed row merges, selection and metadata
//! - Active screen stack with navigation names and history
//! - Typed event bus with handle-based unsubscription
//!
//! ## Example
//! ```ignore
//! use thinview_content::{ComponentDelta, ContentStore, Scope, Topic};
//!
//! let mut store = ContentStore::new();
//! store.bus().subscribe(Topic::Children("1".into()), |n| println!("{n:?}"));
//!
//! let delta = ComponentDelta::from_value(serde_json::json!({
//!     "id": "2", "parent": "1", "className": "Button", "text": "OK"
//! }))?;
//! store.apply_deltas(vec![delta], Scope::Screen);
//! ```

pub mod app;
pub mod bus;
pub mod children;
pub mod component;
pub mod data;
pub mod error;
pub mod registry;
pub mod screens;
pub mod store;
pub mod synthesis;

// --- Core types ---
pub use component::{Component, ComponentDelta, ComponentId, ComponentKind, ToolBarArea};
pub use error::{ContentError, ContentResult};
pub use registry::{BatchOutcome, ComponentRegistry, LifecycleState, Partition, Scope};
pub use store::ContentStore;

// --- Collaborators ---
pub use app::{AppMetaData, AppSettings, AppState, MenuItem, UserData};
pub use bus::{DataKey, ErrorReport, EventBus, GlobalTopic, Notification, SubscriptionId, Topic};
pub use children::ChildFilter;
pub use data::{
    DataStore, FetchRequest, MetaData, MetaDataPatch, Row, SelectedRow, SortDefinition, SortMode,
};
pub use screens::{ActiveScreen, ScreenState};

/// Parses a JSON array of component deltas.
///
/// A malformed entry only costs itself: it is logged and counted, and the
/// rest of the list is still returned.
pub fn parse_deltas(value: serde_json::Value) -> ContentResult<(Vec<ComponentDelta>, usize)> {
    let serde_json::Value::Array(items) = value else {
        return Err(ContentError::NotAnArray);
    };
    let mut deltas = Vec::with_capacity(items.len());
    let mut skipped = 0;
    for item in items {
        match ComponentDelta::from_value(item) {
            Ok(delta) => deltas.push(delta),
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed component delta");
                skipped += 1;
            }
        }
    }
    Ok((deltas, skipped))
}
