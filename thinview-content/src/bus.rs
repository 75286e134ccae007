//! Typed publish/subscribe bus the presentation layer listens on.
//!
//! Handlers are keyed by [`Topic`] and removed through the opaque
//! [`SubscriptionId`] returned by [`EventBus::subscribe`]. Notification
//! snapshots the handler list first, so a handler may unsubscribe itself (or
//! anyone else) while it runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::component::ComponentId;

/// (screen, data provider) pair that owns one data book.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataKey {
    pub screen: String,
    pub data_provider: String,
}

impl DataKey {
    pub fn new(screen: impl Into<String>, data_provider: impl Into<String>) -> Self {
        Self {
            screen: screen.into(),
            data_provider: data_provider.into(),
        }
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.screen, self.data_provider)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalTopic {
    MenuItems,
    ToolbarItems,
    ActiveScreens,
    AppSettings,
    TranslationReady,
    UserData,
    AppMetaData,
    Login,
    ServerError,
    SessionExpired,
    RestartRequired,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    Properties(ComponentId),
    Children(ComponentId),
    Data(DataKey),
    MetaData(DataKey),
    SelectedRow(DataKey),
    SortDefinition(DataKey),
    Global(GlobalTopic),
}

/// Server-reported failure forwarded to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    pub title: Option<String>,
    pub message: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    PropertiesChanged { id: ComponentId },
    ChildrenChanged { parent: ComponentId },
    DataChanged(DataKey),
    MetaDataChanged(DataKey),
    SelectedRowChanged(DataKey),
    SortDefinitionChanged(DataKey),
    MenuChanged,
    ToolbarChanged,
    ActiveScreensChanged,
    AppSettingsChanged,
    TranslationReady,
    UserDataChanged,
    AppMetaDataChanged,
    LoginRequested { mode: Option<String> },
    ServerError(ErrorReport),
    SessionExpired { message: Option<String> },
    RestartRequired { message: Option<String> },
}

impl Notification {
    pub fn topic(&self) -> Topic {
        match self {
            Notification::PropertiesChanged { id } => Topic::Properties(id.clone()),
            Notification::ChildrenChanged { parent } => Topic::Children(parent.clone()),
            Notification::DataChanged(key) => Topic::Data(key.clone()),
            Notification::MetaDataChanged(key) => Topic::MetaData(key.clone()),
            Notification::SelectedRowChanged(key) => Topic::SelectedRow(key.clone()),
            Notification::SortDefinitionChanged(key) => Topic::SortDefinition(key.clone()),
            Notification::MenuChanged => Topic::Global(GlobalTopic::MenuItems),
            Notification::ToolbarChanged => Topic::Global(GlobalTopic::ToolbarItems),
            Notification::ActiveScreensChanged => Topic::Global(GlobalTopic::ActiveScreens),
            Notification::AppSettingsChanged => Topic::Global(GlobalTopic::AppSettings),
            Notification::TranslationReady => Topic::Global(GlobalTopic::TranslationReady),
            Notification::UserDataChanged => Topic::Global(GlobalTopic::UserData),
            Notification::AppMetaDataChanged => Topic::Global(GlobalTopic::AppMetaData),
            Notification::LoginRequested { .. } => Topic::Global(GlobalTopic::Login),
            Notification::ServerError(_) => Topic::Global(GlobalTopic::ServerError),
            Notification::SessionExpired { .. } => Topic::Global(GlobalTopic::SessionExpired),
            Notification::RestartRequired { .. } => Topic::Global(GlobalTopic::RestartRequired),
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Handler = Arc<dyn Fn(&Notification) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    handlers: HashMap<Topic, Vec<(SubscriptionId, Handler)>>,
    topics: HashMap<SubscriptionId, Topic>,
}

#[derive(Default)]
pub struct EventBus {
    inner: Mutex<BusInner>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("EventBus")
            .field("topics", &inner.handlers.len())
            .field("subscriptions", &inner.topics.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` on `topic`; handlers fire in subscription order.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner
            .handlers
            .entry(topic.clone())
            .or_default()
            .push((id, Arc::new(handler)));
        inner.topics.insert(id, topic);
        id
    }

    /// Removes a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(topic) = inner.topics.remove(&id) else {
            return false;
        };
        if let Some(list) = inner.handlers.get_mut(&topic) {
            list.retain(|(sub, _)| *sub != id);
            if list.is_empty() {
                inner.handlers.remove(&topic);
            }
        }
        true
    }

    /// Invokes every handler subscribed to the notification's topic.
    pub fn notify(&self, notification: Notification) {
        let snapshot: Vec<Handler> = {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            match inner.handlers.get(&notification.topic()) {
                Some(list) => list.iter().map(|(_, handler)| Arc::clone(handler)).collect(),
                None => return,
            }
        };
        for handler in snapshot {
            handler(&notification);
        }
    }

    pub fn handler_count(&self, topic: &Topic) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.handlers.get(topic).map_or(0, Vec::len)
    }

    pub fn subscription_count(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.topics.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&Notification) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, move |_: &Notification| {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_notify_reaches_only_matching_topic() {
        let bus = EventBus::new();
        let (hits, handler) = counter();
        bus.subscribe(Topic::Properties("A".to_string()), handler);

        bus.notify(Notification::PropertiesChanged { id: "B".to_string() });
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        bus.notify(Notification::PropertiesChanged { id: "A".to_string() });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handlers_fire_in_subscription_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = order.clone();
            bus.subscribe(Topic::Global(GlobalTopic::MenuItems), move |_| {
                order.lock().unwrap().push(n);
            });
        }
        bus.notify(Notification::MenuChanged);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let (hits, handler) = counter();
        let id = bus.subscribe(Topic::Global(GlobalTopic::ActiveScreens), handler);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.notify(Notification::ActiveScreensChanged);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscription_count(), 0);
    }

    #[test]
    fn test_handler_can_unsubscribe_itself_during_notify() {
        let bus = Arc::new(EventBus::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let own_id: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&bus);
        let h = hits.clone();
        let slot = own_id.clone();
        let id = bus.subscribe(Topic::Children("P".to_string()), move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            if let (Some(bus), Some(id)) = (weak.upgrade(), *slot.lock().unwrap()) {
                bus.unsubscribe(id);
            }
        });
        *own_id.lock().unwrap() = Some(id);

        let (later_hits, later) = counter();
        bus.subscribe(Topic::Children("P".to_string()), later);

        bus.notify(Notification::ChildrenChanged { parent: "P".to_string() });
        bus.notify(Notification::ChildrenChanged { parent: "P".to_string() });

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(later_hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_same_closure_subscribed_twice_gets_distinct_handles() {
        let bus = EventBus::new();
        let (hits, handler) = counter();
        let handler = Arc::new(handler);
        let h1 = handler.clone();
        let h2 = handler.clone();
        let a = bus.subscribe(Topic::Global(GlobalTopic::MenuItems), move |n| h1(n));
        let b = bus.subscribe(Topic::Global(GlobalTopic::MenuItems), move |n| h2(n));
        assert_ne!(a, b);

        bus.unsubscribe(a);
        bus.notify(Notification::MenuChanged);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
