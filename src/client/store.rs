use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    client::Page,
    lifecycle::{Action, Current},
    models::{Order, ReturnRequest},
    response::Meta,
    routes::params::{OrderListQuery, ReturnListQuery},
};

pub trait LifecycleEntity: Clone {
    fn id(&self) -> Uuid;
    fn current(&self) -> Current;
}

impl LifecycleEntity for Order {
    fn id(&self) -> Uuid {
        self.id
    }

    fn current(&self) -> Current {
        self.lifecycle()
    }
}

impl LifecycleEntity for ReturnRequest {
    fn id(&self) -> Uuid {
        self.id
    }

    fn current(&self) -> Current {
        self.lifecycle()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Matches what the backend last confirmed.
    Committed,
    /// A transition was sent and has not been answered yet.
    Pending(Action),
}

#[derive(Debug, Clone)]
pub struct Tracked<T> {
    pub value: T,
    pub sync: SyncState,
}

/// One paginated list plus every copy of its entity kind the client holds.
#[derive(Debug, Clone)]
pub struct Collection<T, Q> {
    query: Q,
    page: Vec<Uuid>,
    meta: Option<Meta>,
    entries: HashMap<Uuid, Tracked<T>>,
}

impl<T: LifecycleEntity, Q: Clone + Default> Default for Collection<T, Q> {
    fn default() -> Self {
        Self::new(Q::default())
    }
}

impl<T: LifecycleEntity, Q: Clone> Collection<T, Q> {
    pub fn new(query: Q) -> Self {
        Self {
            query,
            page: Vec::new(),
            meta: None,
            entries: HashMap::new(),
        }
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn set_query(&mut self, query: Q) {
        self.query = query;
    }

    pub fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    pub fn get(&self, id: Uuid) -> Option<&Tracked<T>> {
        self.entries.get(&id)
    }

    /// Current page in backend order.
    pub fn page(&self) -> Vec<&Tracked<T>> {
        self.page.iter().filter_map(|id| self.entries.get(id)).collect()
    }

    pub fn on_page(&self, id: Uuid) -> bool {
        self.page.contains(&id)
    }

    pub fn is_pending(&self, id: Uuid) -> bool {
        matches!(
            self.entries.get(&id).map(|tracked| tracked.sync),
            Some(SyncState::Pending(_))
        )
    }

    /// Replaces the page wholesale with a fresh backend read; the most recent
    /// read wins.
    pub fn replace_page(&mut self, page: Page<T>) {
        self.page = page.items.iter().map(LifecycleEntity::id).collect();
        self.meta = Some(page.meta);
        for item in page.items {
            self.commit(item);
        }
    }

    /// Stores a backend-confirmed copy.
    pub fn commit(&mut self, value: T) {
        self.entries.insert(
            value.id(),
            Tracked {
                value,
                sync: SyncState::Committed,
            },
        );
    }

    pub fn mark_pending(&mut self, id: Uuid, action: Action) -> bool {
        match self.entries.get_mut(&id) {
            Some(tracked) => {
                tracked.sync = SyncState::Pending(action);
                true
            }
            None => false,
        }
    }

    /// Drops the pending tag and keeps the last committed value.
    pub fn revert(&mut self, id: Uuid) {
        if let Some(tracked) = self.entries.get_mut(&id) {
            tracked.sync = SyncState::Committed;
        }
    }
}

/// Application state the controller reads and writes. Callers own it and pass
/// it into every controller call.
#[derive(Debug, Clone, Default)]
pub struct LifecycleStore {
    pub orders: Collection<Order, OrderListQuery>,
    pub returns: Collection<ReturnRequest, ReturnListQuery>,
}

impl LifecycleStore {
    pub fn new() -> Self {
        Self::default()
    }
}
