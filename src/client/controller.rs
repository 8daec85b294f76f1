use uuid::Uuid;

use crate::{
    client::{
        LifecycleBackend, LifecycleError,
        store::{LifecycleEntity, LifecycleStore, SyncState, Tracked},
    },
    lifecycle::{Action, DenialReason, EntityKind, OrderStatus, ReturnAction, can_transition},
    models::{Order, ReturnRequest},
    routes::params::{OrderListQuery, ReturnListQuery},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityId {
    Order(Uuid),
    Return(Uuid),
}

impl EntityId {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityId::Order(_) => EntityKind::Order,
            EntityId::Return(_) => EntityKind::ReturnRequest,
        }
    }

    pub fn uuid(&self) -> Uuid {
        match self {
            EntityId::Order(id) | EntityId::Return(id) => *id,
        }
    }
}

#[derive(Debug, Clone)]
pub enum UpdatedEntity {
    Order(Order),
    Return(ReturnRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub entity: EntityId,
    pub message: String,
}

/// Receives the outcome of every requested transition.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => tracing::info!(
                entity = %notice.entity.kind(),
                id = %notice.entity.uuid(),
                "{}",
                notice.message
            ),
            NoticeKind::Failure => tracing::warn!(
                entity = %notice.entity.kind(),
                id = %notice.entity.uuid(),
                "{}",
                notice.message
            ),
        }
    }
}

/// Drives lifecycle transitions from the client side. Holds no state of its
/// own; callers pass the store into every call.
pub struct LifecycleController<B, N = TracingNotifier> {
    backend: B,
    notifier: N,
}

impl<B: LifecycleBackend> LifecycleController<B, TracingNotifier> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            notifier: TracingNotifier,
        }
    }
}

impl<B: LifecycleBackend, N: Notifier> LifecycleController<B, N> {
    pub fn with_notifier(backend: B, notifier: N) -> Self {
        Self { backend, notifier }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn load_orders(
        &self,
        store: &mut LifecycleStore,
        query: OrderListQuery,
    ) -> Result<(), LifecycleError> {
        let page = self.backend.list_orders(&query).await?;
        store.orders.set_query(query);
        store.orders.replace_page(page);
        Ok(())
    }

    pub async fn load_returns(
        &self,
        store: &mut LifecycleStore,
        query: ReturnListQuery,
    ) -> Result<(), LifecycleError> {
        let page = self.backend.list_returns(&query).await?;
        store.returns.set_query(query);
        store.returns.replace_page(page);
        Ok(())
    }

    /// Validates `action` against the local copy, sends it once, and on
    /// success refreshes the list the entity belongs to.
    pub async fn request_transition(
        &self,
        store: &mut LifecycleStore,
        id: EntityId,
        action: Action,
    ) -> Result<UpdatedEntity, LifecycleError> {
        let result = match (id, action) {
            (EntityId::Order(uuid), Action::Order(target)) => self
                .transition_order(store, uuid, target)
                .await
                .map(UpdatedEntity::Order),
            (EntityId::Return(uuid), Action::Return(action)) => self
                .transition_return(store, uuid, action)
                .await
                .map(UpdatedEntity::Return),
            (id, action) => Err(LifecycleError::Validation(DenialReason::WrongEntity {
                entity: id.kind(),
                action: action.as_str(),
            })),
        };

        let notice = match &result {
            Ok(_) => Notice {
                kind: NoticeKind::Success,
                entity: id,
                message: format!("{} updated: {}", id.kind(), action),
            },
            Err(err) => Notice {
                kind: NoticeKind::Failure,
                entity: id,
                message: failure_message(err),
            },
        };
        self.notifier.notify(notice);

        result
    }

    async fn transition_order(
        &self,
        store: &mut LifecycleStore,
        id: Uuid,
        target: OrderStatus,
    ) -> Result<Order, LifecycleError> {
        let action = Action::Order(target);
        let local = match store.orders.get(id) {
            Some(tracked) => tracked.clone(),
            None => {
                let order = self.backend.fetch_order(id).await?;
                store.orders.commit(order.clone());
                Tracked {
                    value: order,
                    sync: SyncState::Committed,
                }
            }
        };
        check(&local, action)?;

        let expected = local.value.status;
        store.orders.mark_pending(id, action);
        tracing::debug!(order_id = %id, from = %expected, to = %target, "sending order transition");

        match self.backend.update_order_status(id, expected, target).await {
            Ok(order) => {
                store.orders.commit(order.clone());
                self.refresh_orders(store).await;
                Ok(order)
            }
            Err(err) => {
                store.orders.revert(id);
                if matches!(err, LifecycleError::Conflict(_)) {
                    // Entities off the current page are not covered by the list read.
                    if !self.refresh_orders(store).await || !store.orders.on_page(id) {
                        match self.backend.fetch_order(id).await {
                            Ok(order) => store.orders.commit(order),
                            Err(fetch_err) => {
                                tracing::warn!(order_id = %id, error = %fetch_err, "order refetch failed")
                            }
                        }
                    }
                }
                Err(err)
            }
        }
    }

    async fn transition_return(
        &self,
        store: &mut LifecycleStore,
        id: Uuid,
        return_action: ReturnAction,
    ) -> Result<ReturnRequest, LifecycleError> {
        let action = Action::Return(return_action);
        let local = match store.returns.get(id) {
            Some(tracked) => tracked.clone(),
            None => {
                let request = self.backend.fetch_return(id).await?;
                store.returns.commit(request.clone());
                Tracked {
                    value: request,
                    sync: SyncState::Committed,
                }
            }
        };
        check(&local, action)?;

        let expected = local.value.status;
        let expected_refund = local.value.refund_status;
        store.returns.mark_pending(id, action);
        tracing::debug!(return_id = %id, from = %expected, action = %action, "sending return transition");

        let sent = match return_action {
            ReturnAction::InitiateRefund => {
                self.backend
                    .initiate_refund(id, expected, expected_refund)
                    .await
            }
            other => {
                self.backend
                    .update_return_status(id, expected, expected_refund, other)
                    .await
            }
        };

        match sent {
            Ok(request) => {
                store.returns.commit(request.clone());
                self.refresh_returns(store).await;
                Ok(request)
            }
            Err(err) => {
                store.returns.revert(id);
                if matches!(err, LifecycleError::Conflict(_)) {
                    // Entities off the current page are not covered by the list read.
                    if !self.refresh_returns(store).await || !store.returns.on_page(id) {
                        match self.backend.fetch_return(id).await {
                            Ok(request) => store.returns.commit(request),
                            Err(fetch_err) => {
                                tracing::warn!(return_id = %id, error = %fetch_err, "return refetch failed")
                            }
                        }
                    }
                }
                Err(err)
            }
        }
    }

    // A failed refetch leaves the last page in place; the transition itself
    // already succeeded or failed on its own terms.
    async fn refresh_orders(&self, store: &mut LifecycleStore) -> bool {
        let query = store.orders.query().clone();
        match self.backend.list_orders(&query).await {
            Ok(page) => {
                store.orders.replace_page(page);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "order list refetch failed");
                false
            }
        }
    }

    async fn refresh_returns(&self, store: &mut LifecycleStore) -> bool {
        let query = store.returns.query().clone();
        match self.backend.list_returns(&query).await {
            Ok(page) => {
                store.returns.replace_page(page);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "return list refetch failed");
                false
            }
        }
    }
}

fn check<T: LifecycleEntity>(local: &Tracked<T>, action: Action) -> Result<(), LifecycleError> {
    let current = local.value.current();
    if let SyncState::Pending(_) = local.sync {
        return Err(DenialReason::InFlight {
            entity: current.kind(),
        }
        .into());
    }
    can_transition(current, action).into_result()?;
    Ok(())
}

fn failure_message(err: &LifecycleError) -> String {
    match err {
        LifecycleError::Auth(_) => format!("{err}; please sign in again"),
        LifecycleError::Conflict(_) => format!("{err}; the list has been refreshed"),
        _ => err.to_string(),
    }
}
