//! Client-side lifecycle orchestration: validate locally, ask the backend once,
//! then re-read the backend's view of the list.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    lifecycle::{DenialReason, OrderStatus, RefundStatus, ReturnAction, ReturnStatus},
    models::{Order, ReturnRequest},
    response::Meta,
    routes::params::{OrderListQuery, ReturnListQuery},
};

pub mod controller;
pub mod http;
pub mod store;

pub use controller::{
    EntityId, LifecycleController, Notice, NoticeKind, Notifier, TracingNotifier, UpdatedEntity,
};
pub use http::HttpBackend;
pub use store::{Collection, LifecycleEntity, LifecycleStore, SyncState, Tracked};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// Rejected locally; nothing was sent.
    #[error("{0}")]
    Validation(#[from] DenialReason),

    #[error("authentication required: {0}")]
    Auth(String),

    /// The backend refused because the entity changed under us.
    #[error("{0}")]
    Conflict(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: Meta,
}

/// Everything the controller needs from the backend. Every call is attempted
/// exactly once.
#[async_trait]
pub trait LifecycleBackend: Send + Sync {
    async fn fetch_order(&self, id: Uuid) -> Result<Order, LifecycleError>;

    async fn list_orders(&self, query: &OrderListQuery) -> Result<Page<Order>, LifecycleError>;

    async fn update_order_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> Result<Order, LifecycleError>;

    async fn fetch_return(&self, id: Uuid) -> Result<ReturnRequest, LifecycleError>;

    async fn list_returns(
        &self,
        query: &ReturnListQuery,
    ) -> Result<Page<ReturnRequest>, LifecycleError>;

    /// `expected` and `expected_refund` are the statuses the caller validated
    /// against; the backend answers with a conflict if either moved.
    async fn update_return_status(
        &self,
        id: Uuid,
        expected: ReturnStatus,
        expected_refund: RefundStatus,
        action: ReturnAction,
    ) -> Result<ReturnRequest, LifecycleError>;

    async fn initiate_refund(
        &self,
        id: Uuid,
        expected: ReturnStatus,
        expected_refund: RefundStatus,
    ) -> Result<ReturnRequest, LifecycleError>;
}
