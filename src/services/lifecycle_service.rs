//! Backend side of the order/return lifecycle: every status change goes through
//! here so the rule table is enforced against the locked row, not the caller's
//! copy.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseTransaction,
    EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit,
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        order_tracking::ActiveModel as TrackingActive,
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
        return_requests::{ActiveModel as ReturnActive, Entity as ReturnRequests},
    },
    error::{AppError, AppResult},
    lifecycle::{
        Action, Current, Effect, OrderStatus, RefundStatus, ReturnAction, ReturnStatus,
        can_transition, settle_refund,
    },
    middleware::auth::AuthUser,
    models::{Order, ReturnRequest},
    services::mapping::{order_from_entity, return_from_entity},
    state::AppState,
};

/// Moves an order to `target`. `owner` restricts the lookup to one customer's
/// orders; admins pass `None`.
pub async fn transition_order(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
    owner: Option<Uuid>,
    target: OrderStatus,
    expected: Option<OrderStatus>,
    location: Option<String>,
) -> AppResult<Order> {
    let txn = state.orm.begin().await?;

    let mut finder = Orders::find_by_id(id).filter(OrderCol::DeletedAt.is_null());
    if let Some(owner) = owner {
        finder = finder.filter(OrderCol::UserId.eq(owner));
    }
    let order = finder
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current: OrderStatus = order.status.parse()?;
    if let Some(expected) = expected.filter(|expected| *expected != current) {
        return Err(AppError::Conflict(format!(
            "order status changed from `{expected}` to `{current}`"
        )));
    }

    let effects = can_transition(Current::Order(current), Action::Order(target)).into_result()?;

    let now = Utc::now();
    let order_id = order.id;
    let mut active: OrderActive = order.into();
    for effect in effects {
        match effect {
            Effect::SetOrderStatus(status) => active.status = Set(status.as_str().to_string()),
            Effect::AppendTracking(status) => {
                append_tracking(&txn, order_id, status, location.clone()).await?
            }
            Effect::StampShippedAt => active.shipped_at = Set(Some(now.into())),
            Effect::StampDeliveredAt => active.delivered_at = Set(Some(now.into())),
            Effect::RestockItems => restock_items(&txn, order_id).await?,
            Effect::SetReturnStatus(_) | Effect::SetRefundStatus(_) => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "return effect produced for order {order_id}"
                )));
            }
        }
    }
    active.updated_at = Set(now.into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id = %order_id, from = %current, to = %target, "order transitioned");
    audit::record(
        state,
        actor.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order_id, "from": current, "to": target }),
    )
    .await;

    order_from_entity(updated)
}

pub async fn transition_return(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
    action: ReturnAction,
    expected: Option<ReturnStatus>,
    expected_refund: Option<RefundStatus>,
) -> AppResult<ReturnRequest> {
    let txn = state.orm.begin().await?;
    let (current, active) = lock_return(&txn, id).await?;

    if let Current::Return { status, refund } = current {
        if let Some(expected) = expected.filter(|expected| *expected != status) {
            return Err(AppError::Conflict(format!(
                "return request status changed from `{expected}` to `{status}`"
            )));
        }
        if let Some(expected) = expected_refund.filter(|expected| *expected != refund) {
            return Err(AppError::Conflict(format!(
                "refund status changed from `{expected}` to `{refund}`"
            )));
        }
    }

    let effects = can_transition(current, Action::Return(action)).into_result()?;
    let updated = apply_return_effects(&txn, active, &effects).await?;
    txn.commit().await?;

    tracing::info!(return_id = %id, action = action.as_str(), "return request transitioned");
    audit::record(
        state,
        actor.user_id,
        "return_status_update",
        "return_requests",
        serde_json::json!({ "return_id": id, "action": action }),
    )
    .await;

    return_from_entity(updated)
}

/// Records the outcome of an initiated refund.
pub async fn settle_return_refund(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
    succeeded: bool,
) -> AppResult<ReturnRequest> {
    let txn = state.orm.begin().await?;
    let (current, active) = lock_return(&txn, id).await?;

    let effects = settle_refund(current, succeeded)?;
    let updated = apply_return_effects(&txn, active, &effects).await?;
    txn.commit().await?;

    if succeeded {
        tracing::info!(return_id = %id, "refund settled");
    } else {
        tracing::warn!(return_id = %id, "refund failed");
    }
    audit::record(
        state,
        actor.user_id,
        "refund_settled",
        "return_requests",
        serde_json::json!({ "return_id": id, "succeeded": succeeded }),
    )
    .await;

    return_from_entity(updated)
}

async fn lock_return(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> AppResult<(Current, ReturnActive)> {
    let model = ReturnRequests::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current = Current::Return {
        status: model.status.parse()?,
        refund: model.refund_status.parse()?,
    };
    Ok((current, model.into()))
}

async fn apply_return_effects(
    txn: &DatabaseTransaction,
    mut active: ReturnActive,
    effects: &[Effect],
) -> AppResult<crate::entity::return_requests::Model> {
    for effect in effects {
        match effect {
            Effect::SetReturnStatus(status) => active.status = Set(status.as_str().to_string()),
            Effect::SetRefundStatus(refund) => {
                active.refund_status = Set(refund.as_str().to_string())
            }
            other => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "order effect {other:?} produced for return request"
                )));
            }
        }
    }
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

pub async fn append_tracking<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    status: OrderStatus,
    location: Option<String>,
) -> AppResult<()> {
    TrackingActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        status: Set(status.as_str().to_string()),
        location: Set(location),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(())
}

async fn restock_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<()> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(conn)
        .await?;

    for item in items {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(conn)
            .await?;
    }
    Ok(())
}
