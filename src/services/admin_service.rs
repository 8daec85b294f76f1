use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
        returns::{InitiateRefundRequest, ReturnList, SettleRefundRequest, UpdateReturnStatusRequest},
    },
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        return_requests::Entity as ReturnRequests,
    },
    error::{AppError, AppResult},
    lifecycle::ReturnAction,
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, ReturnRequest},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, ReturnListQuery},
    services::{
        lifecycle_service::{settle_return_refund, transition_order, transition_return},
        mapping::return_from_entity,
        order_service::{load_order_details, page_orders},
        return_service::page_returns,
    },
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (items, meta) = page_orders(state, Condition::all(), query).await?;
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .filter(OrderCol::DeletedAt.is_null())
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Order found",
        load_order_details(&state.orm, order).await?,
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let location = payload
        .location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());

    let order = transition_order(
        state,
        user,
        id,
        None,
        payload.status,
        payload.expected_status,
        location,
    )
    .await?;

    Ok(ApiResponse::success("Order updated", order, Some(Meta::empty())))
}

/// Soft delete: the row stays for history but drops out of every listing.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .filter(OrderCol::DeletedAt.is_null())
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.deleted_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id = %id, "order soft-deleted");
    audit::record(
        state,
        user.user_id,
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

pub async fn list_all_returns(
    state: &AppState,
    user: &AuthUser,
    query: ReturnListQuery,
) -> AppResult<ApiResponse<ReturnList>> {
    ensure_admin(user)?;
    let (items, meta) = page_returns(state, Condition::all(), query).await?;
    Ok(ApiResponse::success("Returns", ReturnList { items }, Some(meta)))
}

pub async fn get_return_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ReturnRequest>> {
    ensure_admin(user)?;
    let found = ReturnRequests::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Return found",
        return_from_entity(found)?,
        Some(Meta::empty()),
    ))
}

pub async fn update_return_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateReturnStatusRequest,
) -> AppResult<ApiResponse<ReturnRequest>> {
    ensure_admin(user)?;
    if payload.action == ReturnAction::InitiateRefund {
        return Err(AppError::BadRequest(
            "Use the refund endpoint to initiate a refund".into(),
        ));
    }

    let updated = transition_return(
        state,
        user,
        id,
        payload.action,
        payload.expected_status,
        payload.expected_refund_status,
    )
    .await?;
    Ok(ApiResponse::success("Return updated", updated, Some(Meta::empty())))
}

pub async fn initiate_refund(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InitiateRefundRequest,
) -> AppResult<ApiResponse<ReturnRequest>> {
    ensure_admin(user)?;
    let updated = transition_return(
        state,
        user,
        id,
        ReturnAction::InitiateRefund,
        payload.expected_status,
        payload.expected_refund_status,
    )
    .await?;
    Ok(ApiResponse::success("Refund initiated", updated, Some(Meta::empty())))
}

pub async fn settle_refund(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SettleRefundRequest,
) -> AppResult<ApiResponse<ReturnRequest>> {
    ensure_admin(user)?;
    let updated = settle_return_refund(state, user, id, payload.succeeded).await?;
    let message = if payload.succeeded {
        "Refund completed"
    } else {
        "Refund failed"
    };
    Ok(ApiResponse::success(message, updated, Some(Meta::empty())))
}
