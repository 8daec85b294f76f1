use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::returns::{CreateReturnRequest, ReturnList},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
        return_requests::{ActiveModel as ReturnActive, Column as ReturnCol, Entity as ReturnRequests},
    },
    error::{AppError, AppResult},
    lifecycle::{OrderStatus, RefundStatus, ReturnStatus},
    middleware::auth::AuthUser,
    models::{AddressSnapshot, ReturnItem, ReturnRequest},
    response::{ApiResponse, Meta},
    routes::params::{ReturnListQuery, SortOrder, normalize_page},
    services::{
        address_service::resolve_address,
        mapping::{from_json, return_from_entity, returns_from_entities, to_json},
        order_service::merge_lines,
    },
    state::AppState,
};

pub async fn create_return(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReturnRequest,
) -> AppResult<ApiResponse<ReturnRequest>> {
    let reason = payload.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::BadRequest("reason is required".into()));
    }
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Select at least one item to return".into()));
    }

    let lines = merge_lines(
        payload
            .items
            .iter()
            .map(|line| (line.product_id, line.quantity)),
    )?;

    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(payload.order_id))
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::DeletedAt.is_null()),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.status.parse::<OrderStatus>()? != OrderStatus::Delivered {
        return Err(AppError::BadRequest(
            "Only delivered orders can be returned".into(),
        ));
    }
    let delivered_at = order.delivered_at.map(|dt| dt.with_timezone(&Utc));
    let now = Utc::now();
    if !state.return_window.is_open(delivered_at, now) {
        let message = match delivered_at.and_then(|at| state.return_window.closes_at(at)) {
            Some(closed_at) if closed_at < now => format!(
                "The return window for this order closed at {}",
                closed_at.to_rfc3339()
            ),
            _ => "The return window for this order is not open".to_string(),
        };
        return Err(AppError::BadRequest(message));
    }

    let open_return = ReturnRequests::find()
        .filter(
            Condition::all()
                .add(ReturnCol::OrderId.eq(order.id))
                .add(ReturnCol::Status.ne(ReturnStatus::Rejected.as_str())),
        )
        .one(&txn)
        .await?;
    if open_return.is_some() {
        return Err(AppError::Conflict(
            "A return request already exists for this order".into(),
        ));
    }

    // product_id -> (ordered quantity, unit price)
    let mut ordered: HashMap<Uuid, (i32, i64)> = HashMap::new();
    for item in OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?
    {
        let entry = ordered.entry(item.product_id).or_insert((0, item.unit_price));
        entry.0 = entry.0.saturating_add(item.quantity);
    }

    let mut items = Vec::with_capacity(lines.len());
    for (product_id, quantity) in lines {
        let (ordered_quantity, unit_price) = ordered.get(&product_id).copied().ok_or_else(|| {
            AppError::BadRequest(format!("Product {product_id} is not part of this order"))
        })?;
        if quantity > ordered_quantity {
            return Err(AppError::BadRequest(format!(
                "Cannot return {quantity} of product {product_id}; only {ordered_quantity} ordered"
            )));
        }
        items.push(ReturnItem {
            product_id,
            quantity,
            unit_price,
        });
    }
    let refund_amount = items
        .iter()
        .map(|item| item.unit_price * i64::from(item.quantity))
        .sum::<i64>();

    let pickup_address = match payload.pickup_address_id {
        Some(id) => AddressSnapshot::from(&resolve_address(&txn, user.user_id, Some(id)).await?),
        None => from_json(order.shipping_address.clone(), "shipping_address")?,
    };

    let return_request = ReturnActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        user_id: Set(user.user_id),
        items: Set(to_json(&items)?),
        reason: Set(reason),
        comment: Set(payload.comment.filter(|c| !c.trim().is_empty())),
        status: Set(ReturnStatus::Requested.as_str().to_string()),
        refund_status: Set(RefundStatus::Pending.as_str().to_string()),
        refund_amount: Set(refund_amount),
        pickup_address: Set(to_json(&pickup_address)?),
        requested_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(return_id = %return_request.id, order_id = %order.id, refund_amount, "return requested");
    audit::record(
        state,
        user.user_id,
        "return_request",
        "return_requests",
        serde_json::json!({ "return_id": return_request.id, "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Return requested",
        return_from_entity(return_request)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_returns(
    state: &AppState,
    user: &AuthUser,
    query: ReturnListQuery,
) -> AppResult<ApiResponse<ReturnList>> {
    let condition = Condition::all().add(ReturnCol::UserId.eq(user.user_id));
    let (items, meta) = page_returns(state, condition, query).await?;
    Ok(ApiResponse::success("Returns", ReturnList { items }, Some(meta)))
}

pub async fn get_return(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ReturnRequest>> {
    let found = ReturnRequests::find()
        .filter(
            Condition::all()
                .add(ReturnCol::Id.eq(id))
                .add(ReturnCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Return found",
        return_from_entity(found)?,
        Some(Meta::empty()),
    ))
}

pub async fn page_returns(
    state: &AppState,
    condition: Condition,
    query: ReturnListQuery,
) -> AppResult<(Vec<ReturnRequest>, Meta)> {
    let (page, limit, offset) = normalize_page(query.page, query.per_page);
    let mut condition = condition;
    if let Some(status) = query.status {
        condition = condition.add(ReturnCol::Status.eq(status.as_str()));
    }

    let mut finder = ReturnRequests::find().filter(condition);
    finder = match query.sort_order.unwrap_or_default() {
        SortOrder::Asc => finder.order_by_asc(ReturnCol::RequestedAt),
        SortOrder::Desc => finder.order_by_desc(ReturnCol::RequestedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let returns = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok((returns_from_entities(returns)?, Meta::new(page, limit, total)))
}
