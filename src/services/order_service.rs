use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CheckoutRequest, CheckoutSession, OrderList, OrderWithItems, VerifyPaymentRequest},
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        order_tracking::{Column as TrackingCol, Entity as OrderTracking},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    lifecycle::{OrderStatus, PaymentStatus},
    middleware::auth::AuthUser,
    models::{AddressSnapshot, Order},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder, normalize_page},
    services::{
        address_service::resolve_address,
        lifecycle_service::{append_tracking, transition_order},
        mapping::{
            order_from_entity, order_item_from_entity, orders_from_entities, to_json,
            tracking_from_entity,
        },
    },
    state::AppState,
};

/// Upper bound on the merged quantity of one product in a checkout or return.
pub const MAX_LINE_QUANTITY: i32 = 10_000;

/// Merges duplicate lines for one product. Quantities must be positive and the
/// merged total may not exceed [`MAX_LINE_QUANTITY`].
pub fn merge_lines(
    lines: impl IntoIterator<Item = (Uuid, i32)>,
) -> AppResult<BTreeMap<Uuid, i32>> {
    let mut merged: BTreeMap<Uuid, i32> = BTreeMap::new();
    for (product_id, quantity) in lines {
        if quantity <= 0 {
            return Err(AppError::BadRequest("Item quantity must be positive".into()));
        }
        let total = merged.entry(product_id).or_default();
        *total = total
            .checked_add(quantity)
            .filter(|sum| *sum <= MAX_LINE_QUANTITY)
            .ok_or_else(|| {
                AppError::BadRequest(format!("Quantity for product {product_id} is too large"))
            })?;
    }
    Ok(merged)
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    let (items, meta) = page_orders(state, condition, query).await?;
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

/// Shared by the customer and admin listings; soft-deleted orders never show.
pub async fn page_orders(
    state: &AppState,
    condition: Condition,
    query: OrderListQuery,
) -> AppResult<(Vec<Order>, Meta)> {
    let (page, limit, offset) = normalize_page(query.page, query.per_page);
    let mut condition = condition.add(OrderCol::DeletedAt.is_null());
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or_default() {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok((orders_from_entities(orders)?, Meta::new(page, limit, total)))
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutSession>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Checkout has no items".into()));
    }

    let lines = merge_lines(
        payload
            .items
            .iter()
            .map(|item| (item.product_id, item.quantity)),
    )?;

    let txn = state.orm.begin().await?;

    let address = resolve_address(&txn, user.user_id, payload.address_id).await?;
    let snapshot = AddressSnapshot::from(&address);

    let mut priced: Vec<(Uuid, i32, i64)> = Vec::with_capacity(lines.len());
    let mut total_amount: i64 = 0;
    for (product_id, quantity) in &lines {
        let product = Products::find_by_id(*product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::BadRequest(format!("Unknown product {product_id}")))?;
        if product.stock < *quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product {product_id}"
            )));
        }
        total_amount = product
            .price
            .checked_mul(i64::from(*quantity))
            .and_then(|line_total| total_amount.checked_add(line_total))
            .ok_or_else(|| AppError::BadRequest("Order total is too large".into()))?;
        priced.push((*product_id, *quantity, product.price));
    }

    let order_id = Uuid::new_v4();
    let session_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        payment_status: Set(PaymentStatus::Unpaid.as_str().to_string()),
        payment_session_id: Set(session_id),
        invoice_number: Set(build_invoice_number(order_id)),
        shipping_address: Set(to_json(&snapshot)?),
        paid_at: Set(None),
        shipped_at: Set(None),
        delivered_at: Set(None),
        deleted_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for (product_id, quantity, unit_price) in priced {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(quantity))
            .filter(ProdCol::Id.eq(product_id))
            .exec(&txn)
            .await?;
    }

    append_tracking(&txn, order.id, OrderStatus::Pending, None).await?;
    let details = load_order_details(&txn, order).await?;

    txn.commit().await?;

    tracing::info!(order_id = %order_id, total_amount, "checkout created order");
    audit::record(
        state,
        user.user_id,
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout success",
        CheckoutSession {
            session_id,
            redirect_url: payment_redirect(&state.payment_redirect_url, session_id),
            order: details,
        },
        Some(Meta::empty()),
    ))
}

/// Confirms payment for the order behind `session_id` once the shopper comes
/// back from the payment provider.
pub async fn verify_payment(
    state: &AppState,
    user: &AuthUser,
    payload: VerifyPaymentRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::PaymentSessionId.eq(payload.session_id))
                .add(OrderCol::DeletedAt.is_null()),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.payment_status.parse::<PaymentStatus>()? == PaymentStatus::Paid {
        return Err(AppError::BadRequest("Order already paid".into()));
    }
    if order.status.parse::<OrderStatus>()? == OrderStatus::Cancelled {
        return Err(AppError::Conflict("Order was cancelled".into()));
    }

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.payment_status = Set(PaymentStatus::Paid.as_str().to_string());
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;
    let order_id = order.id;
    let details = load_order_details(&txn, order).await?;

    txn.commit().await?;

    audit::record(
        state,
        user.user_id,
        "order_paid",
        "orders",
        serde_json::json!({ "order_id": order_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment recorded",
        details,
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::DeletedAt.is_null()),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "OK",
        load_order_details(&state.orm, order).await?,
        Some(Meta::empty()),
    ))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = transition_order(
        state,
        user,
        id,
        Some(user.user_id),
        OrderStatus::Cancelled,
        None,
        None,
    )
    .await?;

    Ok(ApiResponse::success("Order cancelled", order, Some(Meta::empty())))
}

pub async fn load_order_details<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(conn)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    let tracking = OrderTracking::find()
        .filter(TrackingCol::OrderId.eq(order.id))
        .order_by_asc(TrackingCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(tracking_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(OrderWithItems {
        order: order_from_entity(order)?,
        items,
        tracking,
    })
}

fn payment_redirect(base: &str, session_id: Uuid) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}session_id={session_id}")
}

fn build_invoice_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.simple().to_string();
    format!("INV-{}-{}", date, &suffix[..8])
}
