use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
        returns::{InitiateRefundRequest, ReturnList, SettleRefundRequest, UpdateReturnStatusRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, ReturnRequest},
    response::ApiResponse,
    routes::params::{OrderListQuery, ReturnListQuery},
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}", get(get_order_admin).delete(delete_order))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/returns", get(list_all_returns))
        .route("/returns/{id}", get(get_return_admin))
        .route("/returns/{id}/status", patch(update_return_status))
        .route("/returns/{id}/refund", post(initiate_refund))
        .route("/returns/{id}/refund/settle", post(settle_refund))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(OrderListQuery),
    responses(
    (status = 200, description = "Get all orders (admin only)", body = ApiResponse<OrderList>),
    (status = 403, description = "Forbidden"),
    (status = 500, description = "Internal Server Error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(
    (
        "id" = Uuid, Path, description = "Order ID")
    ),
    responses(
    (status = 200, description = "Get any order with items (admin only)", body = ApiResponse<OrderWithItems>),
    (status = 404, description = "Not Found", ),
    (status = 403, description = "Forbidden", ),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"

)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = admin_service::get_order_admin(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(
    (
        "id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Update order status", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Transition not allowed or status changed concurrently"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Soft-delete an order"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = admin_service::delete_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/returns",
    params(ReturnListQuery),
    responses(
        (status = 200, description = "Get all return requests (admin only)", body = ApiResponse<ReturnList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_returns(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReturnListQuery>,
) -> AppResult<Json<ApiResponse<ReturnList>>> {
    let resp = admin_service::list_all_returns(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/returns/{id}",
    params(("id" = Uuid, Path, description = "Return request ID")),
    responses(
        (status = 200, description = "Get any return request", body = ApiResponse<ReturnRequest>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_return_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReturnRequest>>> {
    let resp = admin_service::get_return_admin(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/returns/{id}/status",
    params(("id" = Uuid, Path, description = "Return request ID")),
    request_body = UpdateReturnStatusRequest,
    responses(
        (status = 200, description = "Approve, reject or mark a return as picked", body = ApiResponse<ReturnRequest>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Transition not allowed or status changed concurrently"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_return_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReturnStatusRequest>,
) -> AppResult<Json<ApiResponse<ReturnRequest>>> {
    let resp = admin_service::update_return_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/returns/{id}/refund",
    params(("id" = Uuid, Path, description = "Return request ID")),
    request_body = InitiateRefundRequest,
    responses(
        (status = 200, description = "Initiate the refund of a picked return", body = ApiResponse<ReturnRequest>),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Refund not allowed in the current state"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn initiate_refund(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<InitiateRefundRequest>,
) -> AppResult<Json<ApiResponse<ReturnRequest>>> {
    let resp = admin_service::initiate_refund(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/returns/{id}/refund/settle",
    params(("id" = Uuid, Path, description = "Return request ID")),
    request_body = SettleRefundRequest,
    responses(
        (status = 200, description = "Record the outcome of an initiated refund", body = ApiResponse<ReturnRequest>),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "No refund in progress"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn settle_refund(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SettleRefundRequest>,
) -> AppResult<Json<ApiResponse<ReturnRequest>>> {
    let resp = admin_service::settle_refund(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
