use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::Utc;
use storefront_api::{
    client::{HttpBackend, LifecycleBackend, LifecycleError},
    dto::orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
    lifecycle::{OrderStatus, PaymentStatus, RefundStatus, ReturnAction, ReturnStatus},
    models::{AddressSnapshot, Order},
    response::{ApiResponse, ErrorData, Meta},
    routes::params::OrderListQuery,
};
use uuid::Uuid;

const TOKEN: &str = "test-token";

fn sample_order(id: Uuid, status: OrderStatus) -> Order {
    let now = Utc::now();
    Order {
        id,
        user_id: Uuid::new_v4(),
        total_amount: 2000,
        status,
        payment_status: PaymentStatus::Paid,
        invoice_number: "INV-1".into(),
        shipping_address: AddressSnapshot {
            full_name: "Test User".into(),
            phone_number: "555-0100".into(),
            address_line: "1 Main Street".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            postal_code: "62701".into(),
            country: "US".into(),
        },
        paid_at: Some(now),
        shipped_at: None,
        delivered_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn error(status: StatusCode, message: &str, detail: &str) -> Response {
    let body = ApiResponse {
        message: message.to_string(),
        data: Some(ErrorData {
            error: detail.to_string(),
        }),
        meta: Some(Meta::empty()),
    };
    (status, Json(body)).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {TOKEN}"))
}

async fn list_orders(
    headers: HeaderMap,
    State(id): State<Uuid>,
    Query(query): Query<OrderListQuery>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized", "Missing token");
    }
    let items = match query.status {
        Some(OrderStatus::Pending) | None => vec![sample_order(id, OrderStatus::Pending)],
        Some(_) => Vec::new(),
    };
    let total = items.len() as i64;
    Json(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::new(query.page.unwrap_or(1), query.per_page.unwrap_or(20), total)),
    ))
    .into_response()
}

async fn get_order(headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized", "Missing token");
    }
    Json(ApiResponse::success(
        "Order",
        OrderWithItems {
            order: sample_order(id, OrderStatus::Shipped),
            items: Vec::new(),
            tracking: Vec::new(),
        },
        None,
    ))
    .into_response()
}

async fn update_order_status(
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Response {
    match payload.expected_status {
        Some(OrderStatus::Pending) => Json(ApiResponse::success(
            "Order status updated",
            sample_order(id, payload.status),
            None,
        ))
        .into_response(),
        Some(expected) => error(
            StatusCode::CONFLICT,
            "Conflict",
            &format!("order status changed from `{expected}` to `pending`"),
        ),
        None => error(StatusCode::BAD_REQUEST, "Bad Request", "expected_status missing"),
    }
}

async fn get_return() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Return", "data": { "unexpected": true } })),
    )
        .into_response()
}

async fn initiate_refund() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn update_return_status() -> Response {
    error(StatusCode::FORBIDDEN, "Forbidden", "Forbidden")
}

async fn spawn_stub(id: Uuid) -> String {
    let app = Router::new()
        .route("/api/admin/orders", get(list_orders))
        .route("/api/admin/orders/{id}", get(get_order))
        .route("/api/admin/orders/{id}/status", patch(update_order_status))
        .route("/api/admin/returns/{id}", get(get_return))
        .route("/api/admin/returns/{id}/status", patch(update_return_status))
        .route("/api/admin/returns/{id}/refund", post(initiate_refund))
        .with_state(id);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn decodes_list_envelope_with_meta() {
    let id = Uuid::new_v4();
    let backend = HttpBackend::new(spawn_stub(id).await).with_token(TOKEN);

    let page = backend
        .list_orders(&OrderListQuery {
            page: Some(2),
            per_page: Some(5),
            status: Some(OrderStatus::Pending),
            sort_order: None,
        })
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, id);
    assert_eq!(page.meta, Meta::new(2, 5, 1));
}

#[tokio::test]
async fn status_filter_is_sent_as_query() {
    let backend = HttpBackend::new(spawn_stub(Uuid::new_v4()).await).with_token(TOKEN);

    let page = backend
        .list_orders(&OrderListQuery {
            status: Some(OrderStatus::Cancelled),
            ..OrderListQuery::default()
        })
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.meta.total, Some(0));
}

#[tokio::test]
async fn fetch_order_unwraps_details() {
    let id = Uuid::new_v4();
    let backend = HttpBackend::new(spawn_stub(id).await).with_token(TOKEN);

    let order = backend.fetch_order(id).await.unwrap();
    assert_eq!(order.id, id);
    assert_eq!(order.status, OrderStatus::Shipped);
}

#[tokio::test]
async fn missing_token_maps_to_auth() {
    let id = Uuid::new_v4();
    let backend = HttpBackend::new(spawn_stub(id).await);

    let err = backend.fetch_order(id).await.unwrap_err();
    assert_eq!(err, LifecycleError::Auth("Missing token".into()));
}

#[tokio::test]
async fn forbidden_maps_to_auth() {
    let id = Uuid::new_v4();
    let backend = HttpBackend::new(spawn_stub(id).await).with_token(TOKEN);

    let err = backend
        .update_return_status(
            id,
            ReturnStatus::Requested,
            RefundStatus::Pending,
            ReturnAction::Approve,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Auth(_)));
}

#[tokio::test]
async fn update_sends_expected_status() {
    let id = Uuid::new_v4();
    let backend = HttpBackend::new(format!("{}/", spawn_stub(id).await)).with_token(TOKEN);

    let order = backend
        .update_order_status(id, OrderStatus::Pending, OrderStatus::Processing)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
}

#[tokio::test]
async fn conflict_message_is_passed_through_verbatim() {
    let id = Uuid::new_v4();
    let backend = HttpBackend::new(spawn_stub(id).await).with_token(TOKEN);

    let err = backend
        .update_order_status(id, OrderStatus::Processing, OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LifecycleError::Conflict("order status changed from `processing` to `pending`".into())
    );
}

#[tokio::test]
async fn unexpected_payload_is_a_decode_error() {
    let id = Uuid::new_v4();
    let backend = HttpBackend::new(spawn_stub(id).await).with_token(TOKEN);

    let err = backend.fetch_return(id).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Decode(_)));
}

#[tokio::test]
async fn plain_text_server_error_maps_to_api() {
    let id = Uuid::new_v4();
    let backend = HttpBackend::new(spawn_stub(id).await).with_token(TOKEN);

    let err = backend
        .initiate_refund(id, ReturnStatus::Picked, RefundStatus::Pending)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LifecycleError::Api {
            status: 500,
            message: "boom".into(),
        }
    );
}

#[tokio::test]
async fn closed_port_maps_to_network() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(format!("http://{addr}"));
    let err = backend.fetch_order(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Network(_)));
}
