use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    lifecycle::OrderStatus,
    models::{Order, OrderItem, TrackingEvent},
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    /// Falls back to the caller's default address when absent.
    pub address_id: Option<Uuid>,
}

/// Where to send the shopper to pay, and the session to verify on return.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutSession {
    pub session_id: Uuid,
    pub redirect_url: String,
    pub order: OrderWithItems,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub tracking: Vec<TrackingEvent>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    /// Rejected with 409 when the stored status differs.
    pub expected_status: Option<OrderStatus>,
    pub location: Option<String>,
}
