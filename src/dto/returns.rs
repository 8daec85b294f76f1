use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    lifecycle::{RefundStatus, ReturnAction, ReturnStatus},
    models::ReturnRequest,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReturnLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateReturnRequest {
    pub order_id: Uuid,
    pub items: Vec<ReturnLine>,
    pub reason: String,
    pub comment: Option<String>,
    /// Defaults to the order's shipping address.
    pub pickup_address_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReturnList {
    pub items: Vec<ReturnRequest>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateReturnStatusRequest {
    pub action: ReturnAction,
    pub expected_status: Option<ReturnStatus>,
    /// Refund status the caller last saw; a mismatch is a 409.
    pub expected_refund_status: Option<RefundStatus>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct InitiateRefundRequest {
    pub expected_status: Option<ReturnStatus>,
    pub expected_refund_status: Option<RefundStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettleRefundRequest {
    pub succeeded: bool,
}
