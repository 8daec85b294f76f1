//! Entity → API model conversions. Status columns are stored as text and parsed
//! here so a corrupt row surfaces as a 500 instead of a silently wrong status.

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    entity::{
        order_items::Model as OrderItemModel, order_tracking::Model as TrackingModel,
        orders::Model as OrderModel, products::Model as ProductModel,
        return_requests::Model as ReturnModel, shipping_addresses::Model as AddressModel,
        users::Model as UserModel,
    },
    error::{AppError, AppResult},
    models::{
        Order, OrderItem, Product, ReturnRequest, ShippingAddress, TrackingEvent, User,
    },
};

pub fn from_json<T: DeserializeOwned>(value: serde_json::Value, column: &str) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("malformed {column} column: {e}")))
}

pub fn to_json<T: Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}

pub fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        email: model.email,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        stock: model.stock,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        total_amount: model.total_amount,
        status: model.status.parse()?,
        payment_status: model.payment_status.parse()?,
        invoice_number: model.invoice_number,
        shipping_address: from_json(model.shipping_address, "shipping_address")?,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        shipped_at: model.shipped_at.map(|dt| dt.with_timezone(&Utc)),
        delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn orders_from_entities(models: Vec<OrderModel>) -> AppResult<Vec<Order>> {
    models.into_iter().map(order_from_entity).collect()
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn tracking_from_entity(model: TrackingModel) -> AppResult<TrackingEvent> {
    Ok(TrackingEvent {
        status: model.status.parse()?,
        location: model.location,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

pub fn return_from_entity(model: ReturnModel) -> AppResult<ReturnRequest> {
    Ok(ReturnRequest {
        id: model.id,
        order_id: model.order_id,
        user_id: model.user_id,
        items: from_json(model.items, "items")?,
        reason: model.reason,
        comment: model.comment,
        status: model.status.parse()?,
        refund_status: model.refund_status.parse()?,
        refund_amount: model.refund_amount,
        pickup_address: from_json(model.pickup_address, "pickup_address")?,
        requested_at: model.requested_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn returns_from_entities(models: Vec<ReturnModel>) -> AppResult<Vec<ReturnRequest>> {
    models.into_iter().map(return_from_entity).collect()
}

pub fn address_from_entity(model: AddressModel) -> AppResult<ShippingAddress> {
    Ok(ShippingAddress {
        id: model.id,
        user_id: model.user_id,
        full_name: model.full_name,
        phone_number: model.phone_number,
        address_line: model.address_line,
        city: model.city,
        state: model.state,
        postal_code: model.postal_code,
        country: model.country,
        address_type: model.address_type.parse()?,
        is_default: model.is_default,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
