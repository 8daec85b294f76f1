use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressList, AddressRequest},
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        orders::{
            CheckoutItem, CheckoutRequest, CheckoutSession, OrderList, OrderWithItems,
            UpdateOrderStatusRequest, VerifyPaymentRequest,
        },
        products::ProductList,
        returns::{
            CreateReturnRequest, InitiateRefundRequest, ReturnLine, ReturnList,
            SettleRefundRequest, UpdateReturnStatusRequest,
        },
    },
    lifecycle::{
        AddressType, OrderStatus, PaymentStatus, RefundStatus, ReturnAction, ReturnStatus,
    },
    models::{
        AddressSnapshot, Order, OrderItem, Product, ReturnItem, ReturnRequest, ShippingAddress,
        TrackingEvent, User,
    },
    response::{ApiResponse, ErrorData, Meta},
    routes::{addresses, admin, auth, health, orders, params, products, returns},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        products::list_products,
        products::get_product,
        addresses::list_addresses,
        addresses::create_address,
        addresses::update_address,
        addresses::delete_address,
        addresses::set_default_address,
        orders::list_orders,
        orders::checkout,
        orders::verify_payment,
        orders::get_order,
        orders::cancel_order,
        returns::list_returns,
        returns::create_return,
        returns::get_return,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::delete_order,
        admin::list_all_returns,
        admin::get_return_admin,
        admin::update_return_status,
        admin::initiate_refund,
        admin::settle_refund
    ),
    components(
        schemas(
            User,
            Product,
            ShippingAddress,
            AddressSnapshot,
            Order,
            OrderItem,
            TrackingEvent,
            ReturnItem,
            ReturnRequest,
            OrderStatus,
            ReturnStatus,
            RefundStatus,
            PaymentStatus,
            AddressType,
            ReturnAction,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddressRequest,
            AddressList,
            CheckoutItem,
            CheckoutRequest,
            CheckoutSession,
            VerifyPaymentRequest,
            OrderList,
            OrderWithItems,
            UpdateOrderStatusRequest,
            CreateReturnRequest,
            ReturnLine,
            ReturnList,
            UpdateReturnStatusRequest,
            InitiateRefundRequest,
            SettleRefundRequest,
            ProductList,
            params::SortOrder,
            ErrorData,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<ReturnRequest>,
            ApiResponse<ReturnList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Read-only catalog"),
        (name = "Addresses", description = "Shipping address book"),
        (name = "Orders", description = "Checkout, payment verification and order history"),
        (name = "Returns", description = "Return requests"),
        (name = "Admin", description = "Order and return lifecycle management"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
