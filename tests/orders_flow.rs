use storefront_api::{
    db::{create_pool, orm_from_pool, run_migrations},
    dto::{
        addresses::AddressRequest,
        orders::{CheckoutItem, CheckoutRequest, UpdateOrderStatusRequest, VerifyPaymentRequest},
        returns::{
            CreateReturnRequest, InitiateRefundRequest, ReturnLine, SettleRefundRequest,
            UpdateReturnStatusRequest,
        },
    },
    entity::{products::ActiveModel as ProductActive, users::ActiveModel as UserActive},
    error::AppError,
    lifecycle::{OrderStatus, PaymentStatus, RefundStatus, ReturnAction, ReturnStatus, ReturnWindow},
    middleware::auth::AuthUser,
    services::{address_service, admin_service, order_service, product_service, return_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Full lifecycle: checkout -> pay -> process -> ship -> deliver -> return -> refund.
#[tokio::test]
async fn checkout_delivery_return_and_refund_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user_id = create_user(&state, "user", "user@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@example.com").await?;
    let auth_user = AuthUser {
        user_id,
        role: "user".into(),
    };
    let auth_admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Test Widget".into()),
        description: Set(Some("A product for testing".into())),
        price: Set(1000),
        stock: Set(10),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    address_service::create_address(
        &state,
        &auth_user,
        AddressRequest {
            full_name: "Test User".into(),
            phone_number: "555-0100".into(),
            address_line: "1 Main Street".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            postal_code: "62701".into(),
            country: "US".into(),
            address_type: None,
            is_default: false,
        },
    )
    .await?;

    let session = order_service::checkout(
        &state,
        &auth_user,
        CheckoutRequest {
            items: vec![CheckoutItem {
                product_id: product.id,
                quantity: 2,
            }],
            address_id: None,
        },
    )
    .await?
    .data
    .expect("checkout session");
    let order = session.order.order;
    assert_eq!(order.total_amount, 2000);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    assert!(session.redirect_url.contains(&session.session_id.to_string()));

    // Duplicate lines that would overflow a 32-bit quantity are refused and
    // leave stock untouched.
    let oversized = order_service::checkout(
        &state,
        &auth_user,
        CheckoutRequest {
            items: [i32::MAX, i32::MAX, 3]
                .into_iter()
                .map(|quantity| CheckoutItem {
                    product_id: product.id,
                    quantity,
                })
                .collect(),
            address_id: None,
        },
    )
    .await;
    assert!(matches!(oversized, Err(AppError::BadRequest(_))));
    let listed = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(listed.stock, 8);

    let paid = order_service::verify_payment(
        &state,
        &auth_user,
        VerifyPaymentRequest {
            session_id: session.session_id,
        },
    )
    .await?
    .data
    .expect("paid order");
    assert_eq!(paid.order.payment_status, PaymentStatus::Paid);

    let again = order_service::verify_payment(
        &state,
        &auth_user,
        VerifyPaymentRequest {
            session_id: session.session_id,
        },
    )
    .await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    // Stale expected status is refused before anything changes.
    let stale = admin_service::update_order_status(
        &state,
        &auth_admin,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Shipped,
            expected_status: Some(OrderStatus::Processing),
            location: None,
        },
    )
    .await;
    assert!(matches!(stale, Err(AppError::Conflict(_))));

    for (from, to) in [
        (OrderStatus::Pending, OrderStatus::Processing),
        (OrderStatus::Processing, OrderStatus::Shipped),
        (OrderStatus::Shipped, OrderStatus::Delivered),
    ] {
        let updated = admin_service::update_order_status(
            &state,
            &auth_admin,
            order.id,
            UpdateOrderStatusRequest {
                status: to,
                expected_status: Some(from),
                location: Some("Warehouse".into()),
            },
        )
        .await?
        .data
        .expect("updated order");
        assert_eq!(updated.status, to);
    }

    let details = order_service::get_order(&state, &auth_user, order.id)
        .await?
        .data
        .expect("order details");
    assert!(details.order.shipped_at.is_some());
    assert!(details.order.delivered_at.is_some());
    let tracked: Vec<OrderStatus> = details.tracking.iter().map(|event| event.status).collect();
    assert_eq!(
        tracked,
        vec![
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered
        ]
    );

    // Delivered is terminal.
    let cancel = order_service::cancel_order(&state, &auth_user, order.id).await;
    assert!(matches!(cancel, Err(AppError::Conflict(_))));

    let return_lines = |quantities: &[i32]| CreateReturnRequest {
        order_id: order.id,
        items: quantities
            .iter()
            .map(|quantity| ReturnLine {
                product_id: product.id,
                quantity: *quantity,
            })
            .collect(),
        reason: "Damaged on arrival".into(),
        comment: None,
        pickup_address_id: None,
    };
    let overflowing =
        return_service::create_return(&state, &auth_user, return_lines(&[i32::MAX, i32::MAX, 3]))
            .await;
    assert!(matches!(overflowing, Err(AppError::BadRequest(_))));
    // Merged duplicates are checked against the ordered quantity of 2.
    let too_many =
        return_service::create_return(&state, &auth_user, return_lines(&[1, 1, 1])).await;
    assert!(matches!(too_many, Err(AppError::BadRequest(_))));

    let created = return_service::create_return(
        &state,
        &auth_user,
        CreateReturnRequest {
            order_id: order.id,
            items: vec![ReturnLine {
                product_id: product.id,
                quantity: 1,
            }],
            reason: "Damaged on arrival".into(),
            comment: None,
            pickup_address_id: None,
        },
    )
    .await?
    .data
    .expect("return request");
    assert_eq!(created.status, ReturnStatus::Requested);
    assert_eq!(created.refund_status, RefundStatus::Pending);
    assert_eq!(created.refund_amount, 1000);

    let duplicate = return_service::create_return(
        &state,
        &auth_user,
        CreateReturnRequest {
            order_id: order.id,
            items: vec![ReturnLine {
                product_id: product.id,
                quantity: 1,
            }],
            reason: "Changed my mind".into(),
            comment: None,
            pickup_address_id: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    for (from, action) in [
        (ReturnStatus::Requested, ReturnAction::Approve),
        (ReturnStatus::Approved, ReturnAction::MarkPicked),
    ] {
        admin_service::update_return_status(
            &state,
            &auth_admin,
            created.id,
            UpdateReturnStatusRequest {
                action,
                expected_status: Some(from),
                expected_refund_status: Some(RefundStatus::Pending),
            },
        )
        .await?;
    }

    let initiated = admin_service::initiate_refund(
        &state,
        &auth_admin,
        created.id,
        InitiateRefundRequest {
            expected_status: Some(ReturnStatus::Picked),
            expected_refund_status: Some(RefundStatus::Pending),
        },
    )
    .await?
    .data
    .expect("initiated refund");
    assert_eq!(initiated.refund_status, RefundStatus::Initiated);

    // Another admin already started the refund.
    let stale_refund = admin_service::initiate_refund(
        &state,
        &auth_admin,
        created.id,
        InitiateRefundRequest {
            expected_status: Some(ReturnStatus::Picked),
            expected_refund_status: Some(RefundStatus::Pending),
        },
    )
    .await;
    match stale_refund {
        Err(AppError::Conflict(message)) => assert_eq!(
            message,
            "refund status changed from `pending` to `initiated`"
        ),
        other => panic!("expected conflict, got {other:?}"),
    }

    let in_progress = admin_service::initiate_refund(
        &state,
        &auth_admin,
        created.id,
        InitiateRefundRequest::default(),
    )
    .await;
    assert!(matches!(in_progress, Err(AppError::Conflict(_))));

    let settled = admin_service::settle_refund(
        &state,
        &auth_admin,
        created.id,
        SettleRefundRequest { succeeded: true },
    )
    .await?
    .data
    .expect("settled refund");
    assert_eq!(settled.status, ReturnStatus::Refunded);
    assert_eq!(settled.refund_status, RefundStatus::Succeeded);

    // Non-admins never reach the admin services.
    let forbidden = admin_service::get_return_admin(&state, &auth_user, created.id).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    Ok(())
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    let orm = orm_from_pool(&pool);

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE return_requests, order_tracking, order_items, orders, shipping_addresses, audit_logs, products, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(Some(AppState {
        pool,
        orm,
        return_window: ReturnWindow::default(),
        payment_redirect_url: "https://payments.test/checkout".into(),
    }))
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}
