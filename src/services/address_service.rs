use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait,
    EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, LockType},
    QuerySelect,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::addresses::{AddressList, AddressRequest},
    entity::shipping_addresses::{
        ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses,
        Model as AddressModel,
    },
    error::{AppError, AppResult},
    lifecycle::AddressType,
    middleware::auth::AuthUser,
    models::ShippingAddress,
    response::{ApiResponse, Meta},
    services::mapping::address_from_entity,
    state::AppState,
};

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .order_by_desc(AddressCol::IsDefault)
        .order_by_desc(AddressCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(address_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Addresses",
        AddressList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: AddressRequest,
) -> AppResult<ApiResponse<ShippingAddress>> {
    validate(&payload)?;
    let txn = state.orm.begin().await?;

    let existing = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    // The first address a user saves is their default.
    let is_default = payload.is_default || existing.is_empty();
    if is_default {
        clear_default(&txn, user.user_id).await?;
    }

    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        full_name: Set(payload.full_name.trim().to_string()),
        phone_number: Set(payload.phone_number.trim().to_string()),
        address_line: Set(payload.address_line.trim().to_string()),
        city: Set(payload.city.trim().to_string()),
        state: Set(payload.state.trim().to_string()),
        postal_code: Set(payload.postal_code.trim().to_string()),
        country: Set(payload.country.trim().to_string()),
        address_type: Set(payload
            .address_type
            .unwrap_or(AddressType::Home)
            .as_str()
            .to_string()),
        is_default: Set(is_default),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    audit::record(
        state,
        user.user_id,
        "address_create",
        "shipping_addresses",
        serde_json::json!({ "address_id": address.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address created",
        address_from_entity(address)?,
        Some(Meta::empty()),
    ))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AddressRequest,
) -> AppResult<ApiResponse<ShippingAddress>> {
    validate(&payload)?;
    let txn = state.orm.begin().await?;

    let existing = find_own_locked(&txn, user.user_id, id).await?;
    let was_default = existing.is_default;
    if payload.is_default && !was_default {
        clear_default(&txn, user.user_id).await?;
    }

    let mut active: AddressActive = existing.into();
    active.full_name = Set(payload.full_name.trim().to_string());
    active.phone_number = Set(payload.phone_number.trim().to_string());
    active.address_line = Set(payload.address_line.trim().to_string());
    active.city = Set(payload.city.trim().to_string());
    active.state = Set(payload.state.trim().to_string());
    active.postal_code = Set(payload.postal_code.trim().to_string());
    active.country = Set(payload.country.trim().to_string());
    if let Some(address_type) = payload.address_type {
        active.address_type = Set(address_type.as_str().to_string());
    }
    // A default can only move by choosing another address, never by unsetting it.
    active.is_default = Set(was_default || payload.is_default);
    let address = active.update(&txn).await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Address updated",
        address_from_entity(address)?,
        Some(Meta::empty()),
    ))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let existing = find_own_locked(&txn, user.user_id, id).await?;
    let was_default = existing.is_default;
    existing.delete(&txn).await?;

    if was_default {
        let successor = Addresses::find()
            .filter(AddressCol::UserId.eq(user.user_id))
            .order_by_desc(AddressCol::CreatedAt)
            .one(&txn)
            .await?;
        if let Some(successor) = successor {
            let mut active: AddressActive = successor.into();
            active.is_default = Set(true);
            active.update(&txn).await?;
        }
    }

    txn.commit().await?;

    audit::record(
        state,
        user.user_id,
        "address_delete",
        "shipping_addresses",
        serde_json::json!({ "address_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

pub async fn set_default_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ShippingAddress>> {
    let txn = state.orm.begin().await?;

    let existing = find_own_locked(&txn, user.user_id, id).await?;
    clear_default(&txn, user.user_id).await?;

    let mut active: AddressActive = existing.into();
    active.is_default = Set(true);
    let address = active.update(&txn).await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Default address updated",
        address_from_entity(address)?,
        Some(Meta::empty()),
    ))
}

/// The address with `id` if given (must belong to the user), otherwise the
/// user's default.
pub async fn resolve_address<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    id: Option<Uuid>,
) -> AppResult<ShippingAddress> {
    let mut condition = Condition::all().add(AddressCol::UserId.eq(user_id));
    condition = match id {
        Some(id) => condition.add(AddressCol::Id.eq(id)),
        None => condition.add(AddressCol::IsDefault.eq(true)),
    };

    let address = Addresses::find().filter(condition).one(conn).await?;
    match (address, id) {
        (Some(address), _) => address_from_entity(address),
        (None, Some(_)) => Err(AppError::NotFound),
        (None, None) => Err(AppError::BadRequest(
            "No shipping address given and no default address saved".into(),
        )),
    }
}

fn validate(payload: &AddressRequest) -> AppResult<()> {
    match payload.missing_field() {
        Some(field) => Err(AppError::BadRequest(format!("{field} is required"))),
        None => Ok(()),
    }
}

async fn find_own_locked<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    id: Uuid,
) -> AppResult<AddressModel> {
    Addresses::find()
        .filter(
            Condition::all()
                .add(AddressCol::UserId.eq(user_id))
                .add(AddressCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

async fn clear_default<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<()> {
    Addresses::update_many()
        .col_expr(AddressCol::IsDefault, Expr::value(false))
        .filter(
            Condition::all()
                .add(AddressCol::UserId.eq(user_id))
                .add(AddressCol::IsDefault.eq(true)),
        )
        .exec(conn)
        .await?;
    Ok(())
}
