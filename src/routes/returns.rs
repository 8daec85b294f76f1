use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::returns::{CreateReturnRequest, ReturnList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::ReturnRequest,
    response::ApiResponse,
    routes::params::ReturnListQuery,
    services::return_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_returns).post(create_return))
        .route("/{id}", get(get_return))
}

#[utoipa::path(
    get,
    path = "/api/returns",
    params(ReturnListQuery),
    responses(
        (status = 200, description = "List own return requests", body = ApiResponse<ReturnList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Returns"
)]
pub async fn list_returns(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReturnListQuery>,
) -> AppResult<Json<ApiResponse<ReturnList>>> {
    let resp = return_service::list_returns(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/returns",
    request_body = CreateReturnRequest,
    responses(
        (status = 200, description = "Return requested", body = ApiResponse<ReturnRequest>),
        (status = 400, description = "Order not eligible or invalid items"),
        (status = 409, description = "A return already exists for this order")
    ),
    security(("bearer_auth" = [])),
    tag = "Returns"
)]
pub async fn create_return(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateReturnRequest>,
) -> AppResult<Json<ApiResponse<ReturnRequest>>> {
    let resp = return_service::create_return(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/returns/{id}",
    params(("id" = Uuid, Path, description = "Return request ID")),
    responses(
        (status = 200, description = "Get own return request", body = ApiResponse<ReturnRequest>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Returns"
)]
pub async fn get_return(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReturnRequest>>> {
    let resp = return_service::get_return(&state, &user, id).await?;
    Ok(Json(resp))
}
