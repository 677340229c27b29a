use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderWithLines, PlaceOrderRequest},
    error::AppResult,
    middleware::{session::CartSession, store::ActiveStore},
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(get_order))
}

#[utoipa::path(
    post,
    path = "/api/checkout",
    params(
        ("store" = Option<String>, Query, description = "Store slug, default demo"),
        ("x-cart-session" = Option<String>, Header, description = "Cart session id")
    ),
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Place an order from the session cart", body = ApiResponse<OrderWithLines>),
        (status = 400, description = "Empty cart or missing customer info"),
        (status = 409, description = "Insufficient stock"),
    ),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    ActiveStore(store): ActiveStore,
    session: CartSession,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    let resp = order_service::place_order(&state, &store, session, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("store" = Option<String>, Query, description = "Store slug, default demo"),
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order confirmation with line snapshots", body = ApiResponse<OrderWithLines>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    ActiveStore(store): ActiveStore,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    let resp = order_service::get_order(&state, &store, id).await?;
    Ok(Json(resp))
}
