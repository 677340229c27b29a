use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, put},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartResponse, UpdateCartItemRequest},
    error::AppResult,
    middleware::{session::CartSession, store::ActiveStore},
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_cart))
        .route("/items", axum::routing::post(add_to_cart))
        .route("/items/{product_id}", put(update_cart_item))
        .route("/items/{product_id}", delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(
        ("store" = Option<String>, Query, description = "Store slug, default demo"),
        ("x-cart-session" = Option<String>, Header, description = "Cart session id")
    ),
    responses(
        (status = 200, description = "Cart view for the session", body = ApiResponse<CartResponse>)
    ),
    tag = "Cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    ActiveStore(store): ActiveStore,
    session: CartSession,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let resp = cart_service::view(&state, &store, session).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    params(
        ("store" = Option<String>, Query, description = "Store slug, default demo"),
        ("x-cart-session" = Option<String>, Header, description = "Cart session id")
    ),
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add a product to the cart", body = ApiResponse<CartResponse>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Insufficient stock"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    ActiveStore(store): ActiveStore,
    session: CartSession,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let resp = cart_service::add_item(&state, &store, session, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart/items/{product_id}",
    params(
        ("store" = Option<String>, Query, description = "Store slug, default demo"),
        ("x-cart-session" = Option<String>, Header, description = "Cart session id"),
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Set a line's quantity; zero or less removes it", body = ApiResponse<CartResponse>),
    ),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    ActiveStore(store): ActiveStore,
    session: CartSession,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let resp = cart_service::update_item(&state, &store, session, product_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{product_id}",
    params(
        ("store" = Option<String>, Query, description = "Store slug, default demo"),
        ("x-cart-session" = Option<String>, Header, description = "Cart session id"),
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Remove a line; absent ids are ignored", body = ApiResponse<CartResponse>),
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    ActiveStore(store): ActiveStore,
    session: CartSession,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let resp = cart_service::remove_item(&state, &store, session, product_id).await?;
    Ok(Json(resp))
}
