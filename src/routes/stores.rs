use axum::{Json, Router, routing::get};

use crate::{
    error::AppResult,
    middleware::store::ActiveStore,
    models::Store,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(store_info))
}

#[utoipa::path(
    get,
    path = "/api/store",
    params(
        ("store" = Option<String>, Query, description = "Store slug, default demo")
    ),
    responses(
        (status = 200, description = "Active store info", body = ApiResponse<Store>),
        (status = 404, description = "Unknown store"),
    ),
    tag = "Store"
)]
pub async fn store_info(ActiveStore(store): ActiveStore) -> AppResult<Json<ApiResponse<Store>>> {
    Ok(Json(ApiResponse::success("Store", store, Some(Meta::empty()))))
}
