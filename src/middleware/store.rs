use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;

use crate::{error::AppError, models::Store, state::AppState};

pub const DEFAULT_STORE_SLUG: &str = "demo";

#[derive(Debug, Deserialize)]
struct StoreSelector {
    store: Option<String>,
}

/// The storefront addressed by the request. Resolved once per request from
/// the `store` query parameter and passed explicitly into every service
/// call; an unknown or deactivated slug is a 404 before any handler runs.
#[derive(Debug, Clone)]
pub struct ActiveStore(pub Store);

impl FromRequestParts<AppState> for ActiveStore {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Query(selector) = Query::<StoreSelector>::try_from_uri(&parts.uri)
            .map_err(|_| AppError::Validation("invalid query string".into()))?;
        let slug = selector
            .store
            .unwrap_or_else(|| DEFAULT_STORE_SLUG.to_string());

        let store: Option<Store> =
            sqlx::query_as("SELECT * FROM stores WHERE slug = $1 AND is_active = TRUE")
                .bind(&slug)
                .fetch_optional(&state.pool)
                .await?;

        store.map(ActiveStore).ok_or(AppError::NotFound)
    }
}
