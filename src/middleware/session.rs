use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

pub const SESSION_HEADER: &str = "x-cart-session";

/// Identifies the visitor's cart. Read from the `x-cart-session` header; a
/// missing or malformed value gets a fresh id, which cart responses echo
/// back so the client can hold on to it.
#[derive(Debug, Clone, Copy)]
pub struct CartSession {
    pub id: Uuid,
}

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .unwrap_or_else(Uuid::new_v4);
        Ok(CartSession { id })
    }
}
