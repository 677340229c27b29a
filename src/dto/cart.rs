use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cart::CartView;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

/// Cart responses always carry the session id so first-time visitors learn
/// the id the server minted for them.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub session_id: Uuid,
    pub cart: CartView,
}
