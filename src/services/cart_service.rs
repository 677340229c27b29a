use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    cart::{self, Cart, CartLine, Catalog},
    db::DbPool,
    dto::cart::{AddToCartRequest, CartResponse, UpdateCartItemRequest},
    error::AppResult,
    middleware::session::CartSession,
    models::{Product, Store},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct CartRow {
    product_id: Uuid,
    quantity: i32,
}

async fn load_cart(pool: &DbPool, store_id: Uuid, session_id: Uuid) -> AppResult<Cart> {
    let rows = sqlx::query_as::<_, CartRow>(
        r#"
        SELECT product_id, quantity
        FROM cart_items
        WHERE store_id = $1 AND session_id = $2
        ORDER BY position
        "#,
    )
    .bind(store_id)
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(Cart::from_lines(
        rows.into_iter()
            .map(|row| CartLine {
                product_id: row.product_id,
                quantity: row.quantity,
            })
            .collect(),
    ))
}

/// Rewrite the session's stored lines from the in-memory cart, keeping
/// their order in the position column.
async fn save_cart(pool: &DbPool, store_id: Uuid, session_id: Uuid, cart: &Cart) -> AppResult<()> {
    let mut txn = pool.begin().await?;
    sqlx::query("DELETE FROM cart_items WHERE store_id = $1 AND session_id = $2")
        .bind(store_id)
        .bind(session_id)
        .execute(&mut *txn)
        .await?;

    for (position, line) in cart.lines().iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, store_id, session_id, product_id, quantity, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(store_id)
        .bind(session_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(position as i32)
        .execute(&mut *txn)
        .await?;
    }

    txn.commit().await?;
    Ok(())
}

/// Fetch the slice of the store's catalog that the cart references.
async fn load_catalog(pool: &DbPool, store_id: Uuid, cart: &Cart) -> AppResult<Catalog> {
    let ids: Vec<Uuid> = cart.lines().iter().map(|line| line.product_id).collect();
    if ids.is_empty() {
        return Ok(Catalog::default());
    }
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE store_id = $1 AND id = ANY($2)",
    )
    .bind(store_id)
    .bind(&ids)
    .fetch_all(pool)
    .await?;
    Ok(Catalog::new(products))
}

async fn respond(
    pool: &DbPool,
    store_id: Uuid,
    session: CartSession,
    cart: &Cart,
    message: &str,
) -> AppResult<ApiResponse<CartResponse>> {
    let catalog = load_catalog(pool, store_id, cart).await?;
    let view = cart::cart_view(cart, &catalog);
    Ok(ApiResponse::success(
        message,
        CartResponse {
            session_id: session.id,
            cart: view,
        },
        Some(Meta::empty()),
    ))
}

pub async fn view(
    state: &AppState,
    store: &Store,
    session: CartSession,
) -> AppResult<ApiResponse<CartResponse>> {
    let cart = load_cart(&state.pool, store.id, session.id).await?;
    respond(&state.pool, store.id, session, &cart, "OK").await
}

pub async fn add_item(
    state: &AppState,
    store: &Store,
    session: CartSession,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartResponse>> {
    let mut cart = load_cart(&state.pool, store.id, session.id).await?;

    let product = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE store_id = $1 AND id = $2",
    )
    .bind(store.id)
    .bind(payload.product_id)
    .fetch_optional(&state.pool)
    .await?;
    let catalog = Catalog::new(product);

    cart::add_item(&mut cart, &catalog, payload.product_id, payload.quantity)?;
    save_cart(&state.pool, store.id, session.id, &cart).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(store.id),
        None,
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({
            "session_id": session.id,
            "product_id": payload.product_id,
            "quantity": payload.quantity,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    respond(&state.pool, store.id, session, &cart, "Added to cart").await
}

pub async fn update_item(
    state: &AppState,
    store: &Store,
    session: CartSession,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartResponse>> {
    let mut cart = load_cart(&state.pool, store.id, session.id).await?;
    cart::update_item(&mut cart, product_id, payload.quantity);
    save_cart(&state.pool, store.id, session.id, &cart).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(store.id),
        None,
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({
            "session_id": session.id,
            "product_id": product_id,
            "quantity": payload.quantity,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    respond(&state.pool, store.id, session, &cart, "Cart updated").await
}

pub async fn remove_item(
    state: &AppState,
    store: &Store,
    session: CartSession,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartResponse>> {
    let mut cart = load_cart(&state.pool, store.id, session.id).await?;
    cart::remove_item(&mut cart, product_id);
    save_cart(&state.pool, store.id, session.id, &cart).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(store.id),
        None,
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({
            "session_id": session.id,
            "product_id": product_id,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    respond(&state.pool, store.id, session, &cart, "Removed from cart").await
}
