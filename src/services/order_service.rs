use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    cart::{Cart, CartLine, Catalog},
    checkout::{self, Charges, OrderStatus, PaymentStatus},
    dto::orders::{OrderWithLines, PlaceOrderRequest},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{ActiveModel as OrderLineActive, Column as OrderLineCol, Entity as OrderLines},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::session::CartSession,
    models::{Order, OrderLine, Product, Store},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Turn the session's cart into an order. The cart read, the stock
/// check-and-decrement, the order insert, and the cart clear all commit in
/// one transaction; any failure leaves every row as it was, the stored
/// cart included.
pub async fn place_order(
    state: &AppState,
    store: &Store,
    session: CartSession,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let txn = state.orm.begin().await?;

    let cart_rows = CartItems::find()
        .filter(CartCol::StoreId.eq(store.id))
        .filter(CartCol::SessionId.eq(session.id))
        .order_by_asc(CartCol::Position)
        .all(&txn)
        .await?;
    let cart = Cart::from_lines(
        cart_rows
            .iter()
            .map(|row| CartLine {
                product_id: row.product_id,
                quantity: row.quantity,
            })
            .collect(),
    );

    // Lock the referenced product rows so the stock read-check-decrement
    // cannot race a concurrent checkout of the same products.
    let ids: Vec<Uuid> = cart.lines().iter().map(|line| line.product_id).collect();
    let products = Products::find()
        .filter(ProdCol::StoreId.eq(store.id))
        .filter(ProdCol::Id.is_in(ids))
        .lock(LockType::Update)
        .all(&txn)
        .await?;
    let catalog = Catalog::new(products.into_iter().map(Product::from));

    let charges = Charges {
        shipping_fee: payload.shipping_fee,
        discount_amount: payload.discount_amount,
    };
    let draft = checkout::build_order(&cart, &catalog, &payload.customer, charges, Utc::now())?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        store_id: Set(store.id),
        order_number: Set(draft.order_number.clone()),
        customer_name: Set(payload.customer.customer_name.clone()),
        customer_email: Set(payload.customer.customer_email.clone()),
        customer_phone: Set(payload.customer.customer_phone.clone()),
        customer_address: Set(payload.customer.customer_address.clone()),
        notes: Set(payload.customer.notes.clone()),
        admin_notes: Set(None),
        subtotal: Set(draft.subtotal),
        shipping_fee: Set(draft.shipping_fee),
        discount_amount: Set(draft.discount_amount),
        total_amount: Set(draft.total_amount),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        payment_status: Set(PaymentStatus::Pending.as_str().to_string()),
        confirmed_at: Set(None),
        shipped_at: Set(None),
        delivered_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut lines: Vec<OrderLine> = Vec::with_capacity(draft.lines.len());
    for line in &draft.lines {
        let row = OrderLineActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            product_name: Set(line.product_name.clone()),
            product_price: Set(line.product_price),
            quantity: Set(line.quantity),
            total_price: Set(line.total_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        lines.push(OrderLine::from(row));
    }

    for (product_id, quantity) in &draft.stock_decrements {
        Products::update_many()
            .col_expr(
                ProdCol::StockQuantity,
                Expr::col(ProdCol::StockQuantity).sub(*quantity),
            )
            .filter(ProdCol::Id.eq(*product_id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(CartCol::StoreId.eq(store.id))
        .filter(CartCol::SessionId.eq(session.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(store.id),
        None,
        "checkout",
        Some("orders"),
        Some(serde_json::json!({
            "session_id": session.id,
            "order_id": order.id,
            "order_number": order.order_number,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithLines {
            order: Order::from(order),
            lines,
        },
        Some(Meta::empty()),
    ))
}

/// Order confirmation view, scoped to the active store.
pub async fn get_order(
    state: &AppState,
    store: &Store,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let order = Orders::find()
        .filter(OrderCol::StoreId.eq(store.id))
        .filter(OrderCol::Id.eq(id))
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let lines = OrderLines::find()
        .filter(OrderLineCol::OrderId.eq(order.id))
        .order_by_asc(OrderLineCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderLine::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithLines {
            order: Order::from(order),
            lines,
        },
        Some(Meta::empty()),
    ))
}
