use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    checkout::{self, OrderStatus, PaymentStatus},
    dto::orders::{
        DashboardStats, OrderList, OrderWithLines, UpdateOrderStatusRequest,
        UpdatePaymentStatusRequest,
    },
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, Store},
    paging,
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub async fn dashboard(
    state: &AppState,
    store: &Store,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;

    let total_products = Products::find()
        .filter(ProdCol::StoreId.eq(store.id))
        .count(&state.orm)
        .await? as i64;
    let total_orders = Orders::find()
        .filter(OrderCol::StoreId.eq(store.id))
        .count(&state.orm)
        .await? as i64;
    let pending_orders = Orders::find()
        .filter(OrderCol::StoreId.eq(store.id))
        .filter(OrderCol::Status.eq(OrderStatus::Pending.as_str()))
        .count(&state.orm)
        .await? as i64;

    // SUM(bigint) is numeric in Postgres, hence the cast.
    let paid_revenue: (i64,) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(total_amount), 0)::BIGINT
        FROM orders
        WHERE store_id = $1 AND payment_status = 'paid'
        "#,
    )
    .bind(store.id)
    .fetch_one(&state.pool)
    .await?;

    let recent_orders = Orders::find()
        .filter(OrderCol::StoreId.eq(store.id))
        .order_by_desc(OrderCol::CreatedAt)
        .limit(5)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "Dashboard",
        DashboardStats {
            total_products,
            total_orders,
            pending_orders,
            paid_revenue: paid_revenue.0,
            recent_orders,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    store: &Store,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, per_page) = query.pagination.resolve(20);

    let mut condition = Condition::all().add(OrderCol::StoreId.eq(store.id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let orders: Vec<Order> = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let page = paging::paginate(orders, page, per_page);
    let meta = Meta::from_page(&page);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: page.items },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    store: &Store,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithLines>> {
    ensure_admin(user)?;
    order_service::get_order(state, store, id).await
}

pub async fn update_order_status(
    state: &AppState,
    store: &Store,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let status = OrderStatus::parse(&payload.status)?;

    let existing = Orders::find()
        .filter(OrderCol::StoreId.eq(store.id))
        .filter(OrderCol::Id.eq(id))
        .one(&state.orm)
        .await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    let previous_notes = existing.admin_notes.clone();

    let now = Utc::now();
    let stamps = checkout::transition_stamps(status, now);

    let mut active: OrderActive = existing.into();
    active.status = Set(status.as_str().to_string());
    if let Some(t) = stamps.confirmed_at {
        active.confirmed_at = Set(Some(t.into()));
    }
    if let Some(t) = stamps.shipped_at {
        active.shipped_at = Set(Some(t.into()));
    }
    if let Some(t) = stamps.delivered_at {
        active.delivered_at = Set(Some(t.into()));
    }
    if let Some(note) = payload
        .admin_note
        .as_deref()
        .filter(|note| !note.trim().is_empty())
    {
        active.admin_notes = Set(Some(checkout::append_admin_note(
            previous_notes.as_deref(),
            note,
        )));
    }
    active.updated_at = Set(now.into());

    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(store.id),
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

pub async fn update_payment_status(
    state: &AppState,
    store: &Store,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePaymentStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let payment_status = PaymentStatus::parse(&payload.payment_status)?;

    let existing = Orders::find()
        .filter(OrderCol::StoreId.eq(store.id))
        .filter(OrderCol::Id.eq(id))
        .one(&state.orm)
        .await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    active.payment_status = Set(payment_status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());

    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(store.id),
        Some(user.user_id),
        "order_payment_update",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "payment_status": order.payment_status,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}
