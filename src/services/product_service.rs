use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        order_items::{Column as OrderLineCol, Entity as OrderLines},
        products::{ActiveModel as ProductActive, Column, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, Store},
    paging,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    state::AppState,
};

/// Browse the store's active products. Filtering happens in the database,
/// pagination over the filtered set in memory; storefront catalogs are a
/// few hundred rows at most.
pub async fn list_products(
    state: &AppState,
    store: &Store,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, per_page) = query.pagination.resolve(12);

    let mut condition = Condition::all()
        .add(Column::StoreId.eq(store.id))
        .add(Column::IsActive.eq(true));

    if let Some(slug) = query.category.as_ref().filter(|s| !s.is_empty()) {
        let category = Categories::find()
            .filter(CategoryCol::StoreId.eq(store.id))
            .filter(CategoryCol::Slug.eq(slug.clone()))
            .filter(CategoryCol::IsActive.eq(true))
            .one(&state.orm)
            .await?;
        let category = match category {
            Some(c) => c,
            None => return Err(AppError::NotFound),
        };
        condition = condition.add(Column::CategoryId.eq(category.id));
    }

    if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(Expr::col(Column::Name).ilike(pattern));
    }

    if let Some(featured) = query.featured {
        condition = condition.add(Column::IsFeatured.eq(featured));
    }

    let products: Vec<Product> = Products::find()
        .filter(condition)
        .order_by_asc(Column::SortOrder)
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let page = paging::paginate(products, page, per_page);
    let meta = Meta::from_page(&page);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items: page.items },
        Some(meta),
    ))
}

pub async fn get_product_by_slug(
    state: &AppState,
    store: &Store,
    slug: &str,
) -> AppResult<ApiResponse<Product>> {
    let product = Products::find()
        .filter(Column::StoreId.eq(store.id))
        .filter(Column::Slug.eq(slug))
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?;
    match product {
        Some(p) => Ok(ApiResponse::success("Product", Product::from(p), None)),
        None => Err(AppError::NotFound),
    }
}

async fn ensure_slug_free(
    state: &AppState,
    store_id: Uuid,
    slug: &str,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let mut condition = Condition::all()
        .add(Column::StoreId.eq(store_id))
        .add(Column::Slug.eq(slug));
    if let Some(id) = exclude {
        condition = condition.add(Column::Id.ne(id));
    }
    let taken = Products::find()
        .filter(condition)
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict(format!(
            "product slug already in use: {slug}"
        )));
    }
    Ok(())
}

pub async fn create_product(
    state: &AppState,
    store: &Store,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.price < 0 {
        return Err(AppError::Validation("price must not be negative".into()));
    }
    ensure_slug_free(state, store.id, &payload.slug, None).await?;

    let category = Categories::find_by_id(payload.category_id)
        .filter(CategoryCol::StoreId.eq(store.id))
        .one(&state.orm)
        .await?;
    if category.is_none() {
        return Err(AppError::Validation("unknown category".into()));
    }

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        store_id: Set(store.id),
        category_id: Set(payload.category_id),
        name: Set(payload.name),
        slug: Set(payload.slug),
        description: Set(payload.description),
        price: Set(payload.price),
        sale_price: Set(payload.sale_price),
        stock_quantity: Set(payload.stock_quantity),
        manage_stock: Set(payload.manage_stock),
        is_active: Set(payload.is_active),
        is_featured: Set(payload.is_featured),
        sort_order: Set(payload.sort_order),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(store.id),
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    store: &Store,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .filter(Column::StoreId.eq(store.id))
        .one(&state.orm)
        .await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if let Some(slug) = payload.slug.as_ref() {
        ensure_slug_free(state, store.id, slug, Some(id)).await?;
    }

    let mut active: ProductActive = existing.into();
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(slug) = payload.slug {
        active.slug = Set(slug);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::Validation("price must not be negative".into()));
        }
        active.price = Set(price);
    }
    if let Some(sale_price) = payload.sale_price {
        active.sale_price = Set(Some(sale_price));
    }
    if let Some(stock_quantity) = payload.stock_quantity {
        if stock_quantity < 0 {
            return Err(AppError::Validation("stock must not be negative".into()));
        }
        active.stock_quantity = Set(stock_quantity);
    }
    if let Some(manage_stock) = payload.manage_stock {
        active.manage_stock = Set(manage_stock);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    if let Some(sort_order) = payload.sort_order {
        active.sort_order = Set(sort_order);
    }
    active.updated_at = Set(chrono::Utc::now().into());

    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(store.id),
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

/// Deleting is refused while order lines still reference the product; the
/// usual move is to deactivate instead.
pub async fn delete_product(
    state: &AppState,
    store: &Store,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let referenced = OrderLines::find()
        .filter(OrderLineCol::ProductId.eq(id))
        .count(&state.orm)
        .await?;
    if referenced > 0 {
        return Err(AppError::Conflict(
            "product appears in existing orders".into(),
        ));
    }

    let result = Products::delete_many()
        .filter(Column::StoreId.eq(store.id))
        .filter(Column::Id.eq(id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(store.id),
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
