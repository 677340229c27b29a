use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
    entity::{
        categories::{ActiveModel as CategoryActive, Column, Entity as Categories},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Store},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_categories(
    state: &AppState,
    store: &Store,
) -> AppResult<ApiResponse<CategoryList>> {
    let items = Categories::find()
        .filter(Column::StoreId.eq(store.id))
        .filter(Column::IsActive.eq(true))
        .order_by_asc(Column::SortOrder)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::empty()),
    ))
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
    let taken = Categories::find()
        .filter(condition)
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict(format!(
            "category slug already in use: {slug}"
        )));
    }
    Ok(())
}

pub async fn create_category(
    state: &AppState,
    store: &Store,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    ensure_slug_free(state, store.id, &payload.slug, None).await?;

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        store_id: Set(store.id),
        name: Set(payload.name),
        slug: Set(payload.slug),
        description: Set(payload.description),
        sort_order: Set(payload.sort_order),
        is_active: Set(payload.is_active),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(store.id),
        Some(user.user_id),
        "category_create",
        Some("product_categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Category created",
        Category::from(category),
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    store: &Store,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let existing = Categories::find_by_id(id)
        .filter(Column::StoreId.eq(store.id))
        .one(&state.orm)
        .await?;
    let existing = match existing {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    if let Some(slug) = payload.slug.as_ref() {
        ensure_slug_free(state, store.id, slug, Some(id)).await?;
    }

    let mut active: CategoryActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(slug) = payload.slug {
        active.slug = Set(slug);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(sort_order) = payload.sort_order {
        active.sort_order = Set(sort_order);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(chrono::Utc::now().into());

    let category = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(store.id),
        Some(user.user_id),
        "category_update",
        Some("product_categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        Category::from(category),
        Some(Meta::empty()),
    ))
}

/// Refused while products still belong to the category.
pub async fn delete_category(
    state: &AppState,
    store: &Store,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let in_use = Products::find()
        .filter(ProdCol::CategoryId.eq(id))
        .count(&state.orm)
        .await?;
    if in_use > 0 {
        return Err(AppError::Conflict("category still has products".into()));
    }

    let result = Categories::delete_many()
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
        "category_delete",
        Some("product_categories"),
        Some(serde_json::json!({ "category_id": id })),
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
