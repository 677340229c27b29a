use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use storefront_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    ensure_admin(&pool, "admin@example.com", "admin123").await?;
    let store_id = ensure_store(&pool, "Demo Store", "demo").await?;
    let category_id = ensure_category(&pool, store_id, "Merch", "merch").await?;
    seed_products(&pool, store_id, category_id).await?;

    println!("Seed completed. Store ID: {store_id}");
    Ok(())
}

async fn ensure_admin(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, 'admin')
        ON CONFLICT (email) DO UPDATE SET role = 'admin'
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured admin {email}");
    Ok(row.0)
}

async fn ensure_store(pool: &sqlx::PgPool, name: &str, slug: &str) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO stores (id, name, slug, description)
        VALUES ($1, $2, $3, 'Seeded demo storefront')
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .fetch_one(pool)
    .await?;

    println!("Ensured store {slug}");
    Ok(row.0)
}

async fn ensure_category(
    pool: &sqlx::PgPool,
    store_id: Uuid,
    name: &str,
    slug: &str,
) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO product_categories (id, store_id, name, slug)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (store_id, slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(store_id)
    .bind(name)
    .bind(slug)
    .fetch_one(pool)
    .await?;

    println!("Ensured category {slug}");
    Ok(row.0)
}

async fn seed_products(
    pool: &sqlx::PgPool,
    store_id: Uuid,
    category_id: Uuid,
) -> anyhow::Result<()> {
    let products: Vec<(&str, &str, i64, Option<i64>, i32, bool)> = vec![
        ("Axum Hoodie", "axum-hoodie", 550000, None, 50, true),
        ("Ferris Mug", "ferris-mug", 120000, Some(99000), 100, true),
        ("Rust Sticker Pack", "rust-sticker-pack", 50000, None, 200, true),
        ("E-book: Async Rust", "ebook-async-rust", 250000, None, 0, false),
    ];

    for (name, slug, price, sale_price, stock, manage_stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, store_id, category_id, name, slug, price, sale_price, stock_quantity, manage_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (store_id, slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(store_id)
        .bind(category_id)
        .bind(name)
        .bind(slug)
        .bind(price)
        .bind(sale_price)
        .bind(stock)
        .bind(manage_stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
